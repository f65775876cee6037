//! # Localized Strings
//!
//! Text the engine hands to players and operators: the ban reason, the
//! login denial and the warnings logged when a revive step is skipped.
//! Lookup goes through [`Localizer`] so the host can plug in its own
//! translations; [`DefaultStrings`] is the built-in English table.
//!
//! Templates may contain `%player_name%`.

use std::collections::HashMap;

/// Placeholder replaced with the player's name.
pub const PLAYER_NAME_PLACEHOLDER: &str = "%player_name%";

/// Every message the engine can emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StringKey {
    /// Ban reason for a punitive death.
    DeathBanReason,
    /// Shown to a dead player trying to log in.
    LoginDenied,
    /// A revive step needed the player online.
    ReviveNotOnline,
    /// A revive wanted to teleport but no death location is known.
    ReviveNoLastDeath,
    /// A revive found no saved inventory.
    ReviveNoInventory,
    /// No safe teleport target was found.
    ReviveUnsafeTeleport,
    /// An undo was requested for an offline player.
    UndoNotOnline,
    /// An undo completed.
    UndoSuccess,
}

impl StringKey {
    /// Every key.
    pub const ALL: [Self; 8] = [
        Self::DeathBanReason,
        Self::LoginDenied,
        Self::ReviveNotOnline,
        Self::ReviveNoLastDeath,
        Self::ReviveNoInventory,
        Self::ReviveUnsafeTeleport,
        Self::UndoNotOnline,
        Self::UndoSuccess,
    ];

    /// Dotted key used by translation files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeathBanReason => "player.ban.death",
            Self::LoginDenied => "player.login.denied",
            Self::ReviveNotOnline => "player.revive.notOnline",
            Self::ReviveNoLastDeath => "player.revive.noLastDeath",
            Self::ReviveNoInventory => "player.revive.noReviveInventory",
            Self::ReviveUnsafeTeleport => "player.revive.unsafeTeleport",
            Self::UndoNotOnline => "player.revive.undo.notOnline",
            Self::UndoSuccess => "player.revive.undo.success",
        }
    }

    /// Built-in English text.
    #[must_use]
    pub const fn english(self) -> &'static str {
        match self {
            Self::DeathBanReason => "You died! Game over. Wait for an admin to revive you.",
            Self::LoginDenied => "You died in hardcore mode and have not been revived yet.",
            Self::ReviveNotOnline => "%player_name% is not online; the revive will run on their next join.",
            Self::ReviveNoLastDeath => "%player_name% has no recorded death location; not teleporting.",
            Self::ReviveNoInventory => "%player_name% has no saved inventory; it will be empty.",
            Self::ReviveUnsafeTeleport => "No safe location near the death of %player_name%; not teleporting.",
            Self::UndoNotOnline => "%player_name% is not online; the revive will be undone on their next join.",
            Self::UndoSuccess => "The last revive of %player_name% was undone.",
        }
    }
}

/// Looks up message templates.
pub trait Localizer: Send + Sync {
    /// Returns the template for `key`.
    fn lookup(&self, key: StringKey) -> String;

    /// Returns the template with the player name filled in.
    fn render(&self, key: StringKey, player_name: &str) -> String {
        self.lookup(key).replace(PLAYER_NAME_PLACEHOLDER, player_name)
    }
}

/// English strings with optional per-key overrides.
#[derive(Clone, Debug, Default)]
pub struct DefaultStrings {
    overrides: HashMap<StringKey, String>,
}

impl DefaultStrings {
    /// Creates the plain English table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces one template.
    #[must_use]
    pub fn with_override(mut self, key: StringKey, template: impl Into<String>) -> Self {
        self.overrides.insert(key, template.into());
        self
    }
}

impl Localizer for DefaultStrings {
    fn lookup(&self, key: StringKey) -> String {
        self.overrides
            .get(&key)
            .cloned()
            .unwrap_or_else(|| key.english().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_unique() {
        for (i, a) in StringKey::ALL.iter().enumerate() {
            for b in &StringKey::ALL[i + 1..] {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
    }

    #[test]
    fn test_render_fills_name() {
        let strings = DefaultStrings::new();
        let text = strings.render(StringKey::ReviveNotOnline, "Alex");
        assert!(text.starts_with("Alex is not online"));
        assert!(!text.contains(PLAYER_NAME_PLACEHOLDER));
    }

    #[test]
    fn test_override() {
        let strings = DefaultStrings::new().with_override(StringKey::DeathBanReason, "Du bist gestorben.");
        assert_eq!(strings.lookup(StringKey::DeathBanReason), "Du bist gestorben.");
        assert_eq!(strings.lookup(StringKey::LoginDenied), StringKey::LoginDenied.english());
    }
}
