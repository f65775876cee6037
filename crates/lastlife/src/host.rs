//! # Host Seams
//!
//! The engine never touches the server directly. Everything it needs from
//! the outside world goes through these traits:
//!
//! - [`PlayerHost`]: live players, addressed by [`ConnectionId`]
//! - [`AccessControl`]: the ban list, addressed by display name
//! - [`ReviveGuard`]: optional veto/adjustment of a revive before it runs
//!
//! Methods taking a `ConnectionId` report a stale handle (the player left)
//! by returning `false` or `None`.

use std::sync::Arc;

use lastlife_inventory::Inventory;
use lastlife_shared::{ConnectionId, GameMode, Location, PlayerId};
use lastlife_world::ColumnQuery;

use crate::record::ReviveOptions;

/// The server's live players and worlds.
pub trait PlayerHost: Send + Sync {
    /// Returns true if the server runs in hardcore mode.
    fn is_hardcore(&self) -> bool;

    /// Current display name.
    fn player_name(&self, conn: ConnectionId) -> Option<String>;

    /// Returns true if the player is exempt from death bans.
    fn is_exempt(&self, conn: ConnectionId) -> bool;

    /// Returns true while the player's avatar is dead (death screen shown).
    fn is_awaiting_respawn(&self, conn: ConnectionId) -> bool;

    /// Copy of the live inventory.
    fn inventory(&self, conn: ConnectionId) -> Option<Inventory>;

    /// Replaces the live inventory.
    fn set_inventory(&self, conn: ConnectionId, inventory: Inventory) -> bool;

    /// Changes the game mode.
    fn set_game_mode(&self, conn: ConnectionId, mode: GameMode) -> bool;

    /// Current location.
    fn location(&self, conn: ConnectionId) -> Option<Location>;

    /// Moves the player. Returns false if the host refused or the player
    /// left.
    fn teleport(&self, conn: ConnectionId, target: &Location) -> bool;

    /// Turns the post-revive protection (invulnerable, invisible) on or
    /// off.
    fn set_ghost(&self, conn: ConnectionId, active: bool);

    /// Block access to a loaded world.
    fn world(&self, name: &str) -> Option<Arc<dyn ColumnQuery>>;
}

/// The server's ban list.
pub trait AccessControl: Send + Sync {
    /// Bans a player with a reason.
    fn ban(&self, name: &str, reason: &str);

    /// Bans a player through a named message layout.
    fn ban_with_layout(&self, name: &str, layout: &str);

    /// Returns true if the named layout exists.
    fn has_layout(&self, _layout: &str) -> bool {
        false
    }

    /// Lifts a ban.
    fn pardon(&self, name: &str);

    /// Returns true if the player is banned.
    fn is_banned(&self, name: &str) -> bool;
}

/// Reviews a revive just before it runs.
pub trait ReviveGuard: Send + Sync {
    /// Returns the options to revive with, or `None` to veto the revive.
    fn review(&self, player: PlayerId, planned: ReviveOptions) -> Option<ReviveOptions>;
}
