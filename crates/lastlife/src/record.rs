//! # Player Records
//!
//! One [`PlayerRecord`] per identity ever seen. The record is the single
//! source of truth for a player's lifecycle flags; the registry owns it and
//! hands out locked access.
//!
//! ## Persistence
//!
//! Each durable field lives under its own key in the player's store (see
//! [`keys`]). Status fields are written on disconnect and shutdown; the
//! saved inventory and death location are written the moment they change.
//! A field that cannot be read loads as its default.

use lastlife_shared::{ByteReader, ByteWriter, CodecResult, ConnectionId, Location, PlayerId};

use crate::error::StoreResult;
use crate::ghost::GhostState;
use crate::store::PlayerStore;

/// Store keys for the persisted fields.
pub mod keys {
    /// `is_dead` flag, one byte.
    pub const IS_DEAD: &str = "is_dead";
    /// `is_to_revive` flag, one byte.
    pub const IS_TO_REVIVE: &str = "is_to_revive";
    /// Display name, UTF-8.
    pub const LAST_KNOWN_NAME: &str = "last_known_name";
    /// Inventory snapshot blob.
    pub const SAVED_INVENTORY: &str = "saved_inventory";
    /// Encoded [`lastlife_shared::Location`].
    pub const LAST_DEATH_LOCATION: &str = "last_death_location";
    /// Two flag bytes: restore inventory, teleport.
    pub const REVIVE_OPTIONS: &str = "revive_options";
    /// Encoded revive history.
    pub const REVIVES: &str = "revives";
    /// Remaining ghost ticks, `u32`.
    pub const GHOST_TICKS: &str = "ghost_ticks";
    /// Pending undo flag, one byte.
    pub const UNDO_PENDING: &str = "undo_pending";
}

/// Lifecycle state derived from the two flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    /// Playing normally.
    Alive,
    /// Died and banned; waiting for an administrator.
    Dead,
    /// An administrator requested a revive; it runs on the next respawn.
    ReviveRequested,
}

/// What a revive should do besides returning the player to survival.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReviveOptions {
    /// Give back the inventory captured at death.
    pub restore_inventory: bool,
    /// Teleport to a safe spot near the death location.
    pub teleport_to_death_location: bool,
}

impl Default for ReviveOptions {
    fn default() -> Self {
        Self {
            restore_inventory: true,
            teleport_to_death_location: true,
        }
    }
}

impl ReviveOptions {
    fn encode(self) -> [u8; 2] {
        [
            u8::from(self.restore_inventory),
            u8::from(self.teleport_to_death_location),
        ]
    }

    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut reader = ByteReader::new(bytes);
        Ok(Self {
            restore_inventory: reader.get_bool()?,
            teleport_to_death_location: reader.get_bool()?,
        })
    }
}

/// Outcome of one revive.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviveResult {
    /// The revive completed and the player is alive again.
    pub successful: bool,
    /// The player was teleported to a safe location.
    pub teleported: bool,
    /// The saved inventory was applied (even if it was empty).
    pub inventory_restored: bool,
    /// Where the player stood before the teleport.
    pub teleported_from: Option<Location>,
}

impl ReviveResult {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.put_bool(self.successful);
        writer.put_bool(self.teleported);
        writer.put_bool(self.inventory_restored);
        match &self.teleported_from {
            Some(location) => {
                writer.put_bool(true);
                location.encode(writer);
            }
            None => writer.put_bool(false),
        }
    }

    fn decode(reader: &mut ByteReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            successful: reader.get_bool()?,
            teleported: reader.get_bool()?,
            inventory_restored: reader.get_bool()?,
            teleported_from: if reader.get_bool()? {
                Some(Location::decode(reader)?)
            } else {
                None
            },
        })
    }
}

/// Lifecycle state of one identity.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerRecord {
    /// Stable identity.
    pub id: PlayerId,
    /// True from a punitive death until a completed revive.
    pub is_dead: bool,
    /// True once a revive was requested; implies `is_dead`.
    pub is_to_revive: bool,
    /// Display name, used for name-keyed ban operations.
    pub last_known_name: String,
    /// Host connection while online.
    pub online: Option<ConnectionId>,
    /// Inventory captured at the latest death, until revived.
    pub saved_inventory: Option<Vec<u8>>,
    /// Where the latest death happened.
    pub last_death_location: Option<Location>,
    /// Options for the pending (or next) revive.
    pub revive_options: ReviveOptions,
    /// Every revive outcome, oldest first.
    pub revives: Vec<ReviveResult>,
    /// Post-teleport protection countdown.
    pub ghost: GhostState,
    /// An undo was requested while the player was offline.
    pub undo_pending: bool,
}

impl PlayerRecord {
    /// A fresh record for a never-seen identity.
    #[must_use]
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            is_dead: false,
            is_to_revive: false,
            last_known_name: String::new(),
            online: None,
            saved_inventory: None,
            last_death_location: None,
            revive_options: ReviveOptions::default(),
            revives: Vec::new(),
            ghost: GhostState::NONE,
            undo_pending: false,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PlayerState {
        match (self.is_dead, self.is_to_revive) {
            (true, true) => PlayerState::ReviveRequested,
            (true, false) => PlayerState::Dead,
            (false, _) => PlayerState::Alive,
        }
    }

    /// Returns true while `is_to_revive` implies `is_dead`.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        !self.is_to_revive || self.is_dead
    }

    /// Returns true for a dead player no revive has been requested for.
    #[must_use]
    pub const fn is_revivable(&self) -> bool {
        self.is_dead && !self.is_to_revive
    }

    /// Name for messages: the display name, or the id if none is known.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.last_known_name.is_empty() {
            self.id.to_string()
        } else {
            self.last_known_name.clone()
        }
    }

    /// Most recent successful revive.
    #[must_use]
    pub fn last_successful_revive(&self) -> Option<&ReviveResult> {
        self.revives.iter().rev().find(|r| r.successful)
    }

    /// Removes the most recent successful revive from the history.
    pub fn pop_last_successful_revive(&mut self) -> Option<ReviveResult> {
        let index = self.revives.iter().rposition(|r| r.successful)?;
        Some(self.revives.remove(index))
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Materializes a record from the store. Unreadable fields load as
    /// defaults and are logged.
    #[must_use]
    pub fn load(id: PlayerId, store: &dyn PlayerStore) -> Self {
        let mut record = Self::new(id);

        let read = |key: &str| match store.get(id, key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(player = %id, key, error = %e, "failed to read player field, using default");
                None
            }
        };
        let decode_flag = |key: &str| {
            read(key).and_then(|bytes| match ByteReader::new(&bytes).get_bool() {
                Ok(flag) => Some(flag),
                Err(e) => {
                    tracing::warn!(player = %id, key, error = %e, "corrupt player flag, using default");
                    None
                }
            })
        };

        record.is_dead = decode_flag(keys::IS_DEAD).unwrap_or(false);
        record.is_to_revive = decode_flag(keys::IS_TO_REVIVE).unwrap_or(false);
        record.undo_pending = decode_flag(keys::UNDO_PENDING).unwrap_or(false);
        if !record.is_consistent() {
            tracing::warn!(player = %id, "stored revive flag without death flag, clearing it");
            record.is_to_revive = false;
        }

        if let Some(bytes) = read(keys::LAST_KNOWN_NAME) {
            match String::from_utf8(bytes) {
                Ok(name) => record.last_known_name = name,
                Err(_) => tracing::warn!(player = %id, "stored name is not UTF-8, ignoring"),
            }
        }

        record.saved_inventory = read(keys::SAVED_INVENTORY);

        if let Some(bytes) = read(keys::LAST_DEATH_LOCATION) {
            match Location::from_bytes(&bytes) {
                Ok(location) => record.last_death_location = Some(location),
                Err(e) => tracing::warn!(player = %id, error = %e, "corrupt death location, ignoring"),
            }
        }

        if let Some(bytes) = read(keys::REVIVE_OPTIONS) {
            match ReviveOptions::decode(&bytes) {
                Ok(options) => record.revive_options = options,
                Err(e) => tracing::warn!(player = %id, error = %e, "corrupt revive options, using defaults"),
            }
        }

        if let Some(bytes) = read(keys::REVIVES) {
            match decode_revives(&bytes) {
                Ok(revives) => record.revives = revives,
                Err(e) => tracing::warn!(player = %id, error = %e, "corrupt revive history, starting empty"),
            }
        }

        if let Some(bytes) = read(keys::GHOST_TICKS) {
            match ByteReader::new(&bytes).get_u32() {
                Ok(ticks) => record.ghost = GhostState::with_remaining(ticks),
                Err(e) => tracing::warn!(player = %id, error = %e, "corrupt ghost ticks, ignoring"),
            }
        }

        record
    }

    // =========================================================================
    // Persisting
    // =========================================================================

    /// Writes the status fields: flags, name, options, history, ghost.
    ///
    /// # Errors
    ///
    /// Returns the first store error; later fields are not written.
    pub fn persist_status(&self, store: &dyn PlayerStore) -> StoreResult<()> {
        store.set(self.id, keys::IS_DEAD, &[u8::from(self.is_dead)])?;
        store.set(self.id, keys::IS_TO_REVIVE, &[u8::from(self.is_to_revive)])?;
        store.set(self.id, keys::UNDO_PENDING, &[u8::from(self.undo_pending)])?;
        if !self.last_known_name.is_empty() {
            store.set(self.id, keys::LAST_KNOWN_NAME, self.last_known_name.as_bytes())?;
        }
        store.set(self.id, keys::REVIVE_OPTIONS, &self.revive_options.encode())?;
        store.set(self.id, keys::REVIVES, &encode_revives(&self.revives))?;
        store.set(self.id, keys::GHOST_TICKS, &self.ghost.remaining_ticks().to_le_bytes())?;
        Ok(())
    }

    /// Writes (or deletes) the saved inventory.
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub fn persist_inventory(&self, store: &dyn PlayerStore) -> StoreResult<()> {
        match &self.saved_inventory {
            Some(blob) => store.set(self.id, keys::SAVED_INVENTORY, blob),
            None => store.remove(self.id, keys::SAVED_INVENTORY),
        }
    }

    /// Writes (or deletes) the death location.
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub fn persist_death_location(&self, store: &dyn PlayerStore) -> StoreResult<()> {
        match &self.last_death_location {
            Some(location) => store.set(self.id, keys::LAST_DEATH_LOCATION, &location.to_bytes()),
            None => store.remove(self.id, keys::LAST_DEATH_LOCATION),
        }
    }

    /// Writes every persisted field.
    ///
    /// # Errors
    ///
    /// Returns the first store error.
    pub fn persist_all(&self, store: &dyn PlayerStore) -> StoreResult<()> {
        self.persist_status(store)?;
        self.persist_inventory(store)?;
        self.persist_death_location(store)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn encode_revives(revives: &[ReviveResult]) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.put_u32(revives.len() as u32);
    for revive in revives {
        revive.encode(&mut writer);
    }
    writer.into_inner()
}

fn decode_revives(bytes: &[u8]) -> CodecResult<Vec<ReviveResult>> {
    let mut reader = ByteReader::new(bytes);
    let count = reader.get_u32()?;
    // Each entry is at least four bytes; don't trust the count for capacity.
    let mut revives = Vec::with_capacity((count as usize).min(reader.remaining() / 4));
    for _ in 0..count {
        revives.push(ReviveResult::decode(&mut reader)?);
    }
    Ok(revives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn dead_record() -> PlayerRecord {
        let mut record = PlayerRecord::new(PlayerId::random());
        record.is_dead = true;
        record.last_known_name = "Alex".to_owned();
        record.saved_inventory = Some(vec![1, 2, 3]);
        record.last_death_location = Some(Location::new("world", 10.5, 64.0, -3.5));
        record.revive_options.teleport_to_death_location = false;
        record.revives.push(ReviveResult {
            successful: true,
            teleported: true,
            inventory_restored: false,
            teleported_from: Some(Location::new("world", 0.0, 70.0, 0.0)),
        });
        record.ghost = GhostState::with_remaining(120);
        record
    }

    #[test]
    fn test_states() {
        let mut record = PlayerRecord::new(PlayerId::random());
        assert_eq!(record.state(), PlayerState::Alive);
        record.is_dead = true;
        assert_eq!(record.state(), PlayerState::Dead);
        assert!(record.is_revivable());
        record.is_to_revive = true;
        assert_eq!(record.state(), PlayerState::ReviveRequested);
        assert!(record.is_consistent());
        assert!(!record.is_revivable());
    }

    #[test]
    fn test_persist_load_all_fields() {
        let store = MemoryStore::new();
        let record = dead_record();
        record.persist_all(&store).unwrap();

        let loaded = PlayerRecord::load(record.id, &store);
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_load_unknown_is_default() {
        let store = MemoryStore::new();
        let id = PlayerId::random();
        assert_eq!(PlayerRecord::load(id, &store), PlayerRecord::new(id));
    }

    #[test]
    fn test_corrupt_fields_degrade() {
        let store = MemoryStore::new();
        let id = PlayerId::random();
        store.set(id, keys::IS_DEAD, &[7]).unwrap();
        store.set(id, keys::LAST_DEATH_LOCATION, &[1, 2]).unwrap();
        store.set(id, keys::REVIVES, &[9, 0, 0, 0, 1]).unwrap();
        store.set(id, keys::LAST_KNOWN_NAME, b"Steve").unwrap();

        let loaded = PlayerRecord::load(id, &store);
        assert!(!loaded.is_dead);
        assert_eq!(loaded.last_death_location, None);
        assert!(loaded.revives.is_empty());
        assert_eq!(loaded.last_known_name, "Steve");
    }

    #[test]
    fn test_inconsistent_flags_repaired_on_load() {
        let store = MemoryStore::new();
        let id = PlayerId::random();
        store.set(id, keys::IS_TO_REVIVE, &[1]).unwrap();
        let loaded = PlayerRecord::load(id, &store);
        assert!(loaded.is_consistent());
        assert_eq!(loaded.state(), PlayerState::Alive);
    }

    #[test]
    fn test_persist_inventory_none_removes() {
        let store = MemoryStore::new();
        let mut record = dead_record();
        record.persist_inventory(&store).unwrap();
        record.saved_inventory = None;
        record.persist_inventory(&store).unwrap();
        assert_eq!(store.get(record.id, keys::SAVED_INVENTORY).unwrap(), None);
    }

    #[test]
    fn test_pop_last_successful_revive() {
        let mut record = dead_record();
        record.revives.push(ReviveResult {
            successful: false,
            teleported: false,
            inventory_restored: false,
            teleported_from: None,
        });
        let popped = record.pop_last_successful_revive().unwrap();
        assert!(popped.successful);
        assert_eq!(record.revives.len(), 1);
        assert!(record.last_successful_revive().is_none());
        assert!(record.pop_last_successful_revive().is_none());
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let record = PlayerRecord::new(PlayerId::random());
        assert_eq!(record.display_name(), record.id.to_string());
    }
}
