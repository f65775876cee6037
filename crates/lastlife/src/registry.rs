//! # Player Record Registry
//!
//! Authoritative map of every identity ever seen. Records are created on
//! first observation (a join, or the startup scan of the store) and never
//! removed while the engine runs.
//!
//! ## Locking
//!
//! - `RwLock` over the id → record map
//! - one `Mutex` per record
//!
//! Lock order is always map, then record. Nothing takes the map lock while
//! holding a record lock.

use std::collections::HashMap;
use std::sync::Arc;

use lastlife_shared::{ConnectionId, PlayerId};
use parking_lot::{Mutex, RwLock};

use crate::host::AccessControl;
use crate::record::{PlayerRecord, ReviveOptions};
use crate::store::PlayerStore;

/// Shared, lockable record.
pub type RecordHandle = Arc<Mutex<PlayerRecord>>;

/// Every player record, backed by a durable store.
pub struct PlayerRegistry {
    records: RwLock<HashMap<PlayerId, RecordHandle>>,
    store: Arc<dyn PlayerStore>,
}

impl PlayerRegistry {
    /// Creates an empty registry over a store.
    #[must_use]
    pub fn new(store: Arc<dyn PlayerStore>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &dyn PlayerStore {
        self.store.as_ref()
    }

    /// Number of materialized records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if no record has been materialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// The record for `id`, if materialized.
    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<RecordHandle> {
        self.records.read().get(&id).cloned()
    }

    /// The record for `id`, loading it from the store on first reference.
    pub fn get_or_create(&self, id: PlayerId) -> RecordHandle {
        if let Some(handle) = self.get(id) {
            return handle;
        }
        let mut records = self.records.write();
        // Another thread may have won the race between the two locks.
        records
            .entry(id)
            .or_insert_with(|| {
                tracing::debug!(player = %id, "materializing player record");
                Arc::new(Mutex::new(PlayerRecord::load(id, self.store.as_ref())))
            })
            .clone()
    }

    /// Materializes every identity the store knows. Returns how many
    /// records exist afterwards.
    pub fn reconcile(&self) -> usize {
        match self.store.known_players() {
            Ok(ids) => {
                for id in ids {
                    self.get_or_create(id);
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to enumerate stored players"),
        }
        let count = self.len();
        tracing::info!(count, "player registry reconciled");
        count
    }

    /// Marks a player online.
    pub fn attach_online(&self, id: PlayerId, conn: ConnectionId, name: &str) -> RecordHandle {
        let handle = self.get_or_create(id);
        {
            let mut record = handle.lock();
            record.online = Some(conn);
            if !name.is_empty() {
                record.last_known_name = name.to_owned();
            }
        }
        handle
    }

    /// Persists the player's status and marks them offline.
    pub fn detach_online(&self, id: PlayerId) {
        let Some(handle) = self.get(id) else {
            tracing::warn!(player = %id, "disconnect for unknown player");
            return;
        };
        let mut record = handle.lock();
        if let Err(e) = record.persist_status(self.store.as_ref()) {
            tracing::error!(player = %id, error = %e, "failed to save player status on disconnect");
        }
        record.online = None;
    }

    /// Finds a record by display name (case-insensitive).
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<RecordHandle> {
        self.records
            .read()
            .values()
            .find(|handle| handle.lock().last_known_name.eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Handles of every online player.
    #[must_use]
    pub fn online(&self) -> Vec<(ConnectionId, RecordHandle)> {
        self.records
            .read()
            .values()
            .filter_map(|handle| handle.lock().online.map(|conn| (conn, handle.clone())))
            .collect()
    }

    /// Names of dead players with no revive requested, sorted.
    #[must_use]
    pub fn list_revivable(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .read()
            .values()
            .filter_map(|handle| {
                let record = handle.lock();
                record.is_revivable().then(|| record.display_name())
            })
            .collect();
        names.sort_unstable();
        names
    }

    /// Requests (`true`) or withdraws (`false`) a revive.
    ///
    /// - `true` on a dead record sets `is_to_revive` and pardons.
    /// - `true` on any other record is rejected without side effects.
    /// - `false` clears both flags, then bans with `ban_reason` unless the
    ///   player is already banned.
    ///
    /// Returns true if the record changed.
    pub fn set_revive_requested(
        &self,
        id: PlayerId,
        value: bool,
        options: ReviveOptions,
        access: &dyn AccessControl,
        ban_reason: &str,
    ) -> bool {
        let handle = self.get_or_create(id);
        let mut record = handle.lock();
        let name = record.display_name();

        if value {
            if !record.is_dead {
                tracing::debug!(player = %id, "revive requested for a living player, ignoring");
                return false;
            }
            record.is_to_revive = true;
            record.revive_options = options;
            self.persist(&record);
            access.pardon(&name);
            tracing::info!(player = %id, name = %name, "revive requested");
        } else {
            record.is_dead = false;
            record.is_to_revive = false;
            self.persist(&record);
            if record.last_known_name.is_empty() {
                tracing::warn!(player = %id, "revive withdrawn for a player with no known name, not banning");
            } else if !access.is_banned(&name) {
                access.ban(&name, ban_reason);
            }
            tracing::info!(player = %id, name = %name, "revive withdrawn");
        }
        debug_assert!(record.is_consistent());
        true
    }

    /// Persists every record. Returns how many failed.
    pub fn save_all(&self) -> usize {
        let handles: Vec<RecordHandle> = self.records.read().values().cloned().collect();
        let mut failures = 0;
        for handle in handles {
            let record = handle.lock();
            if let Err(e) = record.persist_all(self.store.as_ref()) {
                tracing::error!(player = %record.id, error = %e, "failed to save player record");
                failures += 1;
            }
        }
        tracing::info!(records = self.len(), failures, "player records saved");
        failures
    }

    /// Persists status fields, logging failures.
    pub(crate) fn persist(&self, record: &PlayerRecord) {
        if let Err(e) = record.persist_status(self.store.as_ref()) {
            tracing::error!(player = %record.id, error = %e, "failed to save player status");
        }
    }

    /// Persists the saved inventory, logging failures.
    pub(crate) fn persist_inventory(&self, record: &PlayerRecord) {
        if let Err(e) = record.persist_inventory(self.store.as_ref()) {
            tracing::error!(player = %record.id, error = %e, "failed to save player inventory");
        }
    }

    /// Persists the death location, logging failures.
    pub(crate) fn persist_death_location(&self, record: &PlayerRecord) {
        if let Err(e) = record.persist_death_location(self.store.as_ref()) {
            tracing::error!(player = %record.id, error = %e, "failed to save death location");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::keys;
    use crate::store::MemoryStore;

    /// Records ban-list calls.
    #[derive(Default)]
    struct BanList {
        banned: Mutex<Vec<(String, String)>>,
        pardoned: Mutex<Vec<String>>,
    }

    impl AccessControl for BanList {
        fn ban(&self, name: &str, reason: &str) {
            self.banned.lock().push((name.to_owned(), reason.to_owned()));
        }

        fn ban_with_layout(&self, name: &str, layout: &str) {
            self.ban(name, layout);
        }

        fn pardon(&self, name: &str) {
            self.banned.lock().retain(|(n, _)| n != name);
            self.pardoned.lock().push(name.to_owned());
        }

        fn is_banned(&self, name: &str) -> bool {
            self.banned.lock().iter().any(|(n, _)| n == name)
        }
    }

    fn registry() -> (PlayerRegistry, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (PlayerRegistry::new(store.clone()), store)
    }

    fn dead(registry: &PlayerRegistry, name: &str) -> PlayerId {
        let id = PlayerId::random();
        let handle = registry.attach_online(id, ConnectionId(0), name);
        handle.lock().is_dead = true;
        id
    }

    #[test]
    fn test_get_or_create_single_record() {
        let (registry, _) = registry();
        let id = PlayerId::random();
        let a = registry.get_or_create(id);
        let b = registry.get_or_create(id);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reconcile_loads_stored_players() {
        let (registry, store) = registry();
        let id = PlayerId::random();
        store.set(id, keys::IS_DEAD, &[1]).unwrap();
        store.set(id, keys::LAST_KNOWN_NAME, b"Herobrine").unwrap();

        assert_eq!(registry.reconcile(), 1);
        assert_eq!(registry.list_revivable(), vec!["Herobrine".to_owned()]);
    }

    #[test]
    fn test_detach_persists_flags() {
        let (registry, store) = registry();
        let id = dead(&registry, "Alex");
        registry.detach_online(id);

        assert_eq!(store.get(id, keys::IS_DEAD).unwrap(), Some(vec![1]));
        assert_eq!(store.get(id, keys::IS_TO_REVIVE).unwrap(), Some(vec![0]));
        assert_eq!(registry.get(id).unwrap().lock().online, None);
    }

    #[test]
    fn test_revive_requested_on_dead() {
        let (registry, _) = registry();
        let bans = BanList::default();
        let id = dead(&registry, "Alex");
        bans.ban("Alex", "died");

        assert!(registry.set_revive_requested(id, true, ReviveOptions::default(), &bans, "died"));
        let handle = registry.get(id).unwrap();
        assert!(handle.lock().is_to_revive);
        assert!(!bans.is_banned("Alex"));
        assert_eq!(*bans.pardoned.lock(), vec!["Alex".to_owned()]);
        assert!(registry.list_revivable().is_empty());
    }

    #[test]
    fn test_revive_requested_on_living_rejected() {
        let (registry, _) = registry();
        let bans = BanList::default();
        let id = PlayerId::random();
        registry.attach_online(id, ConnectionId(1), "Steve");

        assert!(!registry.set_revive_requested(id, true, ReviveOptions::default(), &bans, "died"));
        assert!(bans.pardoned.lock().is_empty());
        assert!(!registry.get(id).unwrap().lock().is_to_revive);
    }

    #[test]
    fn test_withdraw_clears_and_bans() {
        let (registry, _) = registry();
        let bans = BanList::default();
        let id = dead(&registry, "Alex");
        registry.set_revive_requested(id, true, ReviveOptions::default(), &bans, "died");

        assert!(registry.set_revive_requested(id, false, ReviveOptions::default(), &bans, "died"));
        let record = registry.get(id).unwrap().lock().clone();
        assert!(!record.is_dead);
        assert!(!record.is_to_revive);
        assert!(bans.is_banned("Alex"));
    }

    #[test]
    fn test_withdraw_does_not_double_ban() {
        let (registry, _) = registry();
        let bans = BanList::default();
        let id = dead(&registry, "Alex");
        bans.ban("Alex", "died");
        registry.set_revive_requested(id, false, ReviveOptions::default(), &bans, "died");
        assert_eq!(bans.banned.lock().len(), 1);
    }

    #[test]
    fn test_withdraw_for_unseen_player_bans_nobody() {
        let (registry, _) = registry();
        let bans = BanList::default();
        let id = PlayerId::random();

        assert!(registry.set_revive_requested(id, false, ReviveOptions::default(), &bans, "died"));
        assert!(bans.banned.lock().is_empty());
        assert!(!bans.is_banned(&id.to_string()));
        assert!(!registry.get(id).unwrap().lock().is_dead);
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let (registry, _) = registry();
        let id = dead(&registry, "Notch");
        assert_eq!(registry.find_by_name("notch").unwrap().lock().id, id);
        assert!(registry.find_by_name("jeb_").is_none());
    }

    #[test]
    fn test_save_all_reports_failures() {
        let (registry, store) = registry();
        dead(&registry, "Alex");
        dead(&registry, "Steve");
        assert_eq!(registry.save_all(), 0);
        store.set_fail_writes(true);
        assert_eq!(registry.save_all(), 2);
    }

    #[test]
    fn test_online_lists_attached() {
        let (registry, _) = registry();
        let id = PlayerId::random();
        registry.attach_online(id, ConnectionId(4), "Alex");
        registry.get_or_create(PlayerId::random());
        let online = registry.online();
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].0, ConnectionId(4));
    }
}
