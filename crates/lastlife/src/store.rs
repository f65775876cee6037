//! # Per-Player Durable Store
//!
//! A tiny key-value capability scoped per player. The engine stores a
//! handful of small values under fixed keys (see [`crate::record::keys`]).
//!
//! ## Implementations
//!
//! - [`MemoryStore`]: in-process map, for tests and embedded hosts
//! - [`FileStore`]: one file per value under `<root>/<uuid>/<key>.bin`
//!
//! ## File Format
//!
//! ```text
//! [4 bytes: magic "LLPS"]
//! [4 bytes: version]
//! [4 bytes: CRC32 of value]
//! [4 bytes: value length]
//! [N bytes: value]
//! ```
//!
//! Files are written to a temporary sibling and renamed into place, so a
//! crash mid-write leaves the previous value intact.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use lastlife_shared::{ByteReader, ByteWriter, PlayerId};
use parking_lot::RwLock;

use crate::error::{StoreError, StoreResult};

/// Magic bytes identifying a store file.
const STORE_MAGIC: &[u8; 4] = b"LLPS";

/// Current store file version.
const STORE_VERSION: u32 = 1;

/// Durable per-player key-value storage.
pub trait PlayerStore: Send + Sync {
    /// Reads a value; `Ok(None)` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the value exists but cannot be read.
    fn get(&self, player: PlayerId, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Writes a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the value could not be made durable.
    fn set(&self, player: PlayerId, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Deletes a value; deleting a missing value is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing value could not be deleted.
    fn remove(&self, player: PlayerId, key: &str) -> StoreResult<()>;

    /// Every player with at least one stored value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    fn known_players(&self) -> StoreResult<Vec<PlayerId>>;
}

fn validate_key(key: &str) -> StoreResult<()> {
    let valid = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_owned()))
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<PlayerId, HashMap<String, Vec<u8>>>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set` and `remove` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Total number of stored values.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.values.read().values().map(HashMap::len).sum()
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "memory store is read-only",
            )));
        }
        Ok(())
    }
}

impl PlayerStore for MemoryStore {
    fn get(&self, player: PlayerId, key: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self
            .values
            .read()
            .get(&player)
            .and_then(|values| values.get(key))
            .cloned())
    }

    fn set(&self, player: PlayerId, key: &str, value: &[u8]) -> StoreResult<()> {
        validate_key(key)?;
        self.check_writable()?;
        self.values
            .write()
            .entry(player)
            .or_default()
            .insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn remove(&self, player: PlayerId, key: &str) -> StoreResult<()> {
        validate_key(key)?;
        self.check_writable()?;
        let mut values = self.values.write();
        if let Some(entry) = values.get_mut(&player) {
            entry.remove(key);
            if entry.is_empty() {
                values.remove(&player);
            }
        }
        Ok(())
    }

    fn known_players(&self) -> StoreResult<Vec<PlayerId>> {
        let mut players: Vec<PlayerId> = self.values.read().keys().copied().collect();
        players.sort();
        Ok(players)
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// One checksummed file per value.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens (and creates) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn player_dir(&self, player: PlayerId) -> PathBuf {
        self.root.join(player.to_string())
    }

    fn value_path(&self, player: PlayerId, key: &str) -> PathBuf {
        self.player_dir(player).join(format!("{key}.bin"))
    }

    fn encode(value: &[u8]) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(16 + value.len());
        writer.put_raw(STORE_MAGIC);
        writer.put_u32(STORE_VERSION);
        writer.put_u32(crc32fast::hash(value));
        writer.put_bytes(value);
        writer.into_inner()
    }

    fn decode(path: &Path, data: &[u8]) -> StoreResult<Vec<u8>> {
        let mut reader = ByteReader::new(data);
        let magic = reader.take(4).map_err(|_| StoreError::BadMagic(path.to_owned()))?;
        if magic != STORE_MAGIC {
            return Err(StoreError::BadMagic(path.to_owned()));
        }
        let corrupt = |_| StoreError::ChecksumMismatch(path.to_owned());
        let version = reader.get_u32().map_err(corrupt)?;
        if version != STORE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path: path.to_owned(),
                version,
            });
        }
        let stored_crc = reader.get_u32().map_err(corrupt)?;
        let value = reader.get_bytes().map_err(corrupt)?;
        if !reader.is_exhausted() || crc32fast::hash(value) != stored_crc {
            return Err(StoreError::ChecksumMismatch(path.to_owned()));
        }
        Ok(value.to_vec())
    }
}

impl PlayerStore for FileStore {
    fn get(&self, player: PlayerId, key: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_key(key)?;
        let path = self.value_path(player, key);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Self::decode(&path, &data).map(Some)
    }

    fn set(&self, player: PlayerId, key: &str, value: &[u8]) -> StoreResult<()> {
        validate_key(key)?;
        let dir = self.player_dir(player);
        fs::create_dir_all(&dir)?;

        let path = self.value_path(player, key);
        let tmp = dir.join(format!("{key}.bin.tmp"));
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&Self::encode(value))?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, player: PlayerId, key: &str) -> StoreResult<()> {
        validate_key(key)?;
        match fs::remove_file(self.value_path(player, key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn known_players(&self) -> StoreResult<Vec<PlayerId>> {
        let mut players = BTreeSet::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            match name.to_str().map(str::parse::<PlayerId>) {
                Some(Ok(id)) => {
                    players.insert(id);
                }
                _ => tracing::debug!(dir = ?name, "skipping non-player directory in store"),
            }
        }
        Ok(players.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn PlayerStore) {
        let a = PlayerId::random();
        let b = PlayerId::random();

        assert_eq!(store.get(a, "is_dead").unwrap(), None);
        store.set(a, "is_dead", &[1]).unwrap();
        store.set(a, "is_dead", &[0]).unwrap();
        store.set(b, "saved_inventory", b"blob").unwrap();

        assert_eq!(store.get(a, "is_dead").unwrap(), Some(vec![0]));
        assert_eq!(store.get(b, "saved_inventory").unwrap(), Some(b"blob".to_vec()));
        assert_eq!(store.get(b, "is_dead").unwrap(), None);

        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(store.known_players().unwrap(), expected);

        store.remove(b, "saved_inventory").unwrap();
        store.remove(b, "saved_inventory").unwrap();
        assert_eq!(store.get(b, "saved_inventory").unwrap(), None);

        assert!(matches!(store.set(a, "../escape", &[1]), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        exercise(&store);
        assert_eq!(store.value_count(), 1);
    }

    #[test]
    fn test_memory_store_failing_writes() {
        let store = MemoryStore::new();
        let id = PlayerId::random();
        store.set_fail_writes(true);
        assert!(store.set(id, "is_dead", &[1]).is_err());
        store.set_fail_writes(false);
        store.set(id, "is_dead", &[1]).unwrap();
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("players")).unwrap();
        exercise(&store);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = PlayerId::random();
        FileStore::open(dir.path()).unwrap().set(id, "is_to_revive", &[1]).unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get(id, "is_to_revive").unwrap(), Some(vec![1]));
        assert_eq!(reopened.known_players().unwrap(), vec![id]);
    }

    #[test]
    fn test_file_store_detects_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let id = PlayerId::random();
        store.set(id, "last_death_location", b"somewhere").unwrap();

        let path = store.value_path(id, "last_death_location");
        let mut data = fs::read(&path).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xff;
        fs::write(&path, &data).unwrap();
        assert!(matches!(
            store.get(id, "last_death_location"),
            Err(StoreError::ChecksumMismatch(_))
        ));

        fs::write(&path, b"nope").unwrap();
        assert!(matches!(store.get(id, "last_death_location"), Err(StoreError::BadMagic(_))));
    }

    #[test]
    fn test_file_store_ignores_stray_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join("not-a-uuid")).unwrap();
        fs::write(dir.path().join("README"), b"hello").unwrap();
        assert!(store.known_players().unwrap().is_empty());
    }
}
