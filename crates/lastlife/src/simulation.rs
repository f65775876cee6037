//! # Simulation Host
//!
//! An in-memory server implementing [`PlayerHost`] and [`AccessControl`],
//! for tests and offline tooling.
//!
//! ## Design
//!
//! - Fixed slot table; a [`ConnectionId`] is the slot index
//! - Disconnecting frees the slot, so a stale id reads as offline
//! - Ban list keyed by lowercase name

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lastlife_inventory::Inventory;
use lastlife_shared::{ConnectionId, GameMode, Location, PlayerId};
use lastlife_world::{ColumnQuery, VoxelWorld};
use parking_lot::{Mutex, RwLock};

use crate::host::{AccessControl, PlayerHost};

/// Maximum simultaneous players.
pub const MAX_PLAYERS: usize = 64;

/// One connected player.
#[derive(Clone, Debug, PartialEq)]
pub struct SimPlayer {
    /// Identity.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Live inventory.
    pub inventory: Inventory,
    /// Current game mode.
    pub game_mode: GameMode,
    /// Current position.
    pub location: Location,
    /// Ghost protection active.
    pub ghost: bool,
    /// Exempt from death bans.
    pub exempt: bool,
    /// On the death screen.
    pub awaiting_respawn: bool,
}

/// A ban list entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BanEntry {
    /// Plain ban.
    Reason(String),
    /// Ban through a message layout.
    Layout(String),
}

/// In-memory server.
pub struct SimServer {
    hardcore: AtomicBool,
    slots: RwLock<Box<[Option<SimPlayer>]>>,
    worlds: RwLock<HashMap<String, Arc<RwLock<VoxelWorld>>>>,
    bans: Mutex<HashMap<String, BanEntry>>,
    layouts: RwLock<HashSet<String>>,
    refuse_teleports: AtomicBool,
}

impl SimServer {
    /// Creates an empty server.
    #[must_use]
    pub fn new(hardcore: bool) -> Self {
        let slots: Vec<Option<SimPlayer>> = (0..MAX_PLAYERS).map(|_| None).collect();
        Self {
            hardcore: AtomicBool::new(hardcore),
            slots: RwLock::new(slots.into_boxed_slice()),
            worlds: RwLock::new(HashMap::new()),
            bans: Mutex::new(HashMap::new()),
            layouts: RwLock::new(HashSet::new()),
            refuse_teleports: AtomicBool::new(false),
        }
    }

    /// Switches hardcore mode.
    pub fn set_hardcore(&self, hardcore: bool) {
        self.hardcore.store(hardcore, Ordering::Relaxed);
    }

    /// Makes every teleport fail, as if a plugin cancelled it.
    pub fn set_refuse_teleports(&self, refuse: bool) {
        self.refuse_teleports.store(refuse, Ordering::Relaxed);
    }

    /// Loads a world, returning the shared handle for editing.
    pub fn add_world(&self, world: VoxelWorld) -> Arc<RwLock<VoxelWorld>> {
        let name = world.name().to_owned();
        let shared = Arc::new(RwLock::new(world));
        self.worlds.write().insert(name, shared.clone());
        shared
    }

    /// Registers a ban message layout.
    pub fn add_layout(&self, layout: &str) {
        self.layouts.write().insert(layout.to_owned());
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Connects a player. Returns `None` if the server is full.
    #[allow(clippy::cast_possible_truncation)]
    pub fn connect(&self, id: PlayerId, name: &str, location: Location) -> Option<ConnectionId> {
        let mut slots = self.slots.write();
        let index = slots.iter().position(Option::is_none)?;
        slots[index] = Some(SimPlayer {
            id,
            name: name.to_owned(),
            inventory: Inventory::new(),
            game_mode: GameMode::Survival,
            location,
            ghost: false,
            exempt: false,
            awaiting_respawn: false,
        });
        Some(ConnectionId(index as u32))
    }

    /// Disconnects a player, returning their final state.
    pub fn disconnect(&self, conn: ConnectionId) -> Option<SimPlayer> {
        self.slots.write().get_mut(conn.index())?.take()
    }

    /// Number of connected players.
    #[must_use]
    pub fn online_count(&self) -> usize {
        self.slots.read().iter().flatten().count()
    }

    /// Copy of a connected player.
    #[must_use]
    pub fn player(&self, conn: ConnectionId) -> Option<SimPlayer> {
        self.slots.read().get(conn.index())?.clone()
    }

    /// Edits a connected player. Returns `None` if the slot is empty.
    pub fn with_player<R>(&self, conn: ConnectionId, f: impl FnOnce(&mut SimPlayer) -> R) -> Option<R> {
        self.slots.write().get_mut(conn.index())?.as_mut().map(f)
    }

    /// Reads a connected player without cloning.
    fn read_player<R>(&self, conn: ConnectionId, f: impl FnOnce(&SimPlayer) -> R) -> Option<R> {
        self.slots.read().get(conn.index())?.as_ref().map(f)
    }

    // =========================================================================
    // Ban list
    // =========================================================================

    /// The ban entry for a name.
    #[must_use]
    pub fn ban_entry(&self, name: &str) -> Option<BanEntry> {
        self.bans.lock().get(&name.to_lowercase()).cloned()
    }

    /// Number of banned names.
    #[must_use]
    pub fn ban_count(&self) -> usize {
        self.bans.lock().len()
    }
}

impl PlayerHost for SimServer {
    fn is_hardcore(&self) -> bool {
        self.hardcore.load(Ordering::Relaxed)
    }

    fn player_name(&self, conn: ConnectionId) -> Option<String> {
        self.read_player(conn, |p| p.name.clone())
    }

    fn is_exempt(&self, conn: ConnectionId) -> bool {
        self.read_player(conn, |p| p.exempt).unwrap_or(false)
    }

    fn is_awaiting_respawn(&self, conn: ConnectionId) -> bool {
        self.read_player(conn, |p| p.awaiting_respawn).unwrap_or(false)
    }

    fn inventory(&self, conn: ConnectionId) -> Option<Inventory> {
        self.read_player(conn, |p| p.inventory.clone())
    }

    fn set_inventory(&self, conn: ConnectionId, inventory: Inventory) -> bool {
        self.with_player(conn, |p| p.inventory = inventory).is_some()
    }

    fn set_game_mode(&self, conn: ConnectionId, mode: GameMode) -> bool {
        self.with_player(conn, |p| p.game_mode = mode).is_some()
    }

    fn location(&self, conn: ConnectionId) -> Option<Location> {
        self.read_player(conn, |p| p.location.clone())
    }

    fn teleport(&self, conn: ConnectionId, target: &Location) -> bool {
        if self.refuse_teleports.load(Ordering::Relaxed) {
            return false;
        }
        self.with_player(conn, |p| p.location = target.clone()).is_some()
    }

    fn set_ghost(&self, conn: ConnectionId, active: bool) {
        self.with_player(conn, |p| p.ghost = active);
    }

    fn world(&self, name: &str) -> Option<Arc<dyn ColumnQuery>> {
        self.worlds
            .read()
            .get(name)
            .map(|world| world.clone() as Arc<dyn ColumnQuery>)
    }
}

impl AccessControl for SimServer {
    fn ban(&self, name: &str, reason: &str) {
        self.bans
            .lock()
            .insert(name.to_lowercase(), BanEntry::Reason(reason.to_owned()));
    }

    fn ban_with_layout(&self, name: &str, layout: &str) {
        self.bans
            .lock()
            .insert(name.to_lowercase(), BanEntry::Layout(layout.to_owned()));
    }

    fn has_layout(&self, layout: &str) -> bool {
        self.layouts.read().contains(layout)
    }

    fn pardon(&self, name: &str) {
        self.bans.lock().remove(&name.to_lowercase());
    }

    fn is_banned(&self, name: &str) -> bool {
        self.bans.lock().contains_key(&name.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn() -> Location {
        Location::new("world", 0.5, 64.0, 0.5)
    }

    #[test]
    fn test_connect_reuses_slots() {
        let server = SimServer::new(true);
        let a = server.connect(PlayerId::random(), "Alex", spawn()).unwrap();
        let b = server.connect(PlayerId::random(), "Steve", spawn()).unwrap();
        assert_ne!(a, b);
        assert_eq!(server.online_count(), 2);

        server.disconnect(a).unwrap();
        assert!(server.player(a).is_none());
        assert!(!server.teleport(a, &spawn()));
        let c = server.connect(PlayerId::random(), "Notch", spawn()).unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn test_server_full() {
        let server = SimServer::new(true);
        for _ in 0..MAX_PLAYERS {
            server.connect(PlayerId::random(), "bot", spawn()).unwrap();
        }
        assert!(server.connect(PlayerId::random(), "late", spawn()).is_none());
    }

    #[test]
    fn test_ban_list_case_insensitive() {
        let server = SimServer::new(true);
        server.ban("Alex", "died");
        assert!(server.is_banned("alex"));
        assert_eq!(server.ban_entry("ALEX"), Some(BanEntry::Reason("died".to_owned())));
        server.pardon("ALEX");
        assert!(!server.is_banned("Alex"));
    }

    #[test]
    fn test_world_lookup() {
        let server = SimServer::new(true);
        server.add_world(VoxelWorld::new("world"));
        assert!(server.world("world").is_some());
        assert!(server.world("world_nether").is_none());
    }

    #[test]
    fn test_refused_teleport() {
        let server = SimServer::new(true);
        let conn = server.connect(PlayerId::random(), "Alex", spawn()).unwrap();
        server.set_refuse_teleports(true);
        assert!(!server.teleport(conn, &Location::new("world", 9.0, 70.0, 9.0)));
        assert_eq!(server.location(conn), Some(spawn()));
    }
}
