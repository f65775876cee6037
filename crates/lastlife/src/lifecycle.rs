//! # Lifecycle Engine
//!
//! Drives each player through `Alive → Dead → ReviveRequested → Alive`.
//!
//! ```text
//!            punitive death                 revive request
//!   Alive ───────────────────> Dead ───────────────────────> ReviveRequested
//!     ^                         ^  │                                │
//!     │        undo             │  │ withdraw                       │ join / respawn
//!     │ <───────────────────────┘  └──────> Alive (banned)          │
//!     └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Handlers
//!
//! World-event handlers (`on_*`) never return errors. Every failure is
//! logged and absorbed so the surrounding server keeps running. The
//! administrator operations return [`LifecycleResult`] where the caller
//! needs to tell the operator what went wrong.
//!
//! Each handler holds the player's record lock for its whole run, so an
//! administrator command and a world event for the same player never
//! interleave.

use std::sync::Arc;

use lastlife_inventory::{capture, restore, Inventory, RestoreOutcome};
use lastlife_shared::{ConnectionId, GameMode, Location, PlayerId};
use lastlife_world::SafeLocationResolver;
use parking_lot::RwLock;

use crate::config::{BanIntegration, EngineConfig};
use crate::error::{ConfigResult, LifecycleError, LifecycleResult};
use crate::events::{EventBus, EventReceiver, LifecycleEvent};
use crate::host::{AccessControl, PlayerHost, ReviveGuard};
use crate::record::{PlayerRecord, PlayerState, ReviveOptions, ReviveResult};
use crate::registry::PlayerRegistry;
use crate::store::{FileStore, PlayerStore};
use crate::strings::{DefaultStrings, Localizer, StringKey};

/// Answer to a login attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginDecision {
    /// Let the player in.
    Allowed,
    /// Refuse with a message.
    Denied {
        /// Shown on the disconnect screen.
        reason: String,
    },
}

/// What an undo request did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The revive was undone now.
    Undone,
    /// The player is offline; the undo runs on their next join.
    Deferred,
}

/// The lifecycle state machine and its collaborators.
pub struct LifecycleEngine {
    config: RwLock<EngineConfig>,
    registry: Arc<PlayerRegistry>,
    host: Arc<dyn PlayerHost>,
    access: Arc<dyn AccessControl>,
    strings: Arc<dyn Localizer>,
    guard: Option<Arc<dyn ReviveGuard>>,
    events: EventBus,
}

impl LifecycleEngine {
    /// Creates an engine over a store and the host seams.
    #[must_use]
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn PlayerStore>,
        host: Arc<dyn PlayerHost>,
        access: Arc<dyn AccessControl>,
    ) -> Self {
        Self {
            config: RwLock::new(config),
            registry: Arc::new(PlayerRegistry::new(store)),
            host,
            access,
            strings: Arc::new(DefaultStrings::new()),
            guard: None,
            events: EventBus::default(),
        }
    }

    /// Creates an engine persisting to a [`FileStore`] under
    /// `config.storage.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Config`] if the configuration is invalid
    /// and [`LifecycleError::Store`] if the data directory cannot be
    /// created.
    pub fn from_config(
        config: EngineConfig,
        host: Arc<dyn PlayerHost>,
        access: Arc<dyn AccessControl>,
    ) -> LifecycleResult<Self> {
        config.validate()?;
        let store = FileStore::open(&config.storage.data_dir)?;
        tracing::info!(data_dir = %config.storage.data_dir.display(), "opened player store");
        Ok(Self::new(config, Arc::new(store), host, access))
    }

    /// Replaces the built-in English strings.
    #[must_use]
    pub fn with_localizer(mut self, strings: Arc<dyn Localizer>) -> Self {
        self.strings = strings;
        self
    }

    /// Installs a guard consulted before every revive.
    #[must_use]
    pub fn with_guard(mut self, guard: Arc<dyn ReviveGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Subscribes to lifecycle events.
    ///
    /// Each receiver gets its own copy of every event published after the
    /// call. Drop the receiver to unsubscribe.
    #[must_use]
    pub fn events(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// The record registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<PlayerRegistry> {
        &self.registry
    }

    /// Copy of the current configuration.
    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config.read().clone()
    }

    /// Copy of a player's record, if materialized.
    #[must_use]
    pub fn record(&self, id: PlayerId) -> Option<PlayerRecord> {
        self.registry.get(id).map(|handle| handle.lock().clone())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Materializes every stored player so they show up in listings
    /// before they next join.
    pub fn start(&self) -> usize {
        self.registry.reconcile()
    }

    /// Swaps in a new configuration. Materialized records are kept.
    ///
    /// An invalid configuration is rejected and the current one stays in
    /// force. `storage.data_dir` only takes effect on the next
    /// [`LifecycleEngine::from_config`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ConfigError::Invalid`] if `config` fails validation.
    pub fn reload(&self, config: EngineConfig) -> ConfigResult<()> {
        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "rejected configuration reload");
            return Err(e);
        }
        let mut current = self.config.write();
        if current.storage != config.storage {
            tracing::warn!("storage settings changed; they apply after a restart");
        }
        *current = config;
        tracing::info!(records = self.registry.len(), "configuration reloaded");
        Ok(())
    }

    /// Persists every record. Returns how many failed.
    pub fn save_all(&self) -> usize {
        self.registry.save_all()
    }

    /// Returns true if deaths are punished on this host.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.host.is_hardcore() || self.config.read().death_ban.enabled_on_non_hardcore
    }

    // =========================================================================
    // World events
    // =========================================================================

    /// Refuses dead players with no pending revive.
    #[must_use]
    pub fn on_pre_login(&self, id: PlayerId) -> LoginDecision {
        if !self.is_enabled() {
            return LoginDecision::Allowed;
        }
        let handle = self.registry.get_or_create(id);
        let record = handle.lock();
        if record.state() == PlayerState::Dead {
            tracing::info!(player = %id, "refusing login of dead player");
            LoginDecision::Denied {
                reason: self.strings.render(StringKey::LoginDenied, &record.display_name()),
            }
        } else {
            LoginDecision::Allowed
        }
    }

    /// A player joined.
    ///
    /// Resumes a ghost state, runs a deferred undo, or revives a player whose
    /// revive was requested while they were away.
    pub fn on_join(&self, id: PlayerId, conn: ConnectionId, name: &str) {
        let handle = self.registry.attach_online(id, conn, name);
        let mut record = handle.lock();
        tracing::debug!(player = %id, ?conn, state = ?record.state(), "player joined");

        if record.ghost.is_active() {
            self.host.set_ghost(conn, true);
        }

        if record.undo_pending {
            self.undo_locked(&mut record, conn);
        } else if record.state() == PlayerState::ReviveRequested && !self.host.is_awaiting_respawn(conn) {
            self.revive_locked(&mut record, conn);
        }
    }

    /// A player died at `location`.
    pub fn on_death(&self, id: PlayerId, conn: ConnectionId, location: Location) {
        let config = self.config();
        if !self.is_enabled() {
            return;
        }
        if !config.is_punished_world(&location.world) {
            tracing::debug!(player = %id, world = %location.world, "death in unpunished world");
            return;
        }
        if self.host.is_exempt(conn) {
            tracing::info!(player = %id, "exempt player died, not banning");
            return;
        }

        let handle = self.registry.get_or_create(id);
        let mut record = handle.lock();
        if let Some(name) = self.host.player_name(conn) {
            record.last_known_name = name;
        }
        let name = record.display_name();

        let Some(inventory) = self.host.inventory(conn) else {
            tracing::warn!(player = %id, "player left before the death was handled");
            return;
        };
        record.saved_inventory = Some(capture(&inventory));
        record.last_death_location = Some(location.clone());
        self.registry.persist_inventory(&record);
        self.registry.persist_death_location(&record);
        self.host.set_inventory(conn, Inventory::new());

        record.is_dead = true;
        record.is_to_revive = false;
        record.undo_pending = false;
        record.ghost.clear();
        self.registry.persist(&record);

        let reason = self.ban(&config, &name);
        tracing::info!(player = %id, name = %name, world = %location.world, "player died, banned");
        self.events.publish(&LifecycleEvent::DeathBanned {
            player: id,
            name,
            location,
            reason,
        });
    }

    /// The player's avatar respawned; runs a requested revive.
    pub fn on_post_respawn(&self, id: PlayerId, conn: ConnectionId) {
        let Some(handle) = self.registry.get(id) else {
            return;
        };
        let mut record = handle.lock();
        if record.state() == PlayerState::ReviveRequested {
            self.revive_locked(&mut record, conn);
        }
    }

    /// A player left.
    pub fn on_quit(&self, id: PlayerId) {
        self.registry.detach_online(id);
        tracing::debug!(player = %id, "player left");
    }

    /// Advances every online player's ghost state by one tick.
    pub fn tick(&self) {
        for (conn, handle) in self.registry.online() {
            let mut record = handle.lock();
            if record.ghost.tick() {
                self.host.set_ghost(conn, false);
                tracing::debug!(player = %record.id, "ghost state expired");
            }
        }
    }

    // =========================================================================
    // Administrator operations
    // =========================================================================

    /// Requests or withdraws a revive by identity.
    ///
    /// `options` defaults to the configured revive options. Returns true if
    /// the record changed; a request for a living player changes nothing.
    pub fn set_revive_requested(&self, id: PlayerId, value: bool, options: Option<ReviveOptions>) -> bool {
        let options = options.unwrap_or_else(|| self.config.read().default_revive_options());
        let reason = self.strings.lookup(StringKey::DeathBanReason);
        let changed = self
            .registry
            .set_revive_requested(id, value, options, self.access.as_ref(), &reason);

        if changed && value {
            let name = self
                .registry
                .get(id)
                .map_or_else(|| id.to_string(), |handle| handle.lock().display_name());
            self.events.publish(&LifecycleEvent::ReviveRequested {
                player: id,
                name,
                options,
            });
        }
        changed
    }

    /// Requests a revive by display name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if no record carries the name.
    pub fn request_revive(&self, name: &str, options: Option<ReviveOptions>) -> LifecycleResult<bool> {
        let id = self.id_by_name(name)?;
        Ok(self.set_revive_requested(id, true, options))
    }

    /// Names of dead players waiting for a revive request.
    #[must_use]
    pub fn list_revivable(&self) -> Vec<String> {
        self.registry.list_revivable()
    }

    /// Undoes the last successful revive: the player goes back to where
    /// they were revived from, loses the restored inventory and is banned
    /// again.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` or `NothingToUndo`.
    pub fn undo_revive(&self, name: &str) -> LifecycleResult<UndoOutcome> {
        let handle = self
            .registry
            .find_by_name(name)
            .ok_or_else(|| LifecycleError::UnknownName(name.to_owned()))?;
        let mut record = handle.lock();
        if record.last_successful_revive().is_none() {
            return Err(LifecycleError::NothingToUndo(name.to_owned()));
        }

        if let Some(conn) = record.online {
            self.undo_locked(&mut record, conn);
            return Ok(UndoOutcome::Undone);
        }

        record.undo_pending = true;
        self.registry.persist(&record);
        tracing::warn!(player = %record.id, "{}", self.strings.render(StringKey::UndoNotOnline, &record.display_name()));
        Ok(UndoOutcome::Deferred)
    }

    /// Where a player last died.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` or `NoDeathLocation`.
    pub fn death_location_of(&self, name: &str) -> LifecycleResult<Location> {
        let handle = self
            .registry
            .find_by_name(name)
            .ok_or_else(|| LifecycleError::UnknownName(name.to_owned()))?;
        let record = handle.lock();
        record
            .last_death_location
            .clone()
            .ok_or_else(|| LifecycleError::NoDeathLocation(name.to_owned()))
    }

    /// Teleports `viewer` to where `name` last died. Returns false if the
    /// host refused.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName`, `NoDeathLocation` or `WorldUnavailable`.
    pub fn teleport_to_death_location(&self, viewer: ConnectionId, name: &str) -> LifecycleResult<bool> {
        let location = self.death_location_of(name)?;
        if self.host.world(&location.world).is_none() {
            return Err(LifecycleError::WorldUnavailable(location.world));
        }
        Ok(self.host.teleport(viewer, &location))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn id_by_name(&self, name: &str) -> LifecycleResult<PlayerId> {
        self.registry
            .find_by_name(name)
            .map(|handle| handle.lock().id)
            .ok_or_else(|| LifecycleError::UnknownName(name.to_owned()))
    }

    /// Issues the death ban. Returns the reason shown to the player.
    fn ban(&self, config: &EngineConfig, name: &str) -> String {
        let reason = self.strings.render(StringKey::DeathBanReason, name);
        if config.ban.integration == BanIntegration::Layout && self.access.has_layout(&config.ban.layout) {
            self.access.ban_with_layout(name, &config.ban.layout);
        } else {
            self.access.ban(name, &reason);
        }
        reason
    }

    fn revive_locked(&self, record: &mut PlayerRecord, conn: ConnectionId) {
        let config = self.config();
        let id = record.id;
        let name = record.display_name();

        let options = match &self.guard {
            Some(guard) => guard.review(id, record.revive_options),
            None => Some(record.revive_options),
        };
        let Some(options) = options else {
            tracing::info!(player = %id, "revive vetoed");
            record.is_dead = true;
            record.is_to_revive = false;
            let result = ReviveResult {
                successful: false,
                teleported: false,
                inventory_restored: false,
                teleported_from: None,
            };
            record.revives.push(result.clone());
            self.registry.persist(record);
            self.ban(&config, &name);
            self.events.publish(&LifecycleEvent::Revived { player: id, name, result });
            return;
        };

        if !self.host.set_game_mode(conn, GameMode::Survival) {
            tracing::warn!(player = %id, "{}", self.strings.render(StringKey::ReviveNotOnline, &name));
            return;
        }

        let mut inventory_restored = false;
        if options.restore_inventory {
            let mut inventory = Inventory::new();
            if restore(record.saved_inventory.as_deref(), &mut inventory) == RestoreOutcome::Missing {
                tracing::warn!(player = %id, "{}", self.strings.render(StringKey::ReviveNoInventory, &name));
            }
            inventory_restored = self.host.set_inventory(conn, inventory);
        }

        let mut teleported_from = None;
        if options.teleport_to_death_location {
            teleported_from = self.teleport_to_safety(record, conn, &config);
        }
        let teleported = teleported_from.is_some();

        record.is_dead = false;
        record.is_to_revive = false;
        record.saved_inventory = None;
        let result = ReviveResult {
            successful: true,
            teleported,
            inventory_restored,
            teleported_from,
        };
        record.revives.push(result.clone());
        debug_assert!(record.is_consistent());
        self.registry.persist(record);
        self.registry.persist_inventory(record);

        tracing::info!(player = %id, name = %name, teleported, inventory_restored, "player revived");
        self.events.publish(&LifecycleEvent::Revived { player: id, name, result });
    }

    /// Teleports near the death location. Returns where the player stood
    /// before, or `None` if they were not moved.
    fn teleport_to_safety(&self, record: &mut PlayerRecord, conn: ConnectionId, config: &EngineConfig) -> Option<Location> {
        let name = record.display_name();
        let Some(death) = record.last_death_location.clone() else {
            tracing::warn!(player = %record.id, "{}", self.strings.render(StringKey::ReviveNoLastDeath, &name));
            return None;
        };
        let Some(world) = self.host.world(&death.world) else {
            tracing::warn!(player = %record.id, world = %death.world, "death world is not loaded, not teleporting");
            return None;
        };

        let resolver = SafeLocationResolver::with_checks(config.revive.safety_checks.into());
        let target = match resolver.resolve_detailed(world.as_ref(), &death) {
            Ok(target) => target,
            Err(reason) => {
                tracing::warn!(
                    player = %record.id,
                    %reason,
                    "{}",
                    self.strings.render(StringKey::ReviveUnsafeTeleport, &name)
                );
                return None;
            }
        };

        let Some(from) = self.host.location(conn) else {
            tracing::warn!(player = %record.id, "{}", self.strings.render(StringKey::ReviveNotOnline, &name));
            return None;
        };
        if !self.host.teleport(conn, &target) {
            tracing::warn!(player = %record.id, "host refused the revive teleport");
            return None;
        }
        if config.revive.ghost_ticks > 0 {
            record.ghost.apply(config.revive.ghost_ticks);
            self.host.set_ghost(conn, true);
        }
        Some(from)
    }

    fn undo_locked(&self, record: &mut PlayerRecord, conn: ConnectionId) {
        let config = self.config();
        let id = record.id;
        let name = record.display_name();
        record.undo_pending = false;

        let Some(last) = record.pop_last_successful_revive() else {
            self.registry.persist(record);
            return;
        };
        if let Some(from) = &last.teleported_from {
            if !self.host.teleport(conn, from) {
                tracing::warn!(player = %id, "host refused the undo teleport");
            }
        }
        if last.inventory_restored {
            // Keep the items for the next revive instead of destroying them.
            if let Some(inventory) = self.host.inventory(conn) {
                record.saved_inventory = Some(capture(&inventory));
                self.registry.persist_inventory(record);
            }
            self.host.set_inventory(conn, Inventory::new());
        }
        record.ghost.clear();
        self.host.set_ghost(conn, false);

        record.is_dead = true;
        record.is_to_revive = false;
        self.registry.persist(record);
        self.ban(&config, &name);

        tracing::info!(player = %id, "{}", self.strings.render(StringKey::UndoSuccess, &name));
        self.events.publish(&LifecycleEvent::ReviveUndone { player: id, name });
    }
}
