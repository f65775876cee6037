//! # LASTLIFE
//!
//! Hardcore death bans with administrator revives.
//!
//! A player who dies in a punished world has their inventory captured and
//! is banned. An administrator can later request a revive; the next time
//! the player respawns they get their inventory back and are teleported to
//! a safe spot near where they died.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  world events   ┌──────────────────┐   records   ┌────────────────┐
//! │  PlayerHost  │ ──────────────> │ LifecycleEngine  │ ──────────> │ PlayerRegistry │
//! │ AccessControl│ <────────────── │                  │             │  PlayerStore   │
//! └──────────────┘  ban / restore  └──────────────────┘             └────────────────┘
//!                                          │
//!                                          v
//!                                  LifecycleEvent bus
//! ```
//!
//! ## Modules
//!
//! - `lifecycle`: The state machine and administrator operations
//! - `registry`: In-memory records over the durable store
//! - `record`: One player's lifecycle state and its persisted form
//! - `store`: Per-player key/value persistence (memory and file backed)
//! - `host`: Seams to the server, the ban list and the revive guard
//! - `events`: Fan-out of lifecycle notifications to subscribers
//! - `config`: TOML configuration
//! - `strings`: Localized messages
//! - `simulation`: In-memory host for tests and tooling

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod events;
pub mod ghost;
pub mod host;
pub mod lifecycle;
pub mod record;
pub mod registry;
pub mod simulation;
pub mod store;
pub mod strings;

pub use config::{BanIntegration, EngineConfig};
pub use error::{ConfigError, LifecycleError, LifecycleResult, StoreError, StoreResult};
pub use events::{EventReceiver, LifecycleEvent};
pub use host::{AccessControl, PlayerHost, ReviveGuard};
pub use lifecycle::{LifecycleEngine, LoginDecision, UndoOutcome};
pub use record::{PlayerRecord, PlayerState, ReviveOptions, ReviveResult};
pub use registry::PlayerRegistry;
pub use simulation::SimServer;
pub use store::{FileStore, MemoryStore, PlayerStore};
pub use strings::{DefaultStrings, Localizer, StringKey};
