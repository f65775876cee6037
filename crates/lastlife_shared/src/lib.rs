//! # LASTLIFE Shared
//!
//! Common types used by the world model, the inventory store and the
//! lifecycle engine.
//!
//! ## Contents
//!
//! - [`PlayerId`] and [`ConnectionId`]: who a player is, and where they are
//!   currently attached to the host (if anywhere)
//! - [`Location`] and [`BlockPos`]: world coordinates
//! - [`GameMode`]
//! - [`ByteWriter`] / [`ByteReader`]: the little-endian codec every
//!   persisted record is written with

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod constants;
pub mod ids;
pub mod location;
pub mod player;

pub use codec::{ByteReader, ByteWriter, CodecError, CodecResult};
pub use constants::{GHOST_DURATION_TICKS, TICK_RATE, WORLD_CEILING_Y, WORLD_FLOOR_Y};
pub use ids::{ConnectionId, PlayerId};
pub use location::{BlockPos, Location};
pub use player::GameMode;
