//! # LASTLIFE Inventory
//!
//! Player inventories and the snapshot taken of them at death.
//!
//! ## Modules
//!
//! - `inventory`: Pre-allocated 41-slot player inventory
//! - `snapshot`: Capture to / restore from an opaque, checksummed blob
//! - `error`: Error types

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod inventory;
pub mod snapshot;

pub use error::{InventoryError, InventoryResult};
pub use inventory::{Inventory, ItemId, ItemStack, PLAYER_INVENTORY_SLOTS};
pub use snapshot::{capture, decode, restore, RestoreOutcome};
