//! # LASTLIFE World
//!
//! The parts of the world model the revive path needs.
//!
//! ## Modules
//!
//! - `material`: Closed enumeration of block materials
//! - `hazard`: Pure classifier (hazardous / solid / void)
//! - `column`: The [`ColumnQuery`] capability and an in-memory chunked world
//! - `safe_location`: Finds a non-lethal teleport target near a location
//!
//! ## Example
//!
//! ```rust
//! use lastlife_shared::{BlockPos, Location};
//! use lastlife_world::{Material, SafeLocationResolver, VoxelWorld};
//!
//! let mut world = VoxelWorld::new("world");
//! world.fill_column(0, 0, -64, 63, Material::Stone);
//!
//! let resolver = SafeLocationResolver::new();
//! let target = resolver.resolve(&world, &Location::new("world", 0.5, 64.0, 0.5));
//! assert_eq!(target.map(|l| l.block_pos()), Some(BlockPos::new(0, 64, 0)));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod column;
pub mod hazard;
pub mod material;
pub mod safe_location;

pub use column::{Chunk, ChunkCoord, ColumnQuery, VoxelWorld, CHUNK_SIZE};
pub use hazard::{is_hazardous, is_solid, is_void};
pub use material::Material;
pub use safe_location::{SafeLocationResolver, SafetyChecks, UnsafeReason};
