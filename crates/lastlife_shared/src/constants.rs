//! # World & Timing Constants
//!
//! Values shared by the world model and the lifecycle engine.

// =============================================================================
// WORLD BOUNDS
// =============================================================================

/// Lowest block height of a regular world. Nothing exists below it.
pub const WORLD_FLOOR_Y: i32 = -64;

/// One past the highest block height of a regular world.
pub const WORLD_CEILING_Y: i32 = 320;

// =============================================================================
// TIMING
// =============================================================================

/// Server ticks per second.
pub const TICK_RATE: u32 = 20;

/// Ticks a revived player stays in ghost state after a successful teleport
/// (30 seconds).
pub const GHOST_DURATION_TICKS: u32 = 30 * TICK_RATE;
