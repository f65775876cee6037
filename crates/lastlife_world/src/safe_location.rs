//! # Safe-Location Resolver
//!
//! Finds a non-lethal teleport target for a revived player, starting from
//! where they died. The terrain may have changed while the player was gone,
//! so the death location is never trusted as-is.
//!
//! ## Search Order
//!
//! 1. The candidate block itself: accepted unchanged if it is standable
//!    (not solid, not void, not hazardous).
//! 2. The highest non-empty block of the candidate's column, checked the
//!    same way.
//! 3. A downward scan of the column from the candidate's height to the
//!    world floor. A hazardous block fails the search. The first solid
//!    block is the floor: the block above it is the target, and it must be
//!    standable itself.
//! 4. Reaching the floor without finding a stop fails the search.
//!
//! Every step is bounded by the world's height range, so a resolution
//! costs at most one column scan.
//!
//! ## Optional Checks
//!
//! [`SafetyChecks`] adds stricter rules to every accepted position:
//! ground scan (nothing hazardous between the feet and the floor), drowning
//! (no water with water or a solid block above) and surroundings (no lava
//! within one block, not walled in on all sides).

use lastlife_shared::{BlockPos, Location};
use thiserror::Error;

use crate::column::ColumnQuery;
use crate::hazard::{is_hazardous, is_solid, is_void};
use crate::material::Material;

/// Why a position (or a whole search) was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsafeReason {
    /// The block is solid; the player would suffocate.
    #[error("obstructed by {material:?} at y={y}")]
    Obstructed {
        /// Blocking material.
        material: Material,
        /// Height of the block.
        y: i32,
    },

    /// The position is outside the world.
    #[error("position at y={y} is in the void")]
    Void {
        /// Height of the block.
        y: i32,
    },

    /// The block itself hurts.
    #[error("{material:?} at y={y} is hazardous")]
    Hazard {
        /// Hazardous material.
        material: Material,
        /// Height of the block.
        y: i32,
    },

    /// A hazard lies between the position and the ground below it.
    #[error("{material:?} below at y={y}")]
    HazardBelow {
        /// Hazardous material.
        material: Material,
        /// Height of the block.
        y: i32,
    },

    /// The column has no floor above the world bottom.
    #[error("no floor above the bottom of the world")]
    NoFloor,

    /// Water with no air above it.
    #[error("player would drown at y={y}")]
    Drowning {
        /// Height of the block.
        y: i32,
    },

    /// Lava within one block.
    #[error("lava next to y={y}")]
    LavaNearby {
        /// Height of the block.
        y: i32,
    },

    /// Walled in on every side.
    #[error("enclosed at y={y}")]
    Enclosed {
        /// Height of the block.
        y: i32,
    },
}

/// Stricter rules applied on top of the basic standability check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SafetyChecks {
    /// Reject positions with a hazard between the feet and the floor.
    pub ground_scan: bool,
    /// Reject water with water or a solid block above.
    pub drowning: bool,
    /// Reject positions next to lava or walled in on all four sides and
    /// above.
    pub surroundings: bool,
}

impl SafetyChecks {
    /// No additional checks.
    pub const NONE: Self = Self {
        ground_scan: false,
        drowning: false,
        surroundings: false,
    };

    /// Every additional check.
    pub const ALL: Self = Self {
        ground_scan: true,
        drowning: true,
        surroundings: true,
    };
}

/// Hazard-aware teleport target search.
#[derive(Clone, Copy, Debug, Default)]
pub struct SafeLocationResolver {
    checks: SafetyChecks,
}

impl SafeLocationResolver {
    /// Creates a resolver with the basic checks only.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            checks: SafetyChecks::NONE,
        }
    }

    /// Creates a resolver with additional checks.
    #[must_use]
    pub const fn with_checks(checks: SafetyChecks) -> Self {
        Self { checks }
    }

    /// The additional checks in effect.
    #[must_use]
    pub const fn checks(&self) -> SafetyChecks {
        self.checks
    }

    /// Resolves a safe target, or `None` if the column offers none.
    #[must_use]
    pub fn resolve(&self, world: &dyn ColumnQuery, candidate: &Location) -> Option<Location> {
        self.resolve_detailed(world, candidate).ok()
    }

    /// Resolves a safe target, reporting why the search failed.
    ///
    /// # Errors
    ///
    /// Returns the reason the last search step rejected its position.
    pub fn resolve_detailed(
        &self,
        world: &dyn ColumnQuery,
        candidate: &Location,
    ) -> Result<Location, UnsafeReason> {
        let pos = candidate.block_pos();

        // 1. The candidate as-is.
        let first = match self.check(world, pos) {
            Ok(()) => {
                tracing::debug!(?pos, "candidate location is safe");
                return Ok(candidate.clone());
            }
            Err(reason) => reason,
        };

        // 2. The top of the column.
        if let Some(top) = world.highest_block_y(pos.x, pos.z) {
            if self.check(world, pos.with_y(top)).is_ok() {
                tracing::debug!(?pos, top, "highest block of column is safe");
                return Ok(candidate.at_block_y(top));
            }
        }

        // 3. Scan down for a floor.
        let result = self.scan_down(world, pos);
        match &result {
            Ok(y) => tracing::debug!(?pos, y, "found floor below candidate"),
            Err(reason) => tracing::debug!(?pos, %first, %reason, "no safe location in column"),
        }
        result.map(|y| candidate.at_block_y(y))
    }

    /// Returns the standing height found by scanning down from `pos`.
    fn scan_down(&self, world: &dyn ColumnQuery, pos: BlockPos) -> Result<i32, UnsafeReason> {
        let floor = world.min_height();
        let mut y = pos.y.min(world.max_height() - 1);
        while y >= floor {
            let material = world.block_at(pos.with_y(y));
            if is_hazardous(material) {
                return Err(UnsafeReason::HazardBelow { material, y });
            }
            if is_solid(material) {
                let target = pos.with_y(y + 1);
                return self.check(world, target).map(|()| target.y);
            }
            y -= 1;
        }
        Err(UnsafeReason::NoFloor)
    }

    /// Checks whether a player may stand with their feet in `pos`.
    ///
    /// # Errors
    ///
    /// Returns the first rule the position breaks.
    pub fn check(&self, world: &dyn ColumnQuery, pos: BlockPos) -> Result<(), UnsafeReason> {
        let material = world.block_at(pos);
        if is_void(material) {
            return Err(UnsafeReason::Void { y: pos.y });
        }
        if is_solid(material) {
            return Err(UnsafeReason::Obstructed { material, y: pos.y });
        }
        if is_hazardous(material) {
            return Err(UnsafeReason::Hazard { material, y: pos.y });
        }

        if self.checks.drowning && material == Material::Water {
            let above = world.block_at(pos.up());
            if above == Material::Water || is_solid(above) {
                return Err(UnsafeReason::Drowning { y: pos.y });
            }
        }
        if self.checks.ground_scan {
            Self::check_ground(world, pos)?;
        }
        if self.checks.surroundings {
            Self::check_surroundings(world, pos)?;
        }
        Ok(())
    }

    fn check_ground(world: &dyn ColumnQuery, pos: BlockPos) -> Result<(), UnsafeReason> {
        let mut y = pos.y - 1;
        while y >= world.min_height() {
            let material = world.block_at(pos.with_y(y));
            if is_hazardous(material) {
                return Err(UnsafeReason::HazardBelow { material, y });
            }
            if is_solid(material) {
                return Ok(());
            }
            y -= 1;
        }
        Err(UnsafeReason::NoFloor)
    }

    fn check_surroundings(world: &dyn ColumnQuery, pos: BlockPos) -> Result<(), UnsafeReason> {
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if world.block_at(pos.offset(dx, dy, dz)) == Material::Lava {
                        return Err(UnsafeReason::LavaNearby { y: pos.y });
                    }
                }
            }
        }

        let exits = [
            pos.offset(1, 0, 0),
            pos.offset(-1, 0, 0),
            pos.offset(0, 0, 1),
            pos.offset(0, 0, -1),
            pos.up(),
        ];
        if exits.iter().all(|p| is_solid(world.block_at(*p))) {
            return Err(UnsafeReason::Enclosed { y: pos.y });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::VoxelWorld;

    /// Stone from the floor to y=62, grass at 63, air above.
    fn plains(x: i32, z: i32) -> VoxelWorld {
        let mut world = VoxelWorld::new("world");
        world.fill_column(x, z, -64, 62, Material::Stone);
        world.set_block(BlockPos::new(x, 63, z), Material::GrassBlock);
        world
    }

    fn at(y: f64) -> Location {
        Location::new("world", 0.5, y, 0.5)
    }

    #[test]
    fn test_safe_candidate_unchanged() {
        let world = plains(0, 0);
        let candidate = at(64.0).facing(12.0, 3.0);
        assert_eq!(SafeLocationResolver::new().resolve(&world, &candidate), Some(candidate));
    }

    #[test]
    fn test_candidate_in_air_high_up_is_accepted() {
        // Step 1 only inspects the candidate block itself.
        let world = plains(0, 0);
        let candidate = at(200.0);
        assert_eq!(SafeLocationResolver::new().resolve(&world, &candidate), Some(candidate));
    }

    #[test]
    fn test_buried_candidate_floats_up() {
        let mut world = plains(0, 0);
        // A pillar over the death location; the top is a torch.
        world.fill_column(0, 0, 64, 70, Material::Stone);
        world.set_block(BlockPos::new(0, 71, 0), Material::Torch);
        let resolved = SafeLocationResolver::new().resolve(&world, &at(65.0)).unwrap();
        assert_eq!(resolved.block_y(), 71);
    }

    #[test]
    fn test_buried_candidate_scan_finds_obstruction() {
        let mut world = plains(0, 0);
        world.fill_column(0, 0, 64, 70, Material::Stone);
        let result = SafeLocationResolver::new().resolve_detailed(&world, &at(65.0));
        assert_eq!(result, Err(UnsafeReason::Obstructed { material: Material::Stone, y: 66 }));
    }

    #[test]
    fn test_candidate_in_lava_scans_to_floor() {
        let mut world = plains(0, 0);
        world.fill_column(0, 0, 64, 65, Material::Lava);
        let result = SafeLocationResolver::new().resolve_detailed(&world, &at(64.0));
        assert_eq!(result, Err(UnsafeReason::HazardBelow { material: Material::Lava, y: 64 }));
    }

    #[test]
    fn test_fire_candidate_with_safe_top() {
        let mut world = plains(0, 0);
        world.set_block(BlockPos::new(0, 64, 0), Material::Fire);
        // Highest block is the fire itself, so the scan decides.
        let result = SafeLocationResolver::new().resolve_detailed(&world, &at(64.0));
        assert_eq!(result, Err(UnsafeReason::HazardBelow { material: Material::Fire, y: 64 }));
    }

    #[test]
    fn test_hazardous_column_below_fails() {
        let mut world = VoxelWorld::new("world");
        world.fill_column(0, 0, -64, 50, Material::MagmaBlock);
        world.fill_column(0, 0, 51, 60, Material::Stone);
        // Candidate inside the stone, highest block is stone, scan hits stone first.
        let result = SafeLocationResolver::new().resolve_detailed(&world, &at(55.0));
        assert!(result.is_err());

        let mut hot = VoxelWorld::new("world");
        hot.fill_column(0, 0, -64, 64, Material::Lava);
        assert_eq!(SafeLocationResolver::new().resolve(&hot, &at(64.0)), None);
    }

    #[test]
    fn test_void_candidate_without_floor() {
        let world = VoxelWorld::new("world");
        let result = SafeLocationResolver::new().resolve_detailed(&world, &at(64.0));
        assert_eq!(result, Err(UnsafeReason::HazardBelow { material: Material::VoidAir, y: 64 }));
    }

    #[test]
    fn test_below_floor_is_no_floor() {
        let world = plains(0, 0);
        let result = SafeLocationResolver::new().resolve_detailed(&world, &at(-80.0));
        assert_eq!(result, Err(UnsafeReason::NoFloor));
    }

    #[test]
    fn test_solid_candidate_under_open_sky() {
        // Death position now filled by a single block with air above.
        let mut world = plains(0, 0);
        world.set_block(BlockPos::new(0, 64, 0), Material::Cobblestone);
        let resolved = SafeLocationResolver::new().resolve(&world, &at(64.0)).unwrap();
        assert_eq!(resolved.block_y(), 65);
        assert!((resolved.x - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drowning_check() {
        let mut world = plains(0, 0);
        world.fill_column(0, 0, 64, 70, Material::Water);
        let candidate = at(64.0);
        assert_eq!(SafeLocationResolver::new().resolve(&world, &candidate), Some(candidate.clone()));

        let strict = SafeLocationResolver::with_checks(SafetyChecks {
            drowning: true,
            ..SafetyChecks::NONE
        });
        assert_eq!(
            strict.check(&world, candidate.block_pos()),
            Err(UnsafeReason::Drowning { y: 64 })
        );
        // Top water block has air above it.
        assert_eq!(strict.check(&world, BlockPos::new(0, 70, 0)), Ok(()));
    }

    #[test]
    fn test_ground_scan_check() {
        let mut world = plains(0, 0);
        world.set_block(BlockPos::new(0, 63, 0), Material::Air);
        world.set_block(BlockPos::new(0, 62, 0), Material::Fire);
        let strict = SafeLocationResolver::with_checks(SafetyChecks {
            ground_scan: true,
            ..SafetyChecks::NONE
        });
        assert_eq!(
            strict.check(&world, BlockPos::new(0, 64, 0)),
            Err(UnsafeReason::HazardBelow { material: Material::Fire, y: 62 })
        );
        assert_eq!(SafeLocationResolver::new().check(&world, BlockPos::new(0, 64, 0)), Ok(()));
    }

    #[test]
    fn test_surroundings_check() {
        let mut world = VoxelWorld::new("world");
        world.fill(BlockPos::new(-1, -64, -1), BlockPos::new(1, 70, 1), Material::Stone);
        world.set_block(BlockPos::new(0, 64, 0), Material::Air);
        let strict = SafeLocationResolver::with_checks(SafetyChecks::ALL);
        assert_eq!(
            strict.check(&world, BlockPos::new(0, 64, 0)),
            Err(UnsafeReason::Enclosed { y: 64 })
        );

        world.set_block(BlockPos::new(1, 64, 1), Material::Lava);
        assert_eq!(
            strict.check(&world, BlockPos::new(0, 64, 0)),
            Err(UnsafeReason::LavaNearby { y: 64 })
        );
    }
}
