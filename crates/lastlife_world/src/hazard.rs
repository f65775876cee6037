//! # Hazard Classifier
//!
//! Three pure, total predicates over [`Material`]:
//!
//! | predicate | meaning |
//! |---|---|
//! | [`is_hazardous`] | standing in or on it hurts or kills |
//! | [`is_solid`] | a player placed inside it would suffocate |
//! | [`is_void`] | there is no world here at all |
//!
//! Every match lists every material. No wildcard arms.

use crate::material::Material;

/// Returns true if a player in or directly above this material takes damage.
///
/// Hazardous: open flame, molten rock, combustion blocks, cactus and the void.
#[must_use]
pub const fn is_hazardous(material: Material) -> bool {
    match material {
        Material::Lava
        | Material::Fire
        | Material::SoulFire
        | Material::Campfire
        | Material::SoulCampfire
        | Material::MagmaBlock
        | Material::Cactus
        | Material::VoidAir => true,

        Material::Air
        | Material::CaveAir
        | Material::Stone
        | Material::Dirt
        | Material::GrassBlock
        | Material::Sand
        | Material::Gravel
        | Material::Bedrock
        | Material::Obsidian
        | Material::Netherrack
        | Material::EndStone
        | Material::Ice
        | Material::SnowBlock
        | Material::Wood
        | Material::Planks
        | Material::Leaves
        | Material::Glass
        | Material::Cobblestone
        | Material::TallGrass
        | Material::Flower
        | Material::Torch
        | Material::SnowLayer
        | Material::Ladder
        | Material::Vine
        | Material::Cobweb
        | Material::Water => false,
    }
}

/// Returns true if the material fills its block and stops movement.
#[must_use]
pub const fn is_solid(material: Material) -> bool {
    match material {
        Material::Stone
        | Material::Dirt
        | Material::GrassBlock
        | Material::Sand
        | Material::Gravel
        | Material::Bedrock
        | Material::Obsidian
        | Material::Netherrack
        | Material::EndStone
        | Material::Ice
        | Material::SnowBlock
        | Material::Wood
        | Material::Planks
        | Material::Leaves
        | Material::Glass
        | Material::Cobblestone
        | Material::Campfire
        | Material::SoulCampfire
        | Material::MagmaBlock
        | Material::Cactus => true,

        Material::Air
        | Material::CaveAir
        | Material::VoidAir
        | Material::TallGrass
        | Material::Flower
        | Material::Torch
        | Material::SnowLayer
        | Material::Ladder
        | Material::Vine
        | Material::Cobweb
        | Material::Water
        | Material::Lava
        | Material::Fire
        | Material::SoulFire => false,
    }
}

/// Returns true only for the absence of world.
#[must_use]
pub const fn is_void(material: Material) -> bool {
    match material {
        Material::VoidAir => true,

        Material::Air
        | Material::CaveAir
        | Material::Stone
        | Material::Dirt
        | Material::GrassBlock
        | Material::Sand
        | Material::Gravel
        | Material::Bedrock
        | Material::Obsidian
        | Material::Netherrack
        | Material::EndStone
        | Material::Ice
        | Material::SnowBlock
        | Material::Wood
        | Material::Planks
        | Material::Leaves
        | Material::Glass
        | Material::Cobblestone
        | Material::TallGrass
        | Material::Flower
        | Material::Torch
        | Material::SnowLayer
        | Material::Ladder
        | Material::Vine
        | Material::Cobweb
        | Material::Water
        | Material::Lava
        | Material::Fire
        | Material::SoulFire
        | Material::Campfire
        | Material::SoulCampfire
        | Material::MagmaBlock
        | Material::Cactus => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hazard_set() {
        let hazards: Vec<Material> = Material::ALL
            .iter()
            .copied()
            .filter(|m| is_hazardous(*m))
            .collect();
        assert_eq!(
            hazards,
            vec![
                Material::VoidAir,
                Material::Lava,
                Material::Fire,
                Material::SoulFire,
                Material::Campfire,
                Material::SoulCampfire,
                Material::MagmaBlock,
                Material::Cactus,
            ]
        );
    }

    #[test]
    fn test_only_void_air_is_void() {
        for material in Material::ALL {
            assert_eq!(is_void(material), material == Material::VoidAir);
        }
    }

    #[test]
    fn test_empty_and_fluids_not_solid() {
        for material in Material::ALL {
            if material.is_empty() || material.is_liquid() {
                assert!(!is_solid(material), "{material:?} should not be solid");
            }
        }
    }

    #[test]
    fn test_water_is_safe() {
        assert!(!is_hazardous(Material::Water));
        assert!(!is_solid(Material::Water));
    }

    #[test]
    fn test_solid_hazards() {
        assert!(is_solid(Material::MagmaBlock) && is_hazardous(Material::MagmaBlock));
        assert!(is_solid(Material::Cactus) && is_hazardous(Material::Cactus));
        assert!(!is_solid(Material::Fire) && is_hazardous(Material::Fire));
    }
}
