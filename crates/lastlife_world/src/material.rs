//! # Materials
//!
//! Closed enumeration of every block material the world model stores.
//! Each material has a stable numeric id so chunks can store plain `u16`s.

/// A block material.
///
/// Adding a variant is a breaking change for [`crate::hazard`]: the
/// classifier matches exhaustively and will not compile until the new
/// material is classified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum Material {
    // =========================================================================
    // Empty
    // =========================================================================
    /// Regular air.
    #[default]
    Air = 0,
    /// Air generated inside caves.
    CaveAir = 1,
    /// Absence of world: below the floor or in ungenerated space.
    VoidAir = 2,

    // =========================================================================
    // Terrain
    // =========================================================================
    /// Stone.
    Stone = 10,
    /// Dirt.
    Dirt = 11,
    /// Grass-covered dirt.
    GrassBlock = 12,
    /// Sand.
    Sand = 13,
    /// Gravel.
    Gravel = 14,
    /// Bedrock, the unbreakable bottom layer.
    Bedrock = 15,
    /// Obsidian.
    Obsidian = 16,
    /// Netherrack.
    Netherrack = 17,
    /// End stone.
    EndStone = 18,
    /// Ice.
    Ice = 19,
    /// Full snow block.
    SnowBlock = 20,

    // =========================================================================
    // Building
    // =========================================================================
    /// Log.
    Wood = 30,
    /// Planks.
    Planks = 31,
    /// Leaves.
    Leaves = 32,
    /// Glass.
    Glass = 33,
    /// Cobblestone.
    Cobblestone = 34,

    // =========================================================================
    // Passable decoration
    // =========================================================================
    /// Tall grass.
    TallGrass = 50,
    /// Flower.
    Flower = 51,
    /// Torch.
    Torch = 52,
    /// Thin snow layer on top of another block.
    SnowLayer = 53,
    /// Ladder.
    Ladder = 54,
    /// Vines.
    Vine = 55,
    /// Cobweb.
    Cobweb = 56,

    // =========================================================================
    // Fluids
    // =========================================================================
    /// Water.
    Water = 70,
    /// Lava.
    Lava = 71,

    // =========================================================================
    // Dangerous
    // =========================================================================
    /// Fire.
    Fire = 90,
    /// Soul fire.
    SoulFire = 91,
    /// Campfire.
    Campfire = 92,
    /// Soul campfire.
    SoulCampfire = 93,
    /// Magma block.
    MagmaBlock = 94,
    /// Cactus.
    Cactus = 95,
}

impl Material {
    /// Every material, in id order.
    pub const ALL: [Self; 34] = [
        Self::Air,
        Self::CaveAir,
        Self::VoidAir,
        Self::Stone,
        Self::Dirt,
        Self::GrassBlock,
        Self::Sand,
        Self::Gravel,
        Self::Bedrock,
        Self::Obsidian,
        Self::Netherrack,
        Self::EndStone,
        Self::Ice,
        Self::SnowBlock,
        Self::Wood,
        Self::Planks,
        Self::Leaves,
        Self::Glass,
        Self::Cobblestone,
        Self::TallGrass,
        Self::Flower,
        Self::Torch,
        Self::SnowLayer,
        Self::Ladder,
        Self::Vine,
        Self::Cobweb,
        Self::Water,
        Self::Lava,
        Self::Fire,
        Self::SoulFire,
        Self::Campfire,
        Self::SoulCampfire,
        Self::MagmaBlock,
        Self::Cactus,
    ];

    /// Returns the stable numeric id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u16 {
        self as u16
    }

    /// Looks a material up by id.
    #[must_use]
    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.id() == id)
    }

    /// Returns true for the three kinds of air.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Air | Self::CaveAir | Self::VoidAir)
    }

    /// Returns true for water and lava.
    #[inline]
    #[must_use]
    pub const fn is_liquid(self) -> bool {
        matches!(self, Self::Water | Self::Lava)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique_and_reversible() {
        for (i, a) in Material::ALL.iter().enumerate() {
            assert_eq!(Material::from_id(a.id()), Some(*a));
            for b in &Material::ALL[i + 1..] {
                assert_ne!(a.id(), b.id(), "{a:?} and {b:?} share an id");
            }
        }
    }

    #[test]
    fn test_all_sorted_by_id() {
        assert!(Material::ALL.windows(2).all(|w| w[0].id() < w[1].id()));
    }

    #[test]
    fn test_unknown_id() {
        assert_eq!(Material::from_id(9999), None);
    }

    #[test]
    fn test_empty_kinds() {
        assert!(Material::Air.is_empty());
        assert!(Material::VoidAir.is_empty());
        assert!(!Material::TallGrass.is_empty());
        assert!(Material::Lava.is_liquid());
    }
}
