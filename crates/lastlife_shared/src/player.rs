//! Player-facing enums shared between the engine and its hosts.

use serde::{Deserialize, Serialize};

/// How a player interacts with the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GameMode {
    /// Normal play with health and hunger.
    #[default]
    Survival = 0,
    /// Unlimited resources, no damage.
    Creative = 1,
    /// Can interact with entities but not break blocks.
    Adventure = 2,
    /// Free-flying observer. Hardcore hosts put dead players here.
    Spectator = 3,
}

impl GameMode {
    /// Converts from the wire byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Survival),
            1 => Some(Self::Creative),
            2 => Some(Self::Adventure),
            3 => Some(Self::Spectator),
            _ => None,
        }
    }
}
