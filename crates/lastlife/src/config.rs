//! # Engine Configuration
//!
//! Loaded from TOML at startup and on `reload`. Every key is optional;
//! a missing file or section falls back to defaults.
//!
//! ```toml
//! [death_ban]
//! enabled_on_non_hardcore = false
//! punished_worlds = []          # empty: every world
//!
//! [revive]
//! restore_inventory = true
//! teleport_to_death_location = true
//! ghost_ticks = 600
//!
//! [revive.safety_checks]
//! ground_scan = false
//! drowning = false
//! surroundings = false
//!
//! [ban]
//! integration = "builtin"       # or "layout"
//! layout = "Hardcore_death"
//!
//! [storage]
//! data_dir = "lastlife/players"
//! ```

use std::path::{Path, PathBuf};

use lastlife_shared::{GHOST_DURATION_TICKS, TICK_RATE};
use lastlife_world::SafetyChecks;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::record::ReviveOptions;

/// Longest allowed ghost state: one hour.
pub const MAX_GHOST_TICKS: u32 = 3600 * TICK_RATE;

/// Top-level engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// When and where deaths are punished.
    pub death_ban: DeathBanConfig,
    /// Revive defaults.
    pub revive: ReviveConfig,
    /// How bans are issued.
    pub ban: BanConfig,
    /// Where player records live.
    pub storage: StorageConfig,
}

/// When and where deaths are punished.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathBanConfig {
    /// Punish deaths even when the host is not in hardcore mode.
    pub enabled_on_non_hardcore: bool,
    /// Worlds where deaths are punished. Empty means every world.
    pub punished_worlds: Vec<String>,
}

/// Revive defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviveConfig {
    /// Give back the inventory captured at death.
    pub restore_inventory: bool,
    /// Teleport to a safe spot near the death location.
    pub teleport_to_death_location: bool,
    /// Ticks of ghost state after a successful teleport.
    pub ghost_ticks: u32,
    /// Stricter teleport safety rules.
    pub safety_checks: SafetyChecksConfig,
}

impl Default for ReviveConfig {
    fn default() -> Self {
        Self {
            restore_inventory: true,
            teleport_to_death_location: true,
            ghost_ticks: GHOST_DURATION_TICKS,
            safety_checks: SafetyChecksConfig::default(),
        }
    }
}

/// Stricter teleport safety rules, all off by default.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyChecksConfig {
    /// Nothing hazardous between the feet and the floor.
    pub ground_scan: bool,
    /// No water with water or a solid block above.
    pub drowning: bool,
    /// No lava within one block; not walled in.
    pub surroundings: bool,
}

impl From<SafetyChecksConfig> for SafetyChecks {
    fn from(config: SafetyChecksConfig) -> Self {
        Self {
            ground_scan: config.ground_scan,
            drowning: config.drowning,
            surroundings: config.surroundings,
        }
    }
}

/// Which ban command the access-control collaborator is asked for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BanIntegration {
    /// Plain ban with the localized death reason.
    #[default]
    Builtin,
    /// Ban through a named message layout, when the collaborator has it.
    Layout,
}

/// How bans are issued.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BanConfig {
    /// Which ban command to use.
    pub integration: BanIntegration,
    /// Layout name for [`BanIntegration::Layout`].
    pub layout: String,
}

impl Default for BanConfig {
    fn default() -> Self {
        Self {
            integration: BanIntegration::Builtin,
            layout: "Hardcore_death".to_owned(),
        }
    }
}

/// Where player records live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory of the file store.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("lastlife/players"),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::Invalid` for out-of-range values.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or
    /// validated.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.revive.ghost_ticks > MAX_GHOST_TICKS {
            return Err(ConfigError::Invalid(format!(
                "revive.ghost_ticks = {} exceeds {MAX_GHOST_TICKS}",
                self.revive.ghost_ticks
            )));
        }
        if self.ban.integration == BanIntegration::Layout && self.ban.layout.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "ban.layout must be set when ban.integration = \"layout\"".to_owned(),
            ));
        }
        if self.death_ban.punished_worlds.iter().any(|w| w.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "death_ban.punished_worlds contains an empty name".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns true if deaths in `world` are punished.
    #[must_use]
    pub fn is_punished_world(&self, world: &str) -> bool {
        self.death_ban.punished_worlds.is_empty()
            || self.death_ban.punished_worlds.iter().any(|w| w == world)
    }

    /// Options a revive request gets when the caller gives none.
    #[must_use]
    pub const fn default_revive_options(&self) -> ReviveOptions {
        ReviveOptions {
            restore_inventory: self.revive.restore_inventory,
            teleport_to_death_location: self.revive.teleport_to_death_location,
        }
    }
}
