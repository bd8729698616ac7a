//! Configuration system for the simulation harness.
//!
//! This module defines all configuration structures used to parameterize a
//! deployment. It provides:
//! 1. **Defaults:** Baseline constants (bind host, switch port, payload cap, trace scaling).
//! 2. **Structures:** Hierarchical config for deployment, switch, and trace export.
//! 3. **Validation:** Duplicate/zero/empty checks beyond what serde can express.
//!
//! Configuration is supplied as a JSON file:
//!
//! ```json
//! {
//!     "tmux_split": true,
//!     "routing_table": "routing.csv",
//!     "deployment": {
//!         "host": "127.0.0.1",
//!         "tiles": [
//!             { "tile_id": 0, "port": 6000, "firmware": "fw/tile0.elf", "cpus": 2 },
//!             { "tile_id": 1, "port": 6001, "firmware": "fw/tile1.elf" }
//!         ]
//!     }
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::constants;
use crate::common::error::{HarnessError, Result};
use crate::common::id::TileId;

/// Default configuration constants for the harness.
///
/// These values define the baseline deployment when not explicitly overridden
/// in the JSON configuration file.
mod defaults {
    /// Default host tiles and the switch bind to.
    pub const HOST: &str = "127.0.0.1";

    /// Default number of emulated CPUs per tile.
    pub const CPUS: u8 = 1;

    /// Default emulator binary launched per tile.
    pub const EMULATOR: &str = "qemu-system-riscv64";

    /// Default emulator machine model.
    pub const MACHINE: &str = "tile-fn";

    /// Default directory for per-tile log capture.
    pub const LOG_DIR: &str = "logs";

    /// Default Perfetto JSON output path.
    pub const TRACE_OUT: &str = "trace.json";
}

/// Root configuration structure for a deployment.
///
/// # Examples
///
/// ```
/// use nocsim_core::config::Config;
///
/// let json = r#"{
///     "routing_table": "routing.csv",
///     "deployment": {
///         "tiles": [
///             { "tile_id": 0, "port": 6000, "firmware": "fw/tile0.elf" }
///         ]
///     }
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert!(!config.tmux_split);
/// assert_eq!(config.deployment.tiles[0].cpus, 1);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Lay tiles out as tmux panes instead of plain background processes.
    #[serde(default)]
    pub tmux_split: bool,

    /// Path to the CSV routing table, relative to the config file's directory.
    pub routing_table: PathBuf,

    /// Per-tile deployment description.
    pub deployment: DeploymentConfig,

    /// NoC switch settings.
    #[serde(default)]
    pub switch: SwitchConfig,

    /// Trace collection and export settings.
    #[serde(default)]
    pub trace: TraceConfig,
}

/// Deployment description: which tiles run where.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentConfig {
    /// Host the tile emulators connect to.
    #[serde(default = "DeploymentConfig::default_host")]
    pub host: String,

    /// Tiles to launch.
    pub tiles: Vec<TileConfig>,
}

impl DeploymentConfig {
    /// Returns the default deployment host.
    fn default_host() -> String {
        defaults::HOST.to_string()
    }
}

/// A single tile's deployment entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileConfig {
    /// Global tile identifier.
    pub tile_id: TileId,

    /// TCP port this tile's NoC character device connects through.
    pub port: u16,

    /// Firmware image handed to the emulator (`-kernel`).
    pub firmware: PathBuf,

    /// Number of emulated CPUs (`-smp`).
    #[serde(default = "TileConfig::default_cpus")]
    pub cpus: u8,
}

impl TileConfig {
    /// Returns the default per-tile CPU count.
    fn default_cpus() -> u8 {
        defaults::CPUS
    }
}

/// NoC switch settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchConfig {
    /// Host the per-tile switch listeners bind to.
    #[serde(default = "SwitchConfig::default_bind_host")]
    pub bind_host: String,

    /// Maximum accepted frame payload in bytes.
    #[serde(default = "SwitchConfig::default_max_payload")]
    pub max_payload: u32,
}

impl SwitchConfig {
    /// Returns the default switch bind host.
    fn default_bind_host() -> String {
        defaults::HOST.to_string()
    }

    /// Returns the default payload cap in bytes.
    fn default_max_payload() -> u32 {
        constants::DEFAULT_MAX_PAYLOAD
    }
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            bind_host: Self::default_bind_host(),
            max_payload: Self::default_max_payload(),
        }
    }
}

/// Trace collection and export settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceConfig {
    /// Perfetto JSON output path.
    #[serde(default = "TraceConfig::default_out")]
    pub out: PathBuf,

    /// Cycles per microsecond used to scale trace timestamps.
    #[serde(default = "TraceConfig::default_cycles_per_us")]
    pub cycles_per_us: u64,
}

impl TraceConfig {
    /// Returns the default Perfetto output path.
    fn default_out() -> PathBuf {
        PathBuf::from(defaults::TRACE_OUT)
    }

    /// Returns the default cycles-per-microsecond ratio.
    fn default_cycles_per_us() -> u64 {
        constants::DEFAULT_CYCLES_PER_US
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            out: Self::default_out(),
            cycles_per_us: Self::default_cycles_per_us(),
        }
    }
}

impl Config {
    /// Reads and validates a configuration file.
    ///
    /// Relative paths inside the config (`routing_table`) are resolved against
    /// the config file's parent directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Io` if the file cannot be read,
    /// `HarnessError::ConfigParse` on malformed JSON, and
    /// `HarnessError::ConfigInvalid` on validation failure.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_json::from_str(&text).map_err(|source| HarnessError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        if config.routing_table.is_relative() {
            if let Some(dir) = path.parent() {
                config.routing_table = dir.join(&config.routing_table);
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::ConfigParse` on malformed JSON and
    /// `HarnessError::ConfigInvalid` on validation failure.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|source| HarnessError::ConfigParse {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks deployment consistency beyond what serde enforces.
    ///
    /// Rejects: empty tile list, duplicate tile ids, duplicate ports, zero
    /// CPU counts, and empty firmware paths.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::ConfigInvalid` naming the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.deployment.tiles.is_empty() {
            return Err(HarnessError::ConfigInvalid(
                "deployment.tiles is empty".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        let mut ports = HashSet::new();
        for tile in &self.deployment.tiles {
            if !ids.insert(tile.tile_id) {
                return Err(HarnessError::ConfigInvalid(format!(
                    "duplicate tile_id {}",
                    tile.tile_id.val()
                )));
            }
            if !ports.insert(tile.port) {
                return Err(HarnessError::ConfigInvalid(format!(
                    "duplicate port {} ({})",
                    tile.port, tile.tile_id
                )));
            }
            if tile.cpus == 0 {
                return Err(HarnessError::ConfigInvalid(format!(
                    "{} has cpus = 0",
                    tile.tile_id
                )));
            }
            if tile.firmware.as_os_str().is_empty() {
                return Err(HarnessError::ConfigInvalid(format!(
                    "{} has an empty firmware path",
                    tile.tile_id
                )));
            }
        }

        Ok(())
    }

    /// Returns the configured tile ids in declaration order.
    pub fn tile_ids(&self) -> Vec<TileId> {
        self.deployment.tiles.iter().map(|t| t.tile_id).collect()
    }

    /// Returns the default emulator binary name.
    pub fn default_emulator() -> &'static str {
        defaults::EMULATOR
    }

    /// Returns the default emulator machine model.
    pub fn default_machine() -> &'static str {
        defaults::MACHINE
    }

    /// Returns the default log directory.
    pub fn default_log_dir() -> &'static str {
        defaults::LOG_DIR
    }
}
