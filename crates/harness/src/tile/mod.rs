//! Per-tile emulator process model.
//!
//! Each accelerator tile is simulated by an external emulator instance (a QEMU
//! machine model running the tile firmware). This module provides:
//! 1. **Spec:** The merged view of a tile's config entry and its route.
//! 2. **Command:** Pure emulator argv construction, unit-testable without spawning.
//! 3. **Process:** Spawn with log capture, liveness polling, and graceful termination.

/// Emulator command-line construction.
pub mod command;

/// Tile process lifecycle (spawn, poll, terminate).
pub mod process;

pub use command::TileCommand;
pub use process::TileProcess;

use std::path::PathBuf;

use crate::common::id::TileId;
use crate::routing::Endpoint;

/// The merged deployment view of one tile: config entry plus route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSpec {
    /// Global tile identifier.
    pub tile_id: TileId,
    /// Number of emulated CPUs.
    pub cpus: u8,
    /// Firmware image handed to the emulator.
    pub firmware: PathBuf,
    /// NoC endpoint the emulator's character device connects to.
    pub endpoint: Endpoint,
}
