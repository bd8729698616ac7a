//! Multi-tile accelerator functional-simulation harness.
//!
//! This crate implements the host-side harness for a behavioral multi-tile
//! accelerator simulation with the following:
//! 1. **Config:** JSON deployment configuration (tiles, firmware, ports, tmux layout).
//! 2. **Routing:** CSV routing table mapping tiles to die/mesh positions and socket endpoints.
//! 3. **NoC:** Framed packet wire format and a TCP switch routing frames between tiles.
//! 4. **Tile:** Per-tile emulator command construction and process supervision.
//! 5. **Cluster:** Assembly and orchestration (launch, supervise, tmux panes, shutdown).
//! 6. **Trace:** Line-oriented trace record parsing, span pairing, and Perfetto JSON export.

/// Common types and constants (identifiers, coordinates, errors).
pub mod common;
/// Deployment configuration (defaults, structures, validation).
pub mod config;
/// Cluster assembly and orchestration (builder, supervisor, tmux).
pub mod cluster;
/// Network-on-chip emulation (packet format, switch, tile link).
pub mod noc;
/// Routing table parsing and lookup.
pub mod routing;
/// Harness statistics collection and reporting.
pub mod stats;
/// Per-tile emulator process model.
pub mod tile;
/// Trace record parsing, span pairing, and Perfetto export.
pub mod trace;

/// Root configuration type; use `Config::from_path` or deserialize from JSON.
pub use crate::config::Config;
/// Crate-wide error type; all fallible harness operations return it.
pub use crate::common::error::HarnessError;
/// Crate-wide result alias.
pub use crate::common::error::Result;
/// Top-level cluster type; construct with `Cluster::build`.
pub use crate::cluster::Cluster;
