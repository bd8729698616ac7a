//! Harness error taxonomy.
//!
//! This module defines the error handling for the harness. It provides:
//! 1. **Error Variants:** One variant per failure domain (config, routing, wire, process, trace, tmux).
//! 2. **Context:** Parse errors carry the offending path and line number.
//! 3. **Integration:** `thiserror`-derived `std::error::Error` with source chaining.

use std::path::PathBuf;

use crate::common::id::TileId;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors produced by the simulation harness.
///
/// Connection-level faults (`Wire`, `LinkClosed`) are contained to the affected
/// tile connection by the switch; everything else propagates to the caller.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// An I/O operation on a named path failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// Path the operation was acting on.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A socket operation failed.
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),

    /// The deployment configuration could not be deserialized.
    #[error("config parse error in {path}: {source}")]
    ConfigParse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// The deployment configuration is structurally valid but inconsistent.
    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    /// A routing-table row could not be parsed.
    #[error("routing table {path}:{line}: {reason}")]
    RoutingParse {
        /// Path of the routing-table file.
        path: PathBuf,
        /// One-based line number of the offending row.
        line: usize,
        /// Description of the fault.
        reason: String,
    },

    /// The routing table is parseable but inconsistent.
    #[error("invalid routing table: {0}")]
    RoutingInvalid(String),

    /// The routing table and deployment config disagree about a tile.
    #[error("routing/config mismatch: {0}")]
    RoutingMismatch(String),

    /// A NoC frame violated the wire format.
    #[error("wire format violation: {0}")]
    Wire(String),

    /// The peer closed the link mid-conversation.
    #[error("link to {0} closed")]
    LinkClosed(TileId),

    /// A tile emulator process could not be spawned.
    #[error("failed to spawn {tile}: {source}")]
    Spawn {
        /// Tile whose emulator failed to start.
        tile: TileId,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// A trace record was malformed.
    #[error("trace parse error at {path}:{line}: {reason}")]
    TraceParse {
        /// Path of the trace/log file.
        path: PathBuf,
        /// One-based line number of the offending record.
        line: usize,
        /// Description of the fault.
        reason: String,
    },

    /// A tmux invocation failed.
    #[error("tmux failed: {0}")]
    Tmux(String),
}
