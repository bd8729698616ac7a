//! # Unit Components
//!
//! This module serves as the central hub for the harness unit tests. It
//! organizes the fundamental building blocks under test: identifiers,
//! configuration, routing, the NoC switch, per-tile processes, cluster
//! orchestration, and trace processing.


/// Unit tests for configuration deserialization, defaults, and validation.
pub mod config;


/// Unit tests for the NoC wire format and switch.
///
/// This module aggregates tests for:
/// - Frame header encoding and decoding.
/// - Frame stream reading, including truncation and control frames.
/// - Live switch forwarding over localhost sockets.
pub mod noc;

/// Unit tests for per-tile emulator command construction and processes.
pub mod tile;



/// Unit tests for run statistics accumulation.
pub mod stats;
