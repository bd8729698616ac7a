//! Routing table for the emulated NoC.
//!
//! This module parses and queries the CSV routing table that drives the socket
//! interconnect. It provides:
//! 1. **Parsing:** Strict line-by-line CSV parsing with per-line error context.
//! 2. **Lookup:** Route entries by tile id, endpoints for connection setup.
//! 3. **Validation:** Duplicate tile/endpoint/position detection and config cross-checks.
//! 4. **Distance:** Manhattan hop estimates between tiles for stats reporting.

/// Routing table structure and CSV parser.
pub mod table;

pub use table::{Endpoint, RouteEntry, RoutingTable};
