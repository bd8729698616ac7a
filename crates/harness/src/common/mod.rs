//! Common utilities and types used throughout the simulation harness.
//!
//! This module provides fundamental building blocks shared across all components
//! of the harness. It includes:
//! 1. **Identifier Types:** Strong types for tile, core, and die identifiers.
//! 2. **Coordinates:** Mesh positions of tiles on a die.
//! 3. **Constants:** Wire-format magic numbers, size limits, and timing intervals.
//! 4. **Error Handling:** The crate-wide error taxonomy and result alias.

/// Tile, core, and die identifier types plus mesh coordinates.
pub mod id;

/// Common constants used throughout the harness.
pub mod constants;

/// Error types and the crate-wide result alias.
pub mod error;

pub use error::{HarnessError, Result};
pub use id::{Coord, CoreId, DieId, TileId};
