//! Tile, core, and die identifier types.
//!
//! This module defines strong types for the identifiers that appear throughout
//! the harness to prevent accidental mixing. It provides the following:
//! 1. **Type Safety:** Distinguishes tile, core, and die identifiers at compile time.
//! 2. **Coordinates:** Mesh positions of tiles on a die, with distance helpers.
//! 3. **Serde Integration:** Transparent (de)serialization as plain integers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a tile in the accelerator fabric.
///
/// Tile identifiers are global across dies; the routing table maps each one to
/// a die, a mesh position, and a socket endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u16);

/// Identifier of a core within a tile.
///
/// Core identifiers are local to their tile; trace records carry them so spans
/// from different cores of the same tile land on separate Perfetto tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoreId(pub u8);

/// Identifier of a die in a multi-die package.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DieId(pub u8);

/// Mesh position of a tile on its die.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Coord {
    /// Column within the die mesh.
    pub x: u16,
    /// Row within the die mesh.
    pub y: u16,
}

impl TileId {
    /// Creates a new tile identifier from a raw value.
    #[inline(always)]
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[inline(always)]
    pub fn val(self) -> u16 {
        self.0
    }
}

impl CoreId {
    /// Creates a new core identifier from a raw value.
    #[inline(always)]
    pub fn new(id: u8) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[inline(always)]
    pub fn val(self) -> u8 {
        self.0
    }
}

impl DieId {
    /// Creates a new die identifier from a raw value.
    #[inline(always)]
    pub fn new(id: u8) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[inline(always)]
    pub fn val(self) -> u8 {
        self.0
    }
}

impl Coord {
    /// Creates a mesh coordinate from column and row.
    #[inline(always)]
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Returns the Manhattan distance to another coordinate on the same die.
    ///
    /// # Arguments
    ///
    /// * `other` - The destination coordinate.
    ///
    /// # Returns
    ///
    /// The hop count `|dx| + |dy|` under dimension-ordered routing.
    pub fn manhattan(self, other: Self) -> u32 {
        let dx = u32::from(self.x.abs_diff(other.x));
        let dy = u32::from(self.y.abs_diff(other.y));
        dx + dy
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile{}", self.0)
    }
}

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "core{}", self.0)
    }
}

impl fmt::Display for DieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "die{}", self.0)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}
