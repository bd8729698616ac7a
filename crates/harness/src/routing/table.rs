//! Routing table structure and CSV parser.
//!
//! The table is a plain CSV file with the header `tile_id,die,x,y,host,port`
//! and one row per tile:
//!
//! ```csv
//! tile_id,die,x,y,host,port
//! 0,0,0,0,127.0.0.1,6000
//! 1,0,1,0,127.0.0.1,6001
//! ```
//!
//! Blank lines and `#` comment lines are skipped. The header row is required;
//! a `#`-prefixed header is also accepted.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::common::constants::DIE_CROSSING_HOPS;
use crate::common::error::{HarnessError, Result};
use crate::common::id::{Coord, DieId, TileId};
use crate::config::Config;

/// Expected CSV header columns, in order.
const HEADER: [&str; 6] = ["tile_id", "die", "x", "y", "host", "port"];

/// A socket endpoint a tile's NoC character device connects through.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    /// Renders the endpoint as `host:port` for `TcpStream::connect`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One row of the routing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// Global tile identifier.
    pub tile_id: TileId,
    /// Die the tile sits on.
    pub die: DieId,
    /// Mesh position on the die.
    pub coord: Coord,
    /// Socket endpoint for this tile's NoC link.
    pub endpoint: Endpoint,
}

/// The parsed routing table.
///
/// Entries keep file order; lookups by tile id go through an index map.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    entries: Vec<RouteEntry>,
    by_tile: HashMap<TileId, usize>,
}

impl RoutingTable {
    /// Reads and validates a routing table file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the CSV routing table.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Io` if the file cannot be opened,
    /// `HarnessError::RoutingParse` with line context on a malformed row, and
    /// `HarnessError::RoutingInvalid` on duplicate entries.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file), path)
    }

    /// Parses and validates a routing table from any reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - Source of CSV text.
    /// * `path` - Path used in error messages.
    ///
    /// # Errors
    ///
    /// Same as [`RoutingTable::from_path`], minus the open failure.
    pub fn from_reader<R: Read>(reader: BufReader<R>, path: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        let mut header_seen = false;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|source| HarnessError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if !header_seen {
                let candidate = trimmed.trim_start_matches('#').trim();
                if is_header(candidate) {
                    header_seen = true;
                    continue;
                }
                return Err(parse_err(
                    path,
                    line_no,
                    format!("expected header `{}`", HEADER.join(",")),
                ));
            }

            if trimmed.starts_with('#') {
                continue;
            }

            entries.push(parse_row(trimmed, path, line_no)?);
        }

        if !header_seen {
            return Err(parse_err(path, 1, "empty routing table".to_string()));
        }

        let table = Self::from_entries(entries)?;
        Ok(table)
    }

    /// Builds a table from pre-parsed entries, running duplicate validation.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::RoutingInvalid` on duplicate tile id, endpoint,
    /// or die position.
    pub fn from_entries(entries: Vec<RouteEntry>) -> Result<Self> {
        let mut by_tile = HashMap::new();
        let mut endpoints = HashMap::new();
        let mut positions = HashMap::new();

        for (i, entry) in entries.iter().enumerate() {
            if by_tile.insert(entry.tile_id, i).is_some() {
                return Err(HarnessError::RoutingInvalid(format!(
                    "duplicate {}",
                    entry.tile_id
                )));
            }
            // Port 0 requests an ephemeral port, so it cannot collide.
            if entry.endpoint.port != 0 {
                if let Some(prev) = endpoints.insert(entry.endpoint.clone(), entry.tile_id) {
                    return Err(HarnessError::RoutingInvalid(format!(
                        "endpoint {} assigned to both {} and {}",
                        entry.endpoint, prev, entry.tile_id
                    )));
                }
            }
            if let Some(prev) = positions.insert((entry.die, entry.coord), entry.tile_id) {
                return Err(HarnessError::RoutingInvalid(format!(
                    "{} {} occupied by both {} and {}",
                    entry.die, entry.coord, prev, entry.tile_id
                )));
            }
        }

        Ok(Self { entries, by_tile })
    }

    /// Finds the route entry for a tile.
    pub fn lookup(&self, tile: TileId) -> Option<&RouteEntry> {
        self.by_tile.get(&tile).map(|&i| &self.entries[i])
    }

    /// Finds the socket endpoint for a tile.
    pub fn endpoint_of(&self, tile: TileId) -> Option<&Endpoint> {
        self.lookup(tile).map(|e| &e.endpoint)
    }

    /// Iterates entries in file order.
    pub fn tiles(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    /// Returns the number of routed tiles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Estimates the hop count between two tiles.
    ///
    /// Same-die distance is the Manhattan distance between mesh positions;
    /// crossing a die boundary charges a fixed extra hop.
    ///
    /// # Returns
    ///
    /// `Some(hops)`, or `None` if either tile is unrouted.
    pub fn manhattan_distance(&self, a: TileId, b: TileId) -> Option<u32> {
        let ea = self.lookup(a)?;
        let eb = self.lookup(b)?;
        let mut hops = ea.coord.manhattan(eb.coord);
        if ea.die != eb.die {
            hops += DIE_CROSSING_HOPS;
        }
        Some(hops)
    }

    /// Cross-checks the table against a deployment configuration.
    ///
    /// Every configured tile must have a route, every routed tile must be
    /// configured, and the configured port must agree with the routed endpoint.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::RoutingMismatch` naming the first disagreement.
    pub fn check_against(&self, config: &Config) -> Result<()> {
        for tile in &config.deployment.tiles {
            let entry = self.lookup(tile.tile_id).ok_or_else(|| {
                HarnessError::RoutingMismatch(format!("{} configured but unrouted", tile.tile_id))
            })?;
            if entry.endpoint.port != tile.port {
                return Err(HarnessError::RoutingMismatch(format!(
                    "{} routed to port {} but configured on port {}",
                    tile.tile_id, entry.endpoint.port, tile.port
                )));
            }
        }
        let configured: std::collections::HashSet<TileId> =
            config.tile_ids().into_iter().collect();
        for entry in &self.entries {
            if !configured.contains(&entry.tile_id) {
                return Err(HarnessError::RoutingMismatch(format!(
                    "{} routed but not configured",
                    entry.tile_id
                )));
            }
        }
        Ok(())
    }
}

/// Checks whether a line matches the expected header.
fn is_header(line: &str) -> bool {
    let cols: Vec<&str> = line.split(',').map(str::trim).collect();
    cols == HEADER
}

fn parse_err(path: &Path, line: usize, reason: String) -> HarnessError {
    HarnessError::RoutingParse {
        path: path.to_path_buf(),
        line,
        reason,
    }
}

/// Parses one data row into a `RouteEntry`.
fn parse_row(row: &str, path: &Path, line_no: usize) -> Result<RouteEntry> {
    let cols: Vec<&str> = row.split(',').map(str::trim).collect();
    if cols.len() != HEADER.len() {
        return Err(parse_err(
            path,
            line_no,
            format!("expected {} columns, found {}", HEADER.len(), cols.len()),
        ));
    }

    let tile_id = parse_field::<u16>(cols[0], "tile_id", path, line_no)?;
    let die = parse_field::<u8>(cols[1], "die", path, line_no)?;
    let x = parse_field::<u16>(cols[2], "x", path, line_no)?;
    let y = parse_field::<u16>(cols[3], "y", path, line_no)?;
    let host = cols[4];
    if host.is_empty() {
        return Err(parse_err(path, line_no, "empty host".to_string()));
    }
    let port = parse_field::<u16>(cols[5], "port", path, line_no)?;

    Ok(RouteEntry {
        tile_id: TileId::new(tile_id),
        die: DieId::new(die),
        coord: Coord::new(x, y),
        endpoint: Endpoint {
            host: host.to_string(),
            port,
        },
    })
}

fn parse_field<T: std::str::FromStr>(
    raw: &str,
    name: &str,
    path: &Path,
    line_no: usize,
) -> Result<T> {
    raw.parse()
        .map_err(|_| parse_err(path, line_no, format!("bad {name} `{raw}`")))
}
