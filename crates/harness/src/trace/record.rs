//! Trace record grammar and log reader.
//!
//! A trace record is one line of firmware console output:
//!
//! ```text
//! TS:<cycles> T:<tile> C:<core> PERFETTO_TAG_BEGIN:<label>
//! TS:<cycles> T:<tile> C:<core> PERFETTO_TAG_END:<label>
//! ```
//!
//! Fields are space-separated and ordered. Firmware consoles interleave
//! ordinary output with trace records, so the reader skips any line that does
//! not start with `TS:`; a line that does start with `TS:` and then violates
//! the grammar is an error with file/line context.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::common::error::{HarnessError, Result};
use crate::common::id::{CoreId, TileId};

/// BEGIN or END marker of a trace record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMark {
    /// Opens a span.
    Begin,
    /// Closes the innermost open span with the same label.
    End,
}

/// One parsed trace record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    /// Timestamp in tile clock cycles.
    pub ts: u64,
    /// Emitting tile.
    pub tile: TileId,
    /// Emitting core within the tile.
    pub core: CoreId,
    /// BEGIN or END.
    pub mark: TagMark,
    /// Span label.
    pub label: String,
}

impl TraceRecord {
    /// Returns whether a log line is a trace record candidate.
    pub fn is_candidate(line: &str) -> bool {
        line.trim_start().starts_with("TS:")
    }

    /// Parses a candidate line.
    ///
    /// # Errors
    ///
    /// Returns a description of the first grammar violation; the caller adds
    /// file and line context.
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let mut fields = line.split_whitespace();

        let ts = prefixed(fields.next(), "TS:")?;
        let ts: u64 = ts.parse().map_err(|_| format!("bad cycle count `{ts}`"))?;

        let tile = prefixed(fields.next(), "T:")?;
        let tile: u16 = tile.parse().map_err(|_| format!("bad tile id `{tile}`"))?;

        let core = prefixed(fields.next(), "C:")?;
        let core: u8 = core.parse().map_err(|_| format!("bad core id `{core}`"))?;

        let tag = fields.next().ok_or("missing PERFETTO_TAG field")?;
        let (mark, label) = if let Some(label) = tag.strip_prefix("PERFETTO_TAG_BEGIN:") {
            (TagMark::Begin, label)
        } else if let Some(label) = tag.strip_prefix("PERFETTO_TAG_END:") {
            (TagMark::End, label)
        } else {
            return Err(format!("bad tag field `{tag}`"));
        };
        if label.is_empty() {
            return Err("empty label".to_string());
        }

        if let Some(extra) = fields.next() {
            return Err(format!("trailing field `{extra}`"));
        }

        Ok(Self {
            ts,
            tile: TileId::new(tile),
            core: CoreId::new(core),
            mark,
            label: label.to_string(),
        })
    }
}

/// Checks a field for its prefix and strips it.
fn prefixed<'a>(field: Option<&'a str>, prefix: &str) -> std::result::Result<&'a str, String> {
    let field = field.ok_or_else(|| format!("missing {prefix} field"))?;
    field
        .strip_prefix(prefix)
        .ok_or_else(|| format!("expected {prefix} prefix, found `{field}`"))
}

/// Iterator over the trace records of one log file.
///
/// Non-trace lines are skipped; malformed trace records yield an error with
/// path and line number.
#[derive(Debug)]
pub struct TraceReader {
    lines: Lines<BufReader<File>>,
    path: PathBuf,
    line_no: usize,
}

impl TraceReader {
    /// Opens a tile log for trace extraction.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Io` if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            path: path.to_path_buf(),
            line_no: 0,
        })
    }
}

impl Iterator for TraceReader {
    type Item = Result<TraceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(source) => {
                    return Some(Err(HarnessError::Io {
                        path: self.path.clone(),
                        source,
                    }));
                }
            };
            self.line_no += 1;
            if !TraceRecord::is_candidate(&line) {
                continue;
            }
            return Some(TraceRecord::parse(&line).map_err(|reason| {
                HarnessError::TraceParse {
                    path: self.path.clone(),
                    line: self.line_no,
                    reason,
                }
            }));
        }
    }
}
