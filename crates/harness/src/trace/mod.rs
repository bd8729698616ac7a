//! Trace collection: record parsing, span pairing, Perfetto export.
//!
//! Tile firmware emits line-oriented trace records on its console, which the
//! harness captures to per-tile logs. This module turns those logs into a
//! Perfetto-loadable timeline. It provides:
//! 1. **Records:** The `TS:/T:/C:/PERFETTO_TAG_*` line grammar and a skipping reader.
//! 2. **Spans:** BEGIN/END pairing per (tile, core) with mismatch diagnostics.
//! 3. **Export:** Chrome trace-event JSON with cycle-to-microsecond scaling.

/// Perfetto (Chrome trace-event) JSON export.
pub mod perfetto;

/// Trace record grammar and log reader.
pub mod record;

/// BEGIN/END span pairing.
pub mod span;

pub use record::{TagMark, TraceRecord, TraceReader};
pub use span::{Diagnostic, Span, SpanBuilder};

use std::path::Path;

use crate::common::error::Result;

/// Result of collecting one or more tile logs.
#[derive(Debug, Clone)]
pub struct Collected {
    /// Paired spans, in completion order.
    pub spans: Vec<Span>,
    /// Pairing diagnostics.
    pub diagnostics: Vec<Diagnostic>,
    /// Total trace records parsed.
    pub records: u64,
}

/// Parses a set of tile logs and pairs all spans.
///
/// # Arguments
///
/// * `paths` - Tile log files; non-trace lines are skipped.
///
/// # Errors
///
/// Propagates I/O failures and malformed trace records (lines that start
/// with `TS:` but fail the grammar).
pub fn collect<P: AsRef<Path>>(paths: &[P]) -> Result<Collected> {
    let mut builder = SpanBuilder::new();
    let mut records = 0u64;
    for path in paths {
        for record in TraceReader::open(path.as_ref())? {
            builder.push(record?);
            records += 1;
        }
    }
    let (spans, diagnostics) = builder.finish();
    Ok(Collected {
        spans,
        diagnostics,
        records,
    })
}
