//! Perfetto (Chrome trace-event) JSON export.
//!
//! Emits one complete event (`"ph": "X"`) per paired span. Tiles map to
//! Perfetto processes and cores to threads, so the UI groups each tile's
//! cores under one track group. Timestamps are converted from tile clock
//! cycles to microseconds with a configurable ratio.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::common::error::{HarnessError, Result};
use crate::trace::span::Span;

/// Event category tagged on every exported span.
const CATEGORY: &str = "firmware";

/// Top-level Chrome trace-event document.
#[derive(Debug, Serialize)]
struct Document<'a> {
    #[serde(rename = "displayTimeUnit")]
    display_time_unit: &'static str,
    #[serde(rename = "traceEvents")]
    trace_events: Vec<Event<'a>>,
}

/// One complete ("X") trace event.
#[derive(Debug, Serialize)]
struct Event<'a> {
    name: &'a str,
    cat: &'static str,
    ph: &'static str,
    pid: u16,
    tid: u8,
    ts: f64,
    dur: f64,
}

/// Renders spans as a Chrome trace-event JSON document.
///
/// Events are sorted by start timestamp so the output is stable regardless
/// of log collection order.
///
/// # Arguments
///
/// * `spans` - Paired spans.
/// * `cycles_per_us` - Tile clock cycles per microsecond; zero is treated as one.
pub fn render(spans: &[Span], cycles_per_us: u64) -> String {
    let scale = if cycles_per_us == 0 { 1 } else { cycles_per_us } as f64;

    let mut ordered: Vec<&Span> = spans.iter().collect();
    ordered.sort_by_key(|s| (s.start, s.tile, s.core));

    let trace_events = ordered
        .into_iter()
        .map(|span| Event {
            name: &span.label,
            cat: CATEGORY,
            ph: "X",
            pid: span.tile.val(),
            tid: span.core.val(),
            ts: span.start as f64 / scale,
            dur: (span.end - span.start) as f64 / scale,
        })
        .collect();

    let document = Document {
        display_time_unit: "ns",
        trace_events,
    };
    // Serialization of this shape cannot fail.
    serde_json::to_string_pretty(&document).unwrap_or_default()
}

/// Writes the Perfetto JSON document to a file.
///
/// # Errors
///
/// Returns `HarnessError::Io` with the output path on any write failure.
pub fn export(spans: &[Span], cycles_per_us: u64, out: &Path) -> Result<()> {
    let io_err = |source| HarnessError::Io {
        path: out.to_path_buf(),
        source,
    };
    let file = File::create(out).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(render(spans, cycles_per_us).as_bytes())
        .map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}
