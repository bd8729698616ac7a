//! Trace record grammar tests.
//!
//! Firmware consoles interleave ordinary output with trace records; the
//! parser must skip the former and be strict about the latter.

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use nocsim_core::HarnessError;
use nocsim_core::common::id::{CoreId, TileId};
use nocsim_core::trace::{TagMark, TraceReader, TraceRecord};

use crate::common::fixtures;

// ══════════════════════════════════════════════════════════
// 1. Candidate detection
// ══════════════════════════════════════════════════════════

#[test]
fn ts_prefixed_lines_are_candidates() {
    assert!(TraceRecord::is_candidate("TS:100 T:0 C:0 PERFETTO_TAG_BEGIN:boot"));
    assert!(TraceRecord::is_candidate("  TS:100 anything"));
}

#[test]
fn ordinary_console_output_is_not_a_candidate() {
    assert!(!TraceRecord::is_candidate("booting firmware v1.2"));
    assert!(!TraceRecord::is_candidate("T:0 TS:100 swapped prefixes"));
    assert!(!TraceRecord::is_candidate(""));
}

// ══════════════════════════════════════════════════════════
// 2. Parsing
// ══════════════════════════════════════════════════════════

#[test]
fn parses_a_begin_record() {
    let record = TraceRecord::parse("TS:12345 T:2 C:1 PERFETTO_TAG_BEGIN:dma_copy").unwrap();
    assert_eq!(record.ts, 12345);
    assert_eq!(record.tile, TileId::new(2));
    assert_eq!(record.core, CoreId::new(1));
    assert_eq!(record.mark, TagMark::Begin);
    assert_eq!(record.label, "dma_copy");
}

#[test]
fn parses_an_end_record() {
    let record = TraceRecord::parse("TS:99 T:0 C:0 PERFETTO_TAG_END:boot").unwrap();
    assert_eq!(record.mark, TagMark::End);
    assert_eq!(record.label, "boot");
}

#[test]
fn tolerates_extra_whitespace_between_fields() {
    let record = TraceRecord::parse("TS:1   T:0  C:0   PERFETTO_TAG_BEGIN:x").unwrap();
    assert_eq!(record.label, "x");
}

// ══════════════════════════════════════════════════════════
// 3. Grammar violations
// ══════════════════════════════════════════════════════════

#[test]
fn bad_cycle_count_is_an_error() {
    let err = TraceRecord::parse("TS:soon T:0 C:0 PERFETTO_TAG_BEGIN:x").unwrap_err();
    assert!(err.contains("bad cycle count"));
}

#[test]
fn missing_tile_field_is_an_error() {
    let err = TraceRecord::parse("TS:1 C:0 PERFETTO_TAG_BEGIN:x").unwrap_err();
    assert!(err.contains("T:"));
}

#[test]
fn out_of_range_core_is_an_error() {
    let err = TraceRecord::parse("TS:1 T:0 C:300 PERFETTO_TAG_BEGIN:x").unwrap_err();
    assert!(err.contains("bad core id"));
}

#[test]
fn unknown_tag_is_an_error() {
    let err = TraceRecord::parse("TS:1 T:0 C:0 PERFETTO_TAG_MID:x").unwrap_err();
    assert!(err.contains("bad tag field"));
}

#[test]
fn empty_label_is_an_error() {
    let err = TraceRecord::parse("TS:1 T:0 C:0 PERFETTO_TAG_BEGIN:").unwrap_err();
    assert!(err.contains("empty label"));
}

#[test]
fn trailing_field_is_an_error() {
    let err = TraceRecord::parse("TS:1 T:0 C:0 PERFETTO_TAG_BEGIN:x extra").unwrap_err();
    assert!(err.contains("trailing field"));
}

// ══════════════════════════════════════════════════════════
// 4. Log reading
// ══════════════════════════════════════════════════════════

#[test]
fn reader_skips_non_trace_lines() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::log_file(
        dir.path(),
        "tile0.log",
        &[
            "firmware booting",
            "TS:10 T:0 C:0 PERFETTO_TAG_BEGIN:boot",
            "loading tables...",
            "TS:90 T:0 C:0 PERFETTO_TAG_END:boot",
            "done",
        ],
    );
    let records: Vec<TraceRecord> = TraceReader::open(&path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].ts, 10);
    assert_eq!(records[1].mark, TagMark::End);
}

#[test]
fn reader_errors_carry_path_and_line() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::log_file(
        dir.path(),
        "tile0.log",
        &[
            "TS:10 T:0 C:0 PERFETTO_TAG_BEGIN:boot",
            "TS:garbled line",
        ],
    );
    let err = TraceReader::open(&path)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::TraceParse { line: 2, .. }
    ));
}

#[test]
fn missing_log_is_an_io_error() {
    let err = TraceReader::open(std::path::Path::new("/nonexistent/tile.log")).unwrap_err();
    assert!(matches!(err, HarnessError::Io { .. }));
}
