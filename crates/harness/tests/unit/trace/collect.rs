//! End-to-end log collection tests.

use tempfile::TempDir;

use nocsim_core::common::id::TileId;
use nocsim_core::trace;

use crate::common::fixtures;

// ══════════════════════════════════════════════════════════
// 1. Multi-log collection
// ══════════════════════════════════════════════════════════

#[test]
fn collects_spans_across_logs() {
    let dir = TempDir::new().unwrap();
    let a = fixtures::log_file(
        dir.path(),
        "tile0.log",
        &[
            "firmware v1.2 on tile0",
            "TS:100 T:0 C:0 PERFETTO_TAG_BEGIN:boot",
            "TS:400 T:0 C:0 PERFETTO_TAG_END:boot",
        ],
    );
    let b = fixtures::log_file(
        dir.path(),
        "tile1.log",
        &[
            "TS:150 T:1 C:0 PERFETTO_TAG_BEGIN:boot",
            "TS:500 T:1 C:0 PERFETTO_TAG_END:boot",
            "TS:600 T:1 C:1 PERFETTO_TAG_END:stray",
        ],
    );

    let collected = trace::collect(&[a, b]).unwrap();
    assert_eq!(collected.records, 5);
    assert_eq!(collected.spans.len(), 2);
    assert_eq!(collected.diagnostics.len(), 1);
    assert!(collected.spans.iter().any(|s| s.tile == TileId::new(1)));
}

#[test]
fn empty_path_list_collects_nothing() {
    let collected = trace::collect::<&std::path::Path>(&[]).unwrap();
    assert_eq!(collected.records, 0);
    assert!(collected.spans.is_empty());
}

#[test]
fn a_log_without_trace_records_is_fine() {
    let dir = TempDir::new().unwrap();
    let log = fixtures::log_file(dir.path(), "tile0.log", &["just console noise", "no traces"]);
    let collected = trace::collect(&[log]).unwrap();
    assert_eq!(collected.records, 0);
}
