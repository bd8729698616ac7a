//! Run statistics tests.

use nocsim_core::noc::SwitchStats;
use nocsim_core::stats::HarnessStats;

// ══════════════════════════════════════════════════════════
// 1. Accumulation
// ══════════════════════════════════════════════════════════

#[test]
fn new_stats_are_zeroed() {
    let stats = HarnessStats::new();
    assert_eq!(stats.tiles_launched, 0);
    assert_eq!(stats.packets, 0);
    assert_eq!(stats.spans, 0);
}

#[test]
fn absorb_switch_copies_the_snapshot() {
    let mut stats = HarnessStats::new();
    stats.absorb_switch(SwitchStats {
        packets: 42,
        bytes: 1024,
        drops: 3,
    });
    assert_eq!(stats.packets, 42);
    assert_eq!(stats.bytes, 1024);
    assert_eq!(stats.drops, 3);
}

#[test]
fn print_does_not_panic() {
    let mut stats = HarnessStats::new();
    stats.tiles_launched = 4;
    stats.tiles_exited_ok = 4;
    stats.packets = 100;
    stats.print();
}
