//! Harness statistics collection and reporting.
//!
//! This module tracks counters for a harness run. It provides:
//! 1. **Tiles:** Launched, clean exits, and failed exits.
//! 2. **Switch:** Packets, bytes, and drops forwarded by the NoC switch.
//! 3. **Trace:** Records parsed, spans emitted, and pairing diagnostics.
//! 4. **Reporting:** A plain-text report printer.

use std::time::Instant;

use crate::noc::SwitchStats;

/// Counters for one harness run.
#[derive(Debug, Clone)]
pub struct HarnessStats {
    start_time: Instant,
    /// Tile emulator processes launched.
    pub tiles_launched: u64,
    /// Tiles that exited with status zero.
    pub tiles_exited_ok: u64,
    /// Tiles that exited non-zero or on a signal.
    pub tiles_exited_err: u64,
    /// Data packets forwarded by the switch.
    pub packets: u64,
    /// Payload bytes forwarded by the switch.
    pub bytes: u64,
    /// Packets dropped by the switch.
    pub drops: u64,
    /// Trace records parsed from tile logs.
    pub trace_records: u64,
    /// Spans emitted to the Perfetto export.
    pub spans: u64,
    /// Span-pairing diagnostics (mismatches, unclosed spans).
    pub diagnostics: u64,
}

impl HarnessStats {
    /// Creates zeroed counters with the clock started now.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            tiles_launched: 0,
            tiles_exited_ok: 0,
            tiles_exited_err: 0,
            packets: 0,
            bytes: 0,
            drops: 0,
            trace_records: 0,
            spans: 0,
            diagnostics: 0,
        }
    }

    /// Folds a switch counter snapshot into the run totals.
    pub fn absorb_switch(&mut self, stats: SwitchStats) {
        self.packets = stats.packets;
        self.bytes = stats.bytes;
        self.drops = stats.drops;
    }

    /// Prints the run report to stdout.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        println!("\n==========================================================");
        println!("NOC HARNESS RUN STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {seconds:.4} s");
        println!("tiles.launched           {}", self.tiles_launched);
        println!("tiles.exited_ok          {}", self.tiles_exited_ok);
        println!("tiles.exited_err         {}", self.tiles_exited_err);
        println!("----------------------------------------------------------");
        println!("noc.packets              {}", self.packets);
        println!("noc.bytes                {}", self.bytes);
        println!("noc.drops                {}", self.drops);
        println!("----------------------------------------------------------");
        println!("trace.records            {}", self.trace_records);
        println!("trace.spans              {}", self.spans);
        println!("trace.diagnostics        {}", self.diagnostics);
        println!("==========================================================");
    }
}

impl Default for HarnessStats {
    fn default() -> Self {
        Self::new()
    }
}
