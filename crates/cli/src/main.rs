//! NoC emulation harness CLI.
//!
//! This binary provides a single entry point for all harness operations. It performs:
//! 1. **Check:** Validate a deployment configuration against its routing table.
//! 2. **Run:** Bind the switch, launch every tile emulator, supervise until exit or Ctrl-C.
//! 3. **Trace:** Pair `PERFETTO_TAG` records from tile logs and export a Chrome trace.
//! 4. **Ping:** Probe a tile endpoint with a self-addressed packet and report the round trip.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use nocsim_core::cluster::{Cluster, LaunchOptions};
use nocsim_core::common::constants::DEFAULT_CYCLES_PER_US;
use nocsim_core::common::id::TileId;
use nocsim_core::config::Config;
use nocsim_core::noc::TileLink;
use nocsim_core::routing::RoutingTable;
use nocsim_core::trace::{self, perfetto};
use nocsim_core::Result;

#[derive(Parser, Debug)]
#[command(
    name = "nocsim",
    author,
    version,
    about = "Multi-instance NoC emulation harness",
    long_about = "Orchestrate one emulator process per tile and route inter-tile traffic over a\nrouting-table-driven socket switch.\n\nExamples:\n  nocsim check cluster.json\n  nocsim run cluster.json --log-dir out/logs\n  nocsim trace logs/tile0.log logs/tile1.log -o trace.json\n  nocsim ping cluster.json --tile 3"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a configuration and its routing table without launching anything.
    Check {
        /// Deployment configuration (JSON).
        config: PathBuf,
    },

    /// Launch the switch and every tile emulator, then supervise the run.
    Run {
        /// Deployment configuration (JSON).
        config: PathBuf,

        /// Directory for per-tile console logs (overrides the default).
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Emulator binary to launch (overrides the default).
        #[arg(long)]
        emulator: Option<String>,

        /// Emulator machine model (overrides the default).
        #[arg(long)]
        machine: Option<String>,
    },

    /// Pair trace records from tile logs and export a Perfetto-compatible trace.
    Trace {
        /// Tile log files to scan.
        #[arg(required = true)]
        logs: Vec<PathBuf>,

        /// Output trace file.
        #[arg(short, long, default_value = "trace.json")]
        out: PathBuf,

        /// Firmware cycle counter ticks per microsecond.
        #[arg(long, default_value_t = DEFAULT_CYCLES_PER_US)]
        cycles_per_us: u64,
    },

    /// Probe a tile endpoint with a self-addressed packet.
    ///
    /// Connects as the tile itself, so run this before that tile's emulator
    /// attaches (or against a spare routing entry).
    Ping {
        /// Deployment configuration (JSON).
        config: PathBuf,

        /// Tile to probe.
        #[arg(long)]
        tile: u16,
    },
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Check { config } => cmd_check(&config),
        Commands::Run {
            config,
            log_dir,
            emulator,
            machine,
        } => cmd_run(&config, log_dir, emulator, machine),
        Commands::Trace {
            logs,
            out,
            cycles_per_us,
        } => cmd_trace(&logs, &out, cycles_per_us),
        Commands::Ping { config, tile } => cmd_ping(&config, TileId(tile)),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Installs the `tracing` subscriber, filtered by `RUST_LOG` (default `info`).
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads and validates the configuration, cross-checks the routing table, and
/// prints a per-tile summary.
fn cmd_check(config_path: &PathBuf) -> Result<()> {
    let config = Config::from_path(config_path)?;
    let routing = RoutingTable::from_path(&config.routing_table)?;
    routing.check_against(&config)?;

    println!("Configuration: {}", config_path.display());
    println!(
        "  Routing table: {} ({} tiles)",
        config.routing_table.display(),
        routing.len()
    );
    println!(
        "  Switch: binds {} (max payload {} bytes)",
        config.switch.bind_host, config.switch.max_payload
    );
    println!("  Mode: {}", if config.tmux_split { "tmux" } else { "background processes" });
    println!();

    for tile in &config.deployment.tiles {
        // check_against guarantees every configured tile is routed.
        if let Some(entry) = routing.lookup(tile.tile_id) {
            println!(
                "  {}  {} {}  {}  cpus={}  firmware={}",
                entry.tile_id,
                entry.die,
                entry.coord,
                entry.endpoint,
                tile.cpus,
                tile.firmware.display()
            );
        }
    }

    println!();
    println!("OK");
    Ok(())
}

/// Runs the full harness: bind the switch, launch every tile, supervise until
/// all tiles exit or Ctrl-C, then tear down and report.
///
/// In background-process mode the tile logs are scanned afterwards and a
/// Perfetto trace is written to the configured output path.
fn cmd_run(
    config_path: &PathBuf,
    log_dir: Option<PathBuf>,
    emulator: Option<String>,
    machine: Option<String>,
) -> Result<()> {
    let config = Config::from_path(config_path)?;
    let tmux = config.tmux_split;
    let tile_ids = config.tile_ids();
    let trace_out = config.trace.out.clone();
    let cycles_per_us = config.trace.cycles_per_us;
    let resolved_log_dir = log_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(Config::default_log_dir()));

    let options = LaunchOptions {
        emulator,
        machine,
        log_dir,
    };
    let mut cluster = Cluster::build(config, options)?;
    install_sigint(cluster.stop_flag());

    cluster.launch()?;
    cluster.supervise()?;
    cluster.shutdown();

    let mut stats = cluster.stats().clone();

    if !tmux {
        let logs: Vec<PathBuf> = tile_ids
            .iter()
            .map(|id| resolved_log_dir.join(format!("{id}.log")))
            .filter(|p| p.is_file())
            .collect();
        if !logs.is_empty() {
            let collected = trace::collect(&logs)?;
            perfetto::export(&collected.spans, cycles_per_us, &trace_out)?;
            for diag in &collected.diagnostics {
                tracing::warn!("trace: {diag}");
            }
            println!("Trace written to {}", trace_out.display());
            stats.trace_records = collected.records;
            stats.spans = collected.spans.len() as u64;
            stats.diagnostics = collected.diagnostics.len() as u64;
        }
    }

    stats.print();
    Ok(())
}

/// Pairs trace records from the given logs and writes the Perfetto export.
fn cmd_trace(logs: &[PathBuf], out: &PathBuf, cycles_per_us: u64) -> Result<()> {
    let collected = trace::collect(logs)?;

    for diag in &collected.diagnostics {
        eprintln!("warning: {diag}");
    }

    perfetto::export(&collected.spans, cycles_per_us, out)?;
    println!(
        "{} records, {} spans, {} diagnostics -> {}",
        collected.records,
        collected.spans.len(),
        collected.diagnostics.len(),
        out.display()
    );
    Ok(())
}

/// Sends a self-addressed packet through the switch and times the round trip.
fn cmd_ping(config_path: &PathBuf, tile: TileId) -> Result<()> {
    let config = Config::from_path(config_path)?;
    let routing = RoutingTable::from_path(&config.routing_table)?;
    let Some(endpoint) = routing.endpoint_of(tile) else {
        eprintln!("Error: {tile} is not in the routing table");
        process::exit(1);
    };

    let addr = endpoint.addr();
    let mut link = TileLink::connect(&addr, tile, config.switch.max_payload)?;

    let started = Instant::now();
    link.send(tile, b"ping".to_vec())?;
    let reply = link.recv()?;
    let elapsed = started.elapsed();

    println!(
        "{} at {}: {} byte(s) back from {} in {:.3} ms",
        tile,
        addr,
        reply.payload.len(),
        reply.src,
        elapsed.as_secs_f64() * 1000.0
    );
    link.close()?;
    Ok(())
}

static STOP: OnceLock<Arc<AtomicBool>> = OnceLock::new();

#[cfg(unix)]
extern "C" fn on_sigint(_signal: libc::c_int) {
    // Only the atomic store is allowed here; everything else happens on the
    // supervise loop's next poll.
    if let Some(flag) = STOP.get() {
        flag.store(true, Ordering::SeqCst);
    }
}

/// Routes SIGINT to the cluster's stop flag so Ctrl-C triggers an orderly
/// shutdown instead of killing the harness outright.
#[cfg(unix)]
fn install_sigint(flag: Arc<AtomicBool>) {
    let _ = STOP.set(flag);
    // SAFETY: `on_sigint` is async-signal-safe; it only stores to an atomic.
    unsafe {
        libc::signal(libc::SIGINT, on_sigint as libc::sighandler_t);
    }
}

#[cfg(not(unix))]
fn install_sigint(_flag: Arc<AtomicBool>) {}
