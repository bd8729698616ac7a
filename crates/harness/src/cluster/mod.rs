//! Cluster assembly and orchestration.
//!
//! This module builds the complete simulation from configuration and drives
//! it. It performs:
//! 1. **Assembly:** Loads the routing table, cross-checks it against the
//!    config, binds the switch, and prepares tile specs.
//! 2. **Launch:** Spawns every tile emulator, either as background processes
//!    with log capture or as tmux panes.
//! 3. **Supervision:** Polls for tile exits; a failed tile is reported but
//!    does not stop the survivors.
//! 4. **Shutdown:** Terminates stragglers, stops the switch, folds counters.

/// tmux session and pane command construction.
pub mod tmux;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{info, warn};

use crate::common::constants::SUPERVISE_POLL_MS;
use crate::common::error::Result;
use crate::config::Config;
use crate::noc::{Switch, SwitchHandle};
use crate::routing::RoutingTable;
use crate::stats::HarnessStats;
use crate::tile::{TileCommand, TileProcess, TileSpec};

/// Overrides applied on top of the configuration at launch time.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Emulator binary override.
    pub emulator: Option<String>,
    /// Emulator machine model override.
    pub machine: Option<String>,
    /// Log directory override.
    pub log_dir: Option<PathBuf>,
}

/// Top-level simulation instance: switch, tile specs, and processes.
#[derive(Debug)]
pub struct Cluster {
    config: Config,
    switch: Option<SwitchHandle>,
    commands: Vec<TileCommand>,
    processes: Vec<TileProcess>,
    tmux_active: bool,
    log_dir: PathBuf,
    stop: Arc<AtomicBool>,
    stats: HarnessStats,
}

impl Cluster {
    /// Assembles a cluster from configuration: routing table loaded and
    /// cross-checked, switch bound, tile commands prepared. No processes are
    /// started yet.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated deployment configuration.
    /// * `options` - Launch-time overrides.
    ///
    /// # Errors
    ///
    /// Propagates routing parse/validation errors, routing/config mismatches,
    /// and switch bind failures.
    pub fn build(config: Config, options: LaunchOptions) -> Result<Self> {
        let routing = RoutingTable::from_path(&config.routing_table)?;
        routing.check_against(&config)?;

        let emulator = options
            .emulator
            .unwrap_or_else(|| Config::default_emulator().to_string());
        let machine = options
            .machine
            .unwrap_or_else(|| Config::default_machine().to_string());
        let log_dir = options
            .log_dir
            .unwrap_or_else(|| PathBuf::from(Config::default_log_dir()));

        let mut commands = Vec::with_capacity(config.deployment.tiles.len());
        for tile in &config.deployment.tiles {
            // check_against guarantees the route exists.
            if let Some(entry) = routing.lookup(tile.tile_id) {
                let spec = TileSpec {
                    tile_id: tile.tile_id,
                    cpus: tile.cpus,
                    firmware: tile.firmware.clone(),
                    endpoint: entry.endpoint.clone(),
                };
                commands.push(TileCommand::new(emulator.clone(), machine.clone(), spec));
            }
        }

        let switch = Switch::bind(
            &config.switch.bind_host,
            routing,
            config.switch.max_payload,
        )?;

        Ok(Self {
            config,
            switch: Some(switch),
            commands,
            processes: Vec::new(),
            tmux_active: false,
            log_dir,
            stop: Arc::new(AtomicBool::new(false)),
            stats: HarnessStats::new(),
        })
    }

    /// Returns the stop flag; setting it ends supervision (Ctrl-C handler).
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Returns the running switch handle, if the cluster is up.
    pub fn switch(&self) -> Option<&SwitchHandle> {
        self.switch.as_ref()
    }

    /// Returns the accumulated run statistics.
    pub fn stats(&self) -> &HarnessStats {
        &self.stats
    }

    /// Launches every tile.
    ///
    /// With `tmux_split` the tiles become panes of a dedicated tmux session;
    /// otherwise each tile runs as a background process with its console
    /// captured to `<log_dir>/tile<id>.log`.
    ///
    /// # Errors
    ///
    /// Returns the first spawn or tmux failure; tiles launched before the
    /// failure keep running and are cleaned up by [`Cluster::shutdown`].
    pub fn launch(&mut self) -> Result<()> {
        if self.config.tmux_split {
            self.launch_tmux()
        } else {
            self.launch_processes()
        }
    }

    fn launch_processes(&mut self) -> Result<()> {
        for command in &self.commands {
            let process = TileProcess::spawn(command, &self.log_dir)?;
            info!(tile = %process.tile(), log = %process.log_path().display(), "tile up");
            self.processes.push(process);
            self.stats.tiles_launched += 1;
        }
        Ok(())
    }

    fn launch_tmux(&mut self) -> Result<()> {
        let mut commands = self.commands.iter();
        let Some(first) = commands.next() else {
            return Ok(());
        };
        tmux::run_tmux(&tmux::new_session_args(first))?;
        self.tmux_active = true;
        self.stats.tiles_launched += 1;
        for command in commands {
            tmux::run_tmux(&tmux::split_window_args(command))?;
            self.stats.tiles_launched += 1;
        }
        tmux::run_tmux(&tmux::tiled_layout_args())?;
        info!(session = tmux::SESSION, tiles = self.commands.len(), "tmux session up");
        Ok(())
    }

    /// Supervises the launched tiles until they all exit or stop is requested.
    ///
    /// Background processes are reaped with `try_wait`; a non-zero exit is
    /// logged and counted but the survivors keep running. In tmux mode the
    /// loop instead watches the session for liveness.
    ///
    /// # Errors
    ///
    /// Propagates wait failures from the child processes.
    pub fn supervise(&mut self) -> Result<()> {
        let poll = Duration::from_millis(SUPERVISE_POLL_MS);

        if self.tmux_active {
            while !self.stop.load(Ordering::SeqCst) && tmux::session_alive() {
                std::thread::sleep(poll);
            }
            return Ok(());
        }

        while !self.stop.load(Ordering::SeqCst) && !self.processes.is_empty() {
            let mut still_running = Vec::with_capacity(self.processes.len());
            for mut process in self.processes.drain(..) {
                match process.try_wait()? {
                    Some(status) if status.success() => {
                        info!(tile = %process.tile(), "tile exited cleanly");
                        self.stats.tiles_exited_ok += 1;
                    }
                    Some(status) => {
                        warn!(tile = %process.tile(), %status, "tile failed");
                        self.stats.tiles_exited_err += 1;
                    }
                    None => still_running.push(process),
                }
            }
            self.processes = still_running;
            if !self.processes.is_empty() {
                std::thread::sleep(poll);
            }
        }
        Ok(())
    }

    /// Terminates remaining tiles, stops the switch, and folds its counters.
    pub fn shutdown(&mut self) {
        if self.tmux_active {
            if tmux::session_alive() {
                if let Err(e) = tmux::run_tmux(&tmux::kill_session_args()) {
                    warn!(error = %e, "could not kill tmux session");
                }
            }
            self.tmux_active = false;
        }

        for process in &mut self.processes {
            process.terminate();
        }
        self.processes.clear();

        if let Some(mut switch) = self.switch.take() {
            switch.shutdown();
            self.stats.absorb_switch(switch.stats());
        }
    }
}

impl Drop for Cluster {
    fn drop(&mut self) {
        self.shutdown();
    }
}
