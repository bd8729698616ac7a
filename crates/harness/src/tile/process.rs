//! Tile process lifecycle.
//!
//! Spawns one emulator process per tile with its console captured to a log
//! file, polls for exit, and terminates stragglers with SIGTERM followed by a
//! hard kill after a grace period. Trace records are later recovered from the
//! captured log (the firmware prints them on its console).

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::common::constants::TERMINATE_GRACE_MS;
use crate::common::error::{HarnessError, Result};
use crate::common::id::TileId;
use crate::tile::TileCommand;

/// A running (or exited) tile emulator process.
#[derive(Debug)]
pub struct TileProcess {
    tile: TileId,
    child: Child,
    log_path: PathBuf,
}

impl TileProcess {
    /// Spawns the emulator for a tile, capturing stdout and stderr to
    /// `<log_dir>/tile<id>.log`.
    ///
    /// # Arguments
    ///
    /// * `command` - The prepared emulator command.
    /// * `log_dir` - Directory for per-tile logs; created if missing.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Io` if the log file cannot be created and
    /// `HarnessError::Spawn` if the emulator cannot be started.
    pub fn spawn(command: &TileCommand, log_dir: &Path) -> Result<Self> {
        let tile = command.spec.tile_id;
        fs::create_dir_all(log_dir).map_err(|source| HarnessError::Io {
            path: log_dir.to_path_buf(),
            source,
        })?;
        let log_path = log_dir.join(format!("tile{}.log", tile.val()));
        let log = File::create(&log_path).map_err(|source| HarnessError::Io {
            path: log_path.clone(),
            source,
        })?;
        let log_err = log.try_clone().map_err(|source| HarnessError::Io {
            path: log_path.clone(),
            source,
        })?;

        debug!(tile = %tile, cmd = %command.display(), "spawning");
        let child = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .spawn()
            .map_err(|source| HarnessError::Spawn { tile, source })?;

        Ok(Self {
            tile,
            child,
            log_path,
        })
    }

    /// Returns the tile this process simulates.
    pub fn tile(&self) -> TileId {
        self.tile
    }

    /// Returns the path of the captured console log.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Polls for exit without blocking.
    ///
    /// # Returns
    ///
    /// `Some(status)` once the process has exited, `None` while it runs.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Socket` (I/O) if the wait itself fails.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        Ok(self.child.try_wait()?)
    }

    /// Blocks until the process exits.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Socket` (I/O) if the wait fails.
    pub fn wait(&mut self) -> Result<ExitStatus> {
        Ok(self.child.wait()?)
    }

    /// Terminates the process: SIGTERM, a grace period, then SIGKILL.
    ///
    /// Already-exited processes are reaped silently.
    pub fn terminate(&mut self) {
        if matches!(self.child.try_wait(), Ok(Some(_))) {
            return;
        }

        send_sigterm(&self.child);
        let deadline = Instant::now() + Duration::from_millis(TERMINATE_GRACE_MS);
        while Instant::now() < deadline {
            if matches!(self.child.try_wait(), Ok(Some(_))) {
                debug!(tile = %self.tile, "terminated");
                return;
            }
            std::thread::sleep(Duration::from_millis(20));
        }

        warn!(tile = %self.tile, "did not exit in grace period, killing");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Delivers SIGTERM so the emulator can flush its console before exiting.
#[cfg(unix)]
fn send_sigterm(child: &Child) {
    // SAFETY: kill(2) with a pid we own and a valid signal number.
    unsafe {
        let _ = libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
fn send_sigterm(_child: &Child) {}
