//! tmux pane layout for interactive runs.
//!
//! When `tmux_split` is enabled the tiles are launched inside a dedicated
//! tmux session, one pane per tile, so every firmware console is visible at
//! once. The harness shells out to the `tmux` binary; the argv builders here
//! are pure and unit-tested, execution goes through [`run_tmux`].

use std::process::Command;

use tracing::debug;

use crate::common::error::{HarnessError, Result};
use crate::tile::TileCommand;

/// Name of the tmux session the harness owns.
pub const SESSION: &str = "nocsim";

/// Argv for creating the detached session running the first tile.
pub fn new_session_args(first: &TileCommand) -> Vec<String> {
    vec![
        "new-session".to_string(),
        "-d".to_string(),
        "-s".to_string(),
        SESSION.to_string(),
        first.display(),
    ]
}

/// Argv for splitting a new pane running one more tile.
pub fn split_window_args(tile: &TileCommand) -> Vec<String> {
    vec![
        "split-window".to_string(),
        "-t".to_string(),
        SESSION.to_string(),
        tile.display(),
    ]
}

/// Argv for retiling panes after all splits.
pub fn tiled_layout_args() -> Vec<String> {
    vec![
        "select-layout".to_string(),
        "-t".to_string(),
        SESSION.to_string(),
        "tiled".to_string(),
    ]
}

/// Argv for checking whether the session is still alive.
pub fn has_session_args() -> Vec<String> {
    vec![
        "has-session".to_string(),
        "-t".to_string(),
        SESSION.to_string(),
    ]
}

/// Argv for tearing the session down.
pub fn kill_session_args() -> Vec<String> {
    vec![
        "kill-session".to_string(),
        "-t".to_string(),
        SESSION.to_string(),
    ]
}

/// Runs one tmux command and checks its exit status.
///
/// # Errors
///
/// Returns `HarnessError::Tmux` if tmux cannot be executed or exits non-zero.
pub fn run_tmux(args: &[String]) -> Result<()> {
    debug!(?args, "tmux");
    let status = Command::new("tmux")
        .args(args)
        .status()
        .map_err(|e| HarnessError::Tmux(format!("cannot execute tmux: {e}")))?;
    if !status.success() {
        return Err(HarnessError::Tmux(format!(
            "tmux {} exited with {status}",
            args.first().map_or("", String::as_str)
        )));
    }
    Ok(())
}

/// Returns whether the harness session is still alive.
pub fn session_alive() -> bool {
    Command::new("tmux")
        .args(has_session_args())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
