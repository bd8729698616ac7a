//! Tile process tests.
//!
//! Real emulators are too heavy for unit tests, so these use stand-in
//! binaries: `true` accepts (and ignores) the emulator argv, and a missing
//! binary exercises the spawn failure path.

use std::path::PathBuf;

use tempfile::TempDir;

use nocsim_core::HarnessError;
use nocsim_core::common::id::TileId;
use nocsim_core::routing::Endpoint;
use nocsim_core::tile::{TileCommand, TileProcess, TileSpec};

fn command(emulator: &str) -> TileCommand {
    TileCommand::new(
        emulator,
        "tile-fn",
        TileSpec {
            tile_id: TileId::new(5),
            cpus: 1,
            firmware: PathBuf::from("fw.elf"),
            endpoint: Endpoint {
                host: "127.0.0.1".to_string(),
                port: 6005,
            },
        },
    )
}

// ══════════════════════════════════════════════════════════
// 1. Spawn and exit
// ══════════════════════════════════════════════════════════

#[test]
fn spawn_creates_the_log_file() {
    let dir = TempDir::new().unwrap();
    let mut process = TileProcess::spawn(&command("true"), dir.path()).unwrap();

    assert_eq!(process.tile(), TileId::new(5));
    assert_eq!(process.log_path(), dir.path().join("tile5.log"));
    assert!(process.log_path().is_file());

    let status = process.wait().unwrap();
    assert!(status.success());
}

#[test]
fn spawn_creates_the_log_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("out/logs");
    let mut process = TileProcess::spawn(&command("true"), &nested).unwrap();
    let _ = process.wait().unwrap();
    assert!(nested.join("tile5.log").is_file());
}

#[test]
fn missing_binary_is_a_spawn_error() {
    let dir = TempDir::new().unwrap();
    let err = TileProcess::spawn(&command("/nonexistent/qemu"), dir.path()).unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Spawn { tile, .. } if tile == TileId::new(5)
    ));
}

// ══════════════════════════════════════════════════════════
// 2. Termination
// ══════════════════════════════════════════════════════════

#[test]
fn terminate_after_exit_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let mut process = TileProcess::spawn(&command("true"), dir.path()).unwrap();
    let _ = process.wait().unwrap();
    process.terminate();
    process.terminate();
}

#[test]
fn try_wait_reports_exit() {
    let dir = TempDir::new().unwrap();
    let mut process = TileProcess::spawn(&command("true"), dir.path()).unwrap();
    assert!(crate::common::fixtures::wait_for(|| {
        process.try_wait().unwrap().is_some_and(|s| s.success())
    }));
}
