//! Cluster build tests.
//!
//! `Cluster::build` wires config, routing, and the switch together without
//! launching any emulator, so it is safe to exercise directly. Fixtures use
//! port 0 so the switch binds ephemeral ports.

use nocsim_core::cluster::{Cluster, LaunchOptions};
use nocsim_core::common::id::TileId;
use nocsim_core::config::Config;
use nocsim_core::HarnessError;

use crate::common::fixtures;
use tempfile::TempDir;

/// A one-tile deployment on an ephemeral port.
fn one_tile_cluster() -> (TempDir, Config) {
    let dir = TempDir::new().unwrap();
    let _ = fixtures::write_file(
        dir.path(),
        "routing.csv",
        "tile_id,die,x,y,host,port\n0,0,0,0,127.0.0.1,0\n",
    );
    let path = fixtures::write_file(
        dir.path(),
        "cluster.json",
        &fixtures::config_json(1, 0, "routing.csv"),
    );
    let config = Config::from_path(&path).unwrap();
    (dir, config)
}

// ══════════════════════════════════════════════════════════
// 1. Successful assembly
// ══════════════════════════════════════════════════════════

#[test]
fn build_binds_the_switch() {
    let (_dir, config) = one_tile_cluster();
    let cluster = Cluster::build(config, LaunchOptions::default()).unwrap();

    let switch = cluster.switch().unwrap();
    assert!(switch.local_addr(TileId::new(0)).is_some());
    assert_eq!(switch.stats().packets, 0);
}

#[test]
fn build_starts_with_a_clear_stop_flag() {
    let (_dir, config) = one_tile_cluster();
    let cluster = Cluster::build(config, LaunchOptions::default()).unwrap();
    assert!(!cluster.stop_flag().load(std::sync::atomic::Ordering::SeqCst));
}

#[test]
fn dropping_an_unlaunched_cluster_is_clean() {
    let (_dir, config) = one_tile_cluster();
    let cluster = Cluster::build(config, LaunchOptions::default()).unwrap();
    drop(cluster);
}

// ══════════════════════════════════════════════════════════
// 2. Rejected deployments
// ══════════════════════════════════════════════════════════

#[test]
fn build_rejects_a_config_routing_mismatch() {
    let dir = TempDir::new().unwrap();
    // Routing covers tiles 0 and 1, config deploys only tile 0.
    let _ = fixtures::write_file(
        dir.path(),
        "routing.csv",
        "tile_id,die,x,y,host,port\n0,0,0,0,127.0.0.1,0\n1,0,1,0,127.0.0.1,0\n",
    );
    let path = fixtures::write_file(
        dir.path(),
        "cluster.json",
        &fixtures::config_json(1, 0, "routing.csv"),
    );
    let config = Config::from_path(&path).unwrap();

    let err = Cluster::build(config, LaunchOptions::default()).unwrap_err();
    assert!(matches!(err, HarnessError::RoutingMismatch(_)));
}

#[test]
fn build_rejects_a_missing_routing_table() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_file(
        dir.path(),
        "cluster.json",
        &fixtures::config_json(1, 0, "missing.csv"),
    );
    let config = Config::from_path(&path).unwrap();

    let err = Cluster::build(config, LaunchOptions::default()).unwrap_err();
    assert!(matches!(err, HarnessError::Io { .. }));
}
