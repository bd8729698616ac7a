//! # Configuration Tests
//!
//! Comprehensive tests for configuration deserialization, defaults,
//! validation, and path resolution.

use pretty_assertions::assert_eq;
use std::path::PathBuf;
use tempfile::TempDir;

use nocsim_core::HarnessError;
use nocsim_core::common::id::TileId;
use nocsim_core::config::Config;

use crate::common::fixtures;

// ══════════════════════════════════════════════════════════
// 1. Minimal config and defaults
// ══════════════════════════════════════════════════════════

const MINIMAL: &str = r#"{
    "routing_table": "routing.csv",
    "deployment": {
        "tiles": [
            { "tile_id": 0, "port": 6000, "firmware": "fw/tile0.elf" }
        ]
    }
}"#;

#[test]
fn minimal_config_parses() {
    let config = Config::from_json(MINIMAL).unwrap();
    assert_eq!(config.routing_table, PathBuf::from("routing.csv"));
    assert_eq!(config.deployment.tiles.len(), 1);
    assert_eq!(config.deployment.tiles[0].tile_id, TileId::new(0));
    assert_eq!(config.deployment.tiles[0].port, 6000);
}

#[test]
fn defaults_fill_omitted_sections() {
    let config = Config::from_json(MINIMAL).unwrap();
    assert!(!config.tmux_split);
    assert_eq!(config.deployment.host, "127.0.0.1");
    assert_eq!(config.deployment.tiles[0].cpus, 1);
    assert_eq!(config.switch.bind_host, "127.0.0.1");
    assert_eq!(config.switch.max_payload, 64 * 1024);
    assert_eq!(config.trace.out, PathBuf::from("trace.json"));
    assert_eq!(config.trace.cycles_per_us, 1000);
}

#[test]
fn full_config_parses() {
    let json = r#"{
        "tmux_split": true,
        "routing_table": "/etc/noc/routing.csv",
        "deployment": {
            "host": "10.0.0.5",
            "tiles": [
                { "tile_id": 0, "port": 6000, "firmware": "a.elf", "cpus": 4 },
                { "tile_id": 1, "port": 6001, "firmware": "b.elf", "cpus": 2 }
            ]
        },
        "switch": { "bind_host": "0.0.0.0", "max_payload": 1024 },
        "trace": { "out": "out/run.json", "cycles_per_us": 1500 }
    }"#;
    let config = Config::from_json(json).unwrap();
    assert!(config.tmux_split);
    assert_eq!(config.deployment.host, "10.0.0.5");
    assert_eq!(config.deployment.tiles[1].cpus, 2);
    assert_eq!(config.switch.bind_host, "0.0.0.0");
    assert_eq!(config.switch.max_payload, 1024);
    assert_eq!(config.trace.cycles_per_us, 1500);
    assert_eq!(config.tile_ids(), vec![TileId::new(0), TileId::new(1)]);
}

// ══════════════════════════════════════════════════════════
// 2. Rejected inputs
// ══════════════════════════════════════════════════════════

#[test]
fn unknown_top_level_field_is_rejected() {
    let json = MINIMAL.replacen("\"routing_table\"", "\"bogus\": 1, \"routing_table\"", 1);
    assert!(matches!(
        Config::from_json(&json),
        Err(HarnessError::ConfigParse { .. })
    ));
}

#[test]
fn unknown_tile_field_is_rejected() {
    let json = r#"{
        "routing_table": "routing.csv",
        "deployment": {
            "tiles": [
                { "tile_id": 0, "port": 6000, "firmware": "a.elf", "speed": 99 }
            ]
        }
    }"#;
    assert!(matches!(
        Config::from_json(json),
        Err(HarnessError::ConfigParse { .. })
    ));
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(
        Config::from_json("{ not json"),
        Err(HarnessError::ConfigParse { .. })
    ));
}

// ══════════════════════════════════════════════════════════
// 3. Validation
// ══════════════════════════════════════════════════════════

#[test]
fn empty_tile_list_is_invalid() {
    let json = r#"{
        "routing_table": "routing.csv",
        "deployment": { "tiles": [] }
    }"#;
    let err = Config::from_json(json).unwrap_err();
    assert!(matches!(err, HarnessError::ConfigInvalid(_)));
    assert!(err.to_string().contains("empty"));
}

#[test]
fn duplicate_tile_id_is_invalid() {
    let json = r#"{
        "routing_table": "routing.csv",
        "deployment": {
            "tiles": [
                { "tile_id": 3, "port": 6000, "firmware": "a.elf" },
                { "tile_id": 3, "port": 6001, "firmware": "b.elf" }
            ]
        }
    }"#;
    let err = Config::from_json(json).unwrap_err();
    assert!(err.to_string().contains("duplicate tile_id 3"));
}

#[test]
fn duplicate_port_is_invalid() {
    let json = r#"{
        "routing_table": "routing.csv",
        "deployment": {
            "tiles": [
                { "tile_id": 0, "port": 6000, "firmware": "a.elf" },
                { "tile_id": 1, "port": 6000, "firmware": "b.elf" }
            ]
        }
    }"#;
    let err = Config::from_json(json).unwrap_err();
    assert!(err.to_string().contains("duplicate port 6000"));
}

#[test]
fn zero_cpus_is_invalid() {
    let json = r#"{
        "routing_table": "routing.csv",
        "deployment": {
            "tiles": [
                { "tile_id": 0, "port": 6000, "firmware": "a.elf", "cpus": 0 }
            ]
        }
    }"#;
    let err = Config::from_json(json).unwrap_err();
    assert!(err.to_string().contains("cpus = 0"));
}

#[test]
fn empty_firmware_path_is_invalid() {
    let json = r#"{
        "routing_table": "routing.csv",
        "deployment": {
            "tiles": [
                { "tile_id": 0, "port": 6000, "firmware": "" }
            ]
        }
    }"#;
    let err = Config::from_json(json).unwrap_err();
    assert!(err.to_string().contains("firmware"));
}

// ══════════════════════════════════════════════════════════
// 4. File loading and path resolution
// ══════════════════════════════════════════════════════════

#[test]
fn from_path_resolves_relative_routing_table() {
    let (dir, config_path) = fixtures::sample_cluster(2, 6000);
    let config = Config::from_path(&config_path).unwrap();
    assert_eq!(config.routing_table, dir.path().join("routing.csv"));
}

#[test]
fn from_path_keeps_absolute_routing_table() {
    let dir = TempDir::new().unwrap();
    let json = MINIMAL.replace("routing.csv", "/abs/routing.csv");
    let path = fixtures::write_file(dir.path(), "cluster.json", &json);
    let config = Config::from_path(&path).unwrap();
    assert_eq!(config.routing_table, PathBuf::from("/abs/routing.csv"));
}

#[test]
fn from_path_missing_file_is_io_error() {
    let err = Config::from_path(std::path::Path::new("/nonexistent/cluster.json")).unwrap_err();
    assert!(matches!(err, HarnessError::Io { .. }));
}
