//! Global harness constants.
//!
//! This module defines constants used across the harness. It includes:
//! 1. **Wire Constants:** Magic, version, and header layout of the NoC frame format.
//! 2. **Size Limits:** Payload caps and channel depths for the switch.
//! 3. **Timing Constants:** Supervision poll interval and termination grace period.

/// Magic value in every NoC frame header (`"NC"` little-endian).
pub const FRAME_MAGIC: u16 = 0x434E;

/// Current NoC wire-format version.
pub const FRAME_VERSION: u8 = 1;

/// Size of the fixed NoC frame header in bytes.
pub const FRAME_HEADER_LEN: usize = 12;

/// Flag bit marking a control frame (HELLO/GOODBYE).
pub const FLAG_CONTROL: u8 = 0x01;

/// Mask of flag bits that must be zero in version 1 frames.
pub const FLAG_RESERVED_MASK: u8 = 0xFE;

/// Default cap on a single frame payload (64 KiB).
pub const DEFAULT_MAX_PAYLOAD: u32 = 64 * 1024;

/// Depth of the per-tile writer channel inside the switch.
pub const WRITER_QUEUE_DEPTH: usize = 256;

/// Interval between child-process polls in the supervision loop, in milliseconds.
pub const SUPERVISE_POLL_MS: u64 = 50;

/// Grace period between SIGTERM and SIGKILL when terminating a tile, in milliseconds.
pub const TERMINATE_GRACE_MS: u64 = 2000;

/// Extra Manhattan hops charged for crossing a die boundary.
pub const DIE_CROSSING_HOPS: u32 = 1;

/// Default cycles-per-microsecond ratio for trace export (1 GHz tile clock).
pub const DEFAULT_CYCLES_PER_US: u64 = 1000;
