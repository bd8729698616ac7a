//! Network-on-chip emulation over TCP sockets.
//!
//! This module implements the socket interconnect that stands in for the
//! accelerator's on-die fabric. It provides:
//! 1. **Packet:** The framed wire format carried over every tile connection.
//! 2. **Switch:** The host-side hub; one listener per routed tile endpoint,
//!    frames forwarded by destination tile id.
//! 3. **Link:** The client side used by tile-side test doubles and diagnostics.

/// Client-side tile link (HELLO handshake, send/recv).
pub mod link;

/// NoC frame wire format (header, control frames, codec).
pub mod packet;

/// Routing-table-driven TCP switch.
pub mod switch;

pub use link::TileLink;
pub use packet::{Frame, Packet, PacketHeader};
pub use switch::{Switch, SwitchHandle, SwitchStats};
