//! Client side of a tile's NoC connection.
//!
//! `TileLink` speaks the frame protocol from the tile's point of view: it
//! connects to the tile's routed endpoint, announces itself with HELLO, and
//! then exchanges data packets. Firmware-side test doubles and the `ping`
//! diagnostic use it; real tile emulators speak the same bytes through their
//! socket character device.

use std::net::{Shutdown, TcpStream};

use tracing::debug;

use crate::common::error::{HarnessError, Result};
use crate::common::id::TileId;
use crate::noc::packet::{Frame, Packet, read_frame, write_frame};

/// A connected, registered tile link.
#[derive(Debug)]
pub struct TileLink {
    tile: TileId,
    stream: TcpStream,
    max_payload: u32,
}

impl TileLink {
    /// Connects to a tile endpoint and performs the HELLO handshake.
    ///
    /// # Arguments
    ///
    /// * `addr` - The tile's routed endpoint, `host:port`.
    /// * `tile` - The tile this link represents; must own the endpoint.
    /// * `max_payload` - Frame payload cap for received frames.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Socket` if the connection or handshake write
    /// fails.
    pub fn connect(addr: &str, tile: TileId, max_payload: u32) -> Result<Self> {
        let mut stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        write_frame(&mut stream, &Frame::Hello(tile))?;
        debug!(tile = %tile, addr, "link up");
        Ok(Self {
            tile,
            stream,
            max_payload,
        })
    }

    /// Returns the tile this link represents.
    pub fn tile(&self) -> TileId {
        self.tile
    }

    /// Sends a data packet to another tile.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Socket` on write failure.
    pub fn send(&mut self, dst: TileId, payload: Vec<u8>) -> Result<()> {
        write_frame(
            &mut self.stream,
            &Frame::Data(Packet {
                src: self.tile,
                dst,
                payload,
            }),
        )
    }

    /// Receives the next data packet addressed to this tile.
    ///
    /// Control frames are not expected from the switch and are skipped.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::LinkClosed` if the switch closes the
    /// connection, `HarnessError::Wire` on a malformed frame.
    pub fn recv(&mut self) -> Result<Packet> {
        loop {
            match read_frame(&mut self.stream, self.max_payload)? {
                Some(Frame::Data(packet)) => return Ok(packet),
                Some(_) => continue,
                None => return Err(HarnessError::LinkClosed(self.tile)),
            }
        }
    }

    /// Announces departure with GOODBYE and closes the connection.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Socket` if the GOODBYE write fails; the socket
    /// is shut down either way.
    pub fn close(mut self) -> Result<()> {
        let result = write_frame(&mut self.stream, &Frame::Goodbye(self.tile));
        let _ = self.stream.shutdown(Shutdown::Both);
        result
    }
}
