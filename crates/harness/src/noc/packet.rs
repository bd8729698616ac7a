//! NoC frame wire format.
//!
//! Every tile connection carries a stream of frames. Each frame starts with a
//! fixed 12-byte little-endian header:
//!
//! | offset | size | field   |
//! |--------|------|---------|
//! | 0      | 2    | magic (`0x434E`, `"NC"`) |
//! | 2      | 1    | version (1) |
//! | 3      | 1    | flags   |
//! | 4      | 2    | src tile id |
//! | 6      | 2    | dst tile id |
//! | 8      | 4    | payload length |
//!
//! Flag bit 0 marks a control frame; its payload is a single opcode byte
//! (HELLO or GOODBYE). All other flag bits are reserved and must be zero.

use std::io::{Read, Write};

use crate::common::constants::{
    FLAG_CONTROL, FLAG_RESERVED_MASK, FRAME_HEADER_LEN, FRAME_MAGIC, FRAME_VERSION,
};
use crate::common::error::{HarnessError, Result};
use crate::common::id::TileId;

/// Control opcode: tile announces itself after connecting.
const CTRL_HELLO: u8 = 0x01;

/// Control opcode: tile is leaving; the connection closes after this frame.
const CTRL_GOODBYE: u8 = 0x02;

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Flag bits (bit 0 = control frame).
    pub flags: u8,
    /// Source tile.
    pub src: TileId,
    /// Destination tile (equal to src for control frames).
    pub dst: TileId,
    /// Payload length in bytes.
    pub len: u32,
}

impl PacketHeader {
    /// Encodes the header into its 12-byte wire form.
    pub fn encode(&self) -> [u8; FRAME_HEADER_LEN] {
        let mut buf = [0u8; FRAME_HEADER_LEN];
        buf[0..2].copy_from_slice(&FRAME_MAGIC.to_le_bytes());
        buf[2] = FRAME_VERSION;
        buf[3] = self.flags;
        buf[4..6].copy_from_slice(&self.src.val().to_le_bytes());
        buf[6..8].copy_from_slice(&self.dst.val().to_le_bytes());
        buf[8..12].copy_from_slice(&self.len.to_le_bytes());
        buf
    }

    /// Decodes and verifies a 12-byte wire header.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Wire` on bad magic, unsupported version, or
    /// reserved flag bits.
    pub fn decode(buf: &[u8; FRAME_HEADER_LEN]) -> Result<Self> {
        let magic = u16::from_le_bytes([buf[0], buf[1]]);
        if magic != FRAME_MAGIC {
            return Err(HarnessError::Wire(format!("bad magic {magic:#06x}")));
        }
        let version = buf[2];
        if version != FRAME_VERSION {
            return Err(HarnessError::Wire(format!("unsupported version {version}")));
        }
        let flags = buf[3];
        if flags & FLAG_RESERVED_MASK != 0 {
            return Err(HarnessError::Wire(format!("reserved flags set: {flags:#04x}")));
        }
        Ok(Self {
            flags,
            src: TileId::new(u16::from_le_bytes([buf[4], buf[5]])),
            dst: TileId::new(u16::from_le_bytes([buf[6], buf[7]])),
            len: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
        })
    }
}

/// A data packet between two tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Source tile.
    pub src: TileId,
    /// Destination tile.
    pub dst: TileId,
    /// Opaque payload.
    pub payload: Vec<u8>,
}

/// A decoded NoC frame: a control announcement or a data packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Tile announces itself; first frame on every connection.
    Hello(TileId),
    /// Tile is leaving; last frame on a connection.
    Goodbye(TileId),
    /// A routed data packet.
    Data(Packet),
}

impl Frame {
    /// Encodes the frame (header plus payload) into a byte vector.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Hello(tile) => encode_control(*tile, CTRL_HELLO),
            Self::Goodbye(tile) => encode_control(*tile, CTRL_GOODBYE),
            Self::Data(packet) => {
                let header = PacketHeader {
                    flags: 0,
                    src: packet.src,
                    dst: packet.dst,
                    len: packet.payload.len() as u32,
                };
                let mut out = Vec::with_capacity(FRAME_HEADER_LEN + packet.payload.len());
                out.extend_from_slice(&header.encode());
                out.extend_from_slice(&packet.payload);
                out
            }
        }
    }

    /// Returns the source tile of the frame.
    pub fn src(&self) -> TileId {
        match self {
            Self::Hello(tile) | Self::Goodbye(tile) => *tile,
            Self::Data(packet) => packet.src,
        }
    }
}

fn encode_control(tile: TileId, opcode: u8) -> Vec<u8> {
    let header = PacketHeader {
        flags: FLAG_CONTROL,
        src: tile,
        dst: tile,
        len: 1,
    };
    let mut out = Vec::with_capacity(FRAME_HEADER_LEN + 1);
    out.extend_from_slice(&header.encode());
    out.push(opcode);
    out
}

/// Writes a frame to a stream.
///
/// # Errors
///
/// Returns `HarnessError::Socket` on write failure.
pub fn write_frame<W: Write>(writer: &mut W, frame: &Frame) -> Result<()> {
    writer.write_all(&frame.encode())?;
    writer.flush()?;
    Ok(())
}

/// Reads one frame from a stream.
///
/// # Arguments
///
/// * `reader` - Byte source (typically a `TcpStream`).
/// * `max_payload` - Payload cap; longer frames are a wire error.
///
/// # Returns
///
/// `Ok(Some(frame))` on success, `Ok(None)` on a clean EOF at a frame
/// boundary.
///
/// # Errors
///
/// Returns `HarnessError::Wire` on malformed headers, oversize payloads,
/// truncation mid-frame, or unknown control opcodes; `HarnessError::Socket`
/// on read failure.
pub fn read_frame<R: Read>(reader: &mut R, max_payload: u32) -> Result<Option<Frame>> {
    let mut header_buf = [0u8; FRAME_HEADER_LEN];
    match read_exact_or_eof(reader, &mut header_buf)? {
        ReadOutcome::Eof => return Ok(None),
        ReadOutcome::Truncated => {
            return Err(HarnessError::Wire("truncated header".to_string()));
        }
        ReadOutcome::Full => {}
    }

    let header = PacketHeader::decode(&header_buf)?;
    if header.len > max_payload {
        return Err(HarnessError::Wire(format!(
            "payload {} exceeds cap {}",
            header.len, max_payload
        )));
    }

    let mut payload = vec![0u8; header.len as usize];
    reader
        .read_exact(&mut payload)
        .map_err(|_| HarnessError::Wire("truncated payload".to_string()))?;

    if header.flags & FLAG_CONTROL != 0 {
        if payload.len() != 1 {
            return Err(HarnessError::Wire(format!(
                "control frame with {}-byte payload",
                payload.len()
            )));
        }
        return match payload[0] {
            CTRL_HELLO => Ok(Some(Frame::Hello(header.src))),
            CTRL_GOODBYE => Ok(Some(Frame::Goodbye(header.src))),
            op => Err(HarnessError::Wire(format!("unknown control opcode {op:#04x}"))),
        };
    }

    Ok(Some(Frame::Data(Packet {
        src: header.src,
        dst: header.dst,
        payload,
    })))
}

enum ReadOutcome {
    Full,
    Eof,
    Truncated,
}

/// Reads exactly `buf.len()` bytes, distinguishing clean EOF from truncation.
fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<ReadOutcome> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            return Ok(if filled == 0 {
                ReadOutcome::Eof
            } else {
                ReadOutcome::Truncated
            });
        }
        filled += n;
    }
    Ok(ReadOutcome::Full)
}
