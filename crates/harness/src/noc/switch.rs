//! Routing-table-driven TCP switch.
//!
//! The switch is the host-side stand-in for the NoC fabric. It runs one TCP
//! listener per routed tile endpoint, so the port a connection arrives on
//! identifies the tile. Frames are decoded on a per-connection reader thread
//! and handed to the destination tile's writer thread over a channel. It
//! provides:
//! 1. **Registration:** HELLO handshake verified against the owning endpoint.
//! 2. **Forwarding:** Data frames routed by destination tile id; loopback included.
//! 3. **Containment:** Wire faults and unknown destinations are counted and
//!    logged, never fatal to the switch.
//! 4. **Shutdown:** Listener wake-up, connection teardown, and thread joining.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::common::constants::WRITER_QUEUE_DEPTH;
use crate::common::error::{HarnessError, Result};
use crate::common::id::TileId;
use crate::noc::packet::{Frame, Packet, read_frame, write_frame};
use crate::routing::RoutingTable;

/// Snapshot of switch counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchStats {
    /// Data packets forwarded.
    pub packets: u64,
    /// Payload bytes forwarded.
    pub bytes: u64,
    /// Data packets dropped (unrouted or not-connected destination).
    pub drops: u64,
}

#[derive(Debug, Default)]
struct Counters {
    packets: AtomicU64,
    bytes: AtomicU64,
    drops: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> SwitchStats {
        SwitchStats {
            packets: self.packets.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
        }
    }
}

/// Mutable switch state shared between threads.
#[derive(Debug, Default)]
struct Registry {
    /// Writer channel per registered (HELLO'd) tile.
    senders: HashMap<TileId, SyncSender<Packet>>,
    /// Clones of live connection streams, kept for shutdown wake-up.
    streams: Vec<TcpStream>,
    /// Reader and writer threads spawned for connections.
    workers: Vec<JoinHandle<()>>,
}

#[derive(Debug)]
struct Shared {
    routing: RoutingTable,
    registry: Mutex<Registry>,
    counters: Counters,
    stop: AtomicBool,
    max_payload: u32,
}

/// NoC switch binder.
#[derive(Debug)]
pub struct Switch;

impl Switch {
    /// Binds one listener per routed tile endpoint and starts accepting.
    ///
    /// The listener port comes from the routing table; port 0 binds an
    /// ephemeral port (query it with [`SwitchHandle::local_addr`]).
    ///
    /// # Arguments
    ///
    /// * `bind_host` - Local address the listeners bind to.
    /// * `routing` - Routing table; one listener per entry.
    /// * `max_payload` - Frame payload cap in bytes.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Socket` if any endpoint cannot be bound.
    pub fn bind(bind_host: &str, routing: RoutingTable, max_payload: u32) -> Result<SwitchHandle> {
        let mut listeners = Vec::new();
        for entry in routing.tiles() {
            let listener = TcpListener::bind((bind_host, entry.endpoint.port))?;
            let addr = listener.local_addr()?;
            debug!(tile = %entry.tile_id, %addr, "switch endpoint bound");
            listeners.push((entry.tile_id, listener, addr));
        }

        let shared = Arc::new(Shared {
            routing,
            registry: Mutex::new(Registry::default()),
            counters: Counters::default(),
            stop: AtomicBool::new(false),
            max_payload,
        });

        let mut accept_threads = Vec::new();
        let mut addrs = HashMap::new();
        for (tile, listener, addr) in listeners {
            let _ = addrs.insert(tile, addr);
            let shared = Arc::clone(&shared);
            accept_threads.push(std::thread::spawn(move || accept_loop(tile, &listener, &shared)));
        }

        info!(endpoints = addrs.len(), "noc switch up");
        Ok(SwitchHandle {
            shared,
            addrs,
            accept_threads,
        })
    }
}

/// Handle to a running switch.
///
/// Dropping the handle shuts the switch down.
#[derive(Debug)]
pub struct SwitchHandle {
    shared: Arc<Shared>,
    addrs: HashMap<TileId, SocketAddr>,
    accept_threads: Vec<JoinHandle<()>>,
}

impl SwitchHandle {
    /// Returns the bound listener address for a tile's endpoint.
    pub fn local_addr(&self, tile: TileId) -> Option<SocketAddr> {
        self.addrs.get(&tile).copied()
    }

    /// Returns a snapshot of the forwarding counters.
    pub fn stats(&self) -> SwitchStats {
        self.shared.counters.snapshot()
    }

    /// Stops accepting, disconnects all tiles, and joins all threads.
    ///
    /// Idempotent; also invoked on drop.
    pub fn shutdown(&mut self) {
        if self.shared.stop.swap(true, Ordering::SeqCst) {
            return;
        }

        // Wake each accept loop; the connect is discarded immediately.
        for addr in self.addrs.values() {
            let _ = TcpStream::connect(addr);
        }
        for handle in self.accept_threads.drain(..) {
            let _ = handle.join();
        }

        let (streams, workers) = {
            let mut registry = match self.shared.registry.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            registry.senders.clear();
            (
                std::mem::take(&mut registry.streams),
                std::mem::take(&mut registry.workers),
            )
        };
        for stream in streams {
            let _ = stream.shutdown(Shutdown::Both);
        }
        for handle in workers {
            let _ = handle.join();
        }

        let stats = self.shared.counters.snapshot();
        info!(
            packets = stats.packets,
            bytes = stats.bytes,
            drops = stats.drops,
            "noc switch down"
        );
    }
}

impl Drop for SwitchHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Accepts connections for one tile endpoint until stop is requested.
fn accept_loop(tile: TileId, listener: &TcpListener, shared: &Arc<Shared>) {
    loop {
        let stream = match listener.accept() {
            Ok((stream, _)) => stream,
            Err(e) => {
                if shared.stop.load(Ordering::SeqCst) {
                    return;
                }
                warn!(tile = %tile, error = %e, "accept failed");
                continue;
            }
        };
        if shared.stop.load(Ordering::SeqCst) {
            return;
        }

        let shared = Arc::clone(shared);
        let clone = match stream.try_clone() {
            Ok(c) => c,
            Err(e) => {
                warn!(tile = %tile, error = %e, "could not clone connection");
                continue;
            }
        };
        let worker_shared = Arc::clone(&shared);
        let handle = std::thread::spawn(move || connection_loop(tile, stream, &worker_shared));
        let mut registry = match shared.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        registry.streams.push(clone);
        registry.workers.push(handle);
    }
}

/// Services one tile connection: handshake, then forward until EOF.
fn connection_loop(tile: TileId, mut stream: TcpStream, shared: &Arc<Shared>) {
    match handshake(tile, &mut stream, shared) {
        Ok(true) => {}
        Ok(false) => return,
        Err(e) => {
            warn!(tile = %tile, error = %e, "handshake failed");
            let _ = stream.shutdown(Shutdown::Both);
            return;
        }
    }

    loop {
        match read_frame(&mut stream, shared.max_payload) {
            Ok(Some(Frame::Data(packet))) => forward(packet, shared),
            Ok(Some(Frame::Goodbye(src))) => {
                debug!(tile = %src, "goodbye");
                break;
            }
            Ok(Some(Frame::Hello(src))) => {
                warn!(tile = %src, "unexpected repeated HELLO");
            }
            Ok(None) => break,
            Err(e) => {
                if !shared.stop.load(Ordering::SeqCst) {
                    warn!(tile = %tile, error = %e, "dropping connection");
                }
                break;
            }
        }
    }

    let mut registry = match shared.registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let _ = registry.senders.remove(&tile);
    debug!(tile = %tile, "disconnected");
}

/// Performs the HELLO handshake and registers the tile's writer thread.
///
/// Returns `Ok(false)` on clean EOF before any frame.
fn handshake(tile: TileId, stream: &mut TcpStream, shared: &Arc<Shared>) -> Result<bool> {
    let frame = match read_frame(stream, shared.max_payload)? {
        Some(frame) => frame,
        None => return Ok(false),
    };
    let src = match frame {
        Frame::Hello(src) => src,
        other => {
            return Err(HarnessError::Wire(format!(
                "expected HELLO, got frame from {}",
                other.src()
            )));
        }
    };
    if src != tile {
        return Err(HarnessError::Wire(format!(
            "HELLO from {src} on endpoint owned by {tile}"
        )));
    }

    let (tx, rx) = sync_channel(WRITER_QUEUE_DEPTH);
    let write_half = stream.try_clone()?;
    let writer = std::thread::spawn(move || writer_loop(tile, write_half, &rx));

    let mut registry = match shared.registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if registry.senders.insert(tile, tx).is_some() {
        warn!(tile = %tile, "replacing a live registration");
    }
    registry.workers.push(writer);
    info!(tile = %tile, "registered");
    Ok(true)
}

/// Routes one data packet to its destination's writer, or counts a drop.
fn forward(packet: Packet, shared: &Arc<Shared>) {
    if shared.routing.lookup(packet.dst).is_none() {
        let _ = shared.counters.drops.fetch_add(1, Ordering::Relaxed);
        warn!(src = %packet.src, dst = %packet.dst, "drop: unrouted destination");
        return;
    }

    let sender = {
        let registry = match shared.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        registry.senders.get(&packet.dst).cloned()
    };

    let Some(sender) = sender else {
        let _ = shared.counters.drops.fetch_add(1, Ordering::Relaxed);
        debug!(src = %packet.src, dst = %packet.dst, "drop: destination not connected");
        return;
    };

    let bytes = packet.payload.len() as u64;
    if sender.send(packet).is_ok() {
        let _ = shared.counters.packets.fetch_add(1, Ordering::Relaxed);
        let _ = shared.counters.bytes.fetch_add(bytes, Ordering::Relaxed);
    } else {
        let _ = shared.counters.drops.fetch_add(1, Ordering::Relaxed);
    }
}

/// Drains a tile's channel into its write half until the channel closes.
fn writer_loop(tile: TileId, mut stream: TcpStream, rx: &Receiver<Packet>) {
    while let Ok(packet) = rx.recv() {
        if let Err(e) = write_frame(&mut stream, &Frame::Data(packet)) {
            if !matches!(
                &e,
                HarnessError::Socket(io) if io.kind() == ErrorKind::BrokenPipe
            ) {
                warn!(tile = %tile, error = %e, "write failed");
            }
            break;
        }
    }
    let _ = stream.shutdown(Shutdown::Both);
}
