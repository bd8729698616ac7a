//! Emulator command-line construction.
//!
//! Builds the argv for one tile's emulator instance. The shape matches the
//! QEMU invocation used by the functional-simulation methodology: the tile id
//! is injected with `-global`, and the NoC link is a socket character device
//! wired to the tile's serial port:
//!
//! ```text
//! qemu-system-riscv64 -machine tile-fn -smp 2 -kernel fw/tile0.elf \
//!     -nographic -global tile.id=0 \
//!     -chardev socket,id=noc,host=127.0.0.1,port=6000 -serial chardev:noc
//! ```

use crate::tile::TileSpec;

/// Argv builder for one tile's emulator process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileCommand {
    /// Emulator binary name or path.
    pub emulator: String,
    /// Emulator machine model (`-machine`).
    pub machine: String,
    /// Tile being launched.
    pub spec: TileSpec,
}

impl TileCommand {
    /// Creates a command builder for a tile.
    ///
    /// # Arguments
    ///
    /// * `emulator` - Emulator binary name or path.
    /// * `machine` - Machine model passed to `-machine`.
    /// * `spec` - The tile's deployment spec.
    pub fn new(emulator: impl Into<String>, machine: impl Into<String>, spec: TileSpec) -> Self {
        Self {
            emulator: emulator.into(),
            machine: machine.into(),
            spec,
        }
    }

    /// Returns the program to execute.
    pub fn program(&self) -> &str {
        &self.emulator
    }

    /// Builds the argument list (excluding the program itself).
    pub fn args(&self) -> Vec<String> {
        vec![
            "-machine".to_string(),
            self.machine.clone(),
            "-smp".to_string(),
            self.spec.cpus.to_string(),
            "-kernel".to_string(),
            self.spec.firmware.display().to_string(),
            "-nographic".to_string(),
            "-global".to_string(),
            format!("tile.id={}", self.spec.tile_id.val()),
            "-chardev".to_string(),
            format!(
                "socket,id=noc,host={},port={}",
                self.spec.endpoint.host, self.spec.endpoint.port
            ),
            "-serial".to_string(),
            "chardev:noc".to_string(),
        ]
    }

    /// Renders the full command as a single shell-displayable string.
    ///
    /// Used for logging and for tmux `send-keys`; arguments contain no shell
    /// metacharacters by construction (paths are the only free-form input).
    pub fn display(&self) -> String {
        let mut parts = vec![self.emulator.clone()];
        parts.extend(self.args());
        parts.join(" ")
    }
}
