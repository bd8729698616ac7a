//! Unit tests for the per-tile emulator layer.


/// Process spawn, logging, and termination tests.
pub mod process;
