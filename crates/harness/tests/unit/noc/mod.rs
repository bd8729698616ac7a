//! Unit tests for the NoC layer.
