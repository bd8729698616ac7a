//! BEGIN/END span pairing.
//!
//! Each `(tile, core)` pair keeps its own stack of open BEGIN records; an END
//! closes the innermost one. Pairing faults are collected as diagnostics
//! rather than hard errors so one buggy firmware print does not discard the
//! rest of a run's timeline.

use std::collections::HashMap;

use crate::common::id::{CoreId, TileId};
use crate::trace::record::{TagMark, TraceRecord};

/// A closed interval of firmware activity on one core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Tile the span ran on.
    pub tile: TileId,
    /// Core the span ran on.
    pub core: CoreId,
    /// Span label.
    pub label: String,
    /// Start timestamp in cycles.
    pub start: u64,
    /// End timestamp in cycles.
    pub end: u64,
}

/// A pairing fault observed while building spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An END arrived with no open span on its core.
    EndWithoutBegin {
        /// Emitting tile.
        tile: TileId,
        /// Emitting core.
        core: CoreId,
        /// Label of the stray END.
        label: String,
        /// Timestamp of the stray END.
        ts: u64,
    },
    /// An END closed a span opened under a different label.
    LabelMismatch {
        /// Emitting tile.
        tile: TileId,
        /// Emitting core.
        core: CoreId,
        /// Label the innermost open span was opened with.
        opened: String,
        /// Label the END carried.
        closed: String,
        /// Timestamp of the END.
        ts: u64,
    },
    /// A span was still open at end of input; it was closed at the core's
    /// last seen timestamp.
    Unclosed {
        /// Emitting tile.
        tile: TileId,
        /// Emitting core.
        core: CoreId,
        /// Label of the unclosed span.
        label: String,
        /// Timestamp the span was opened at.
        opened_at: u64,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndWithoutBegin {
                tile,
                core,
                label,
                ts,
            } => write!(
                f,
                "{tile}/{core}: END '{label}' at {ts} with no open span"
            ),
            Self::LabelMismatch {
                tile,
                core,
                opened,
                closed,
                ts,
            } => write!(
                f,
                "{tile}/{core}: END '{closed}' at {ts} closed span opened as '{opened}'"
            ),
            Self::Unclosed {
                tile,
                core,
                label,
                opened_at,
            } => write!(
                f,
                "{tile}/{core}: span '{label}' opened at {opened_at} never closed"
            ),
        }
    }
}

/// Per-core pairing state.
#[derive(Debug, Default)]
struct CoreState {
    open: Vec<(String, u64)>,
    last_ts: u64,
}

/// Incremental span builder.
///
/// Feed records in log order with [`SpanBuilder::push`], then call
/// [`SpanBuilder::finish`].
#[derive(Debug, Default)]
pub struct SpanBuilder {
    cores: HashMap<(TileId, CoreId), CoreState>,
    spans: Vec<Span>,
    diagnostics: Vec<Diagnostic>,
}

impl SpanBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one record into the pairing state.
    pub fn push(&mut self, record: TraceRecord) {
        let state = self
            .cores
            .entry((record.tile, record.core))
            .or_default();
        state.last_ts = state.last_ts.max(record.ts);

        match record.mark {
            TagMark::Begin => {
                state.open.push((record.label, record.ts));
            }
            TagMark::End => match state.open.pop() {
                Some((opened, start)) => {
                    if opened != record.label {
                        self.diagnostics.push(Diagnostic::LabelMismatch {
                            tile: record.tile,
                            core: record.core,
                            opened: opened.clone(),
                            closed: record.label,
                            ts: record.ts,
                        });
                    }
                    self.spans.push(Span {
                        tile: record.tile,
                        core: record.core,
                        label: opened,
                        start,
                        end: record.ts.max(start),
                    });
                }
                None => {
                    self.diagnostics.push(Diagnostic::EndWithoutBegin {
                        tile: record.tile,
                        core: record.core,
                        label: record.label,
                        ts: record.ts,
                    });
                }
            },
        }
    }

    /// Closes remaining open spans at each core's last seen timestamp and
    /// returns all spans plus diagnostics.
    pub fn finish(mut self) -> (Vec<Span>, Vec<Diagnostic>) {
        let mut cores: Vec<_> = self.cores.into_iter().collect();
        cores.sort_by_key(|((tile, core), _)| (*tile, *core));
        for ((tile, core), state) in cores {
            for (label, opened_at) in state.open {
                self.diagnostics.push(Diagnostic::Unclosed {
                    tile,
                    core,
                    label: label.clone(),
                    opened_at,
                });
                self.spans.push(Span {
                    tile,
                    core,
                    label,
                    start: opened_at,
                    end: state.last_ts.max(opened_at),
                });
            }
        }
        (self.spans, self.diagnostics)
    }
}
