//! Structured pipeline events, written to a caller-supplied sink.
//!
//! The engine never logs on its own; it reports what it did through an
//! [`EventSink`] the caller provides. `NullSink` drops everything,
//! `CollectSink` keeps events for inspection, and `LogSink` forwards to
//! the `log` facade for callers that already run a logger.

use serde::{Deserialize, Serialize};

/// Pipeline progress, in order. `Failed` is reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Detecting,
    ProfileLoaded,
    Segmenting,
    Resolving,
    Reconciling,
    Scoring,
    Done,
    Failed,
}

/// Which representation of the statement a transaction set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    Text,
    Rows,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractEvent {
    StateChanged(PipelineState),
    /// The table header line segmentation starts after.
    HeaderLocated { line: usize },
    /// A candidate block was dropped instead of aborting the run.
    BlockDiscarded { line: usize, reason: &'static str },
    /// The winning extraction strategy and its completeness confidence.
    StrategySelected {
        method: ExtractionMethod,
        confidence: f64,
        count: usize,
    },
    /// An observed balance disagreed with the reconciled running total.
    BalanceMismatch { detail: String },
    Finished { count: usize, accuracy: f64 },
}

pub trait EventSink {
    fn emit(&mut self, event: ExtractEvent);
}

/// Discards every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: ExtractEvent) {}
}

/// Collects events in memory for inspection.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub events: Vec<ExtractEvent>,
}

impl CollectSink {
    pub fn states(&self) -> Vec<PipelineState> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ExtractEvent::StateChanged(s) => Some(*s),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for CollectSink {
    fn emit(&mut self, event: ExtractEvent) {
        self.events.push(event);
    }
}

/// Forwards events to the `log` facade. The core configures no logger;
/// whatever the host application installed receives these.
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: ExtractEvent) {
        match &event {
            ExtractEvent::StateChanged(state) => log::debug!("pipeline state: {state:?}"),
            ExtractEvent::HeaderLocated { line } => log::debug!("header found at line {line}"),
            ExtractEvent::BlockDiscarded { line, reason } => {
                log::debug!("discarded block at line {line}: {reason}")
            }
            ExtractEvent::StrategySelected {
                method,
                confidence,
                count,
            } => log::info!(
                "using {method:?} extraction ({confidence:.0}% confidence, {count} txns)",
                confidence = confidence * 100.0
            ),
            ExtractEvent::BalanceMismatch { detail } => log::warn!("{detail}"),
            ExtractEvent::Finished { count, accuracy } => {
                log::info!("extracted {count} transactions, accuracy {accuracy:.1}")
            }
        }
    }
}
