use std::sync::{Arc, Mutex, PoisonError};

use calc_core::model::LogLine;

/// A log line with its display stripe (0 or 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub line: LogLine,
    pub stripe: u8,
}

/// Render instructions handed to the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Line(RenderedLine),
    /// The calculation id is unknown to the engine. Terminal.
    NotFound,
    /// A request failed for any other reason. Terminal for the session.
    TransientFetchError(String),
    /// The calculation has finished. Terminal.
    Finished,
    /// Nothing new yet; the calculation is still running.
    StillRunning,
}

impl PollEvent {
    #[must_use]
    pub fn as_line(&self) -> Option<&RenderedLine> {
        match self {
            PollEvent::Line(rendered) => Some(rendered),
            _ => None,
        }
    }
}

/// Receives render instructions from a poll session.
///
/// Called with the session lock held, so implementations must not call back
/// into the session that is rendering.
pub trait LogSink: Send + Sync {
    fn render(&self, event: PollEvent);
}

/// Sink that keeps every event; useful for tests and for buffering.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<PollEvent>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<PollEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<RenderedLine> {
        self.events()
            .iter()
            .filter_map(PollEvent::as_line)
            .cloned()
            .collect()
    }
}

impl LogSink for RecordingSink {
    fn render(&self, event: PollEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
