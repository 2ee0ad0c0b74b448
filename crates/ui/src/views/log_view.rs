use std::{
    io::Write,
    sync::{Arc, Mutex, PoisonError},
};

use calc_core::model::CalcId;
use services::{LogPoller, LogSink, PollEvent, PollSession, StopReason};
use tracing::warn;

use crate::views::style::paint_row;
use crate::vm::LogRowVm;

// ─── Sink ──────────────────────────────────────────────────────────────────

/// Prints poll events as terminal rows.
///
/// Repeated "still running" notices collapse into one until a new line
/// arrives.
pub struct TerminalSink<W> {
    styled: bool,
    state: Mutex<SinkState<W>>,
}

struct SinkState<W> {
    out: W,
    quiet: bool,
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W, styled: bool) -> Self {
        Self {
            styled,
            state: Mutex::new(SinkState { out, quiet: false }),
        }
    }
}

impl<W: Write + Send> LogSink for TerminalSink<W> {
    fn render(&self, event: PollEvent) {
        let row = LogRowVm::from(&event);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if row.is_still_running() {
            if state.quiet {
                return;
            }
            state.quiet = true;
        } else {
            state.quiet = false;
        }

        let text = paint_row(&row, self.styled);
        if let Err(err) = writeln!(state.out, "{text}").and_then(|()| state.out.flush()) {
            warn!(error = %err, "failed to write log row");
        }
    }
}

// ─── Viewer ────────────────────────────────────────────────────────────────

/// Shows the log of one calculation at a time.
pub struct LogViewer {
    poller: Arc<LogPoller>,
    sink: Arc<dyn LogSink>,
    session: Option<PollSession>,
}

impl LogViewer {
    #[must_use]
    pub fn new(poller: Arc<LogPoller>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            poller,
            sink,
            session: None,
        }
    }

    /// Start following `calc_id`, replacing whatever was shown before.
    ///
    /// The previous session is stopped before the new one starts, so its
    /// rows never interleave with the new calculation's.
    pub fn show(&mut self, calc_id: CalcId, assumed_running: bool) -> &PollSession {
        self.close();
        self.session.insert(
            self.poller
                .start(calc_id, assumed_running, Arc::clone(&self.sink)),
        )
    }

    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.stop();
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&PollSession> {
        self.session.as_ref()
    }

    /// Wait for the current session to end; `None` when nothing is shown.
    pub async fn wait(&self) -> Option<StopReason> {
        match &self.session {
            Some(session) => Some(session.wait().await),
            None => None,
        }
    }
}
