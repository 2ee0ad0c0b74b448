use calc_core::model::{CalcStatus, LogLine, RunState};
use engine::ApiError;
use tracing::{info, warn};

use super::config::{Cadence, PollConfig, StripeRule};
use super::sink::{LogSink, PollEvent, RenderedLine};

/// Why a session stopped polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Finished,
    NotFound,
    /// A request failed with anything other than 404.
    Failed,
    /// `stop` was called.
    Cancelled,
}

/// What the driver must do after a response has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Request log lines from the cursor, right away.
    Fetch,
    CheckStatus,
    /// Sleep, then fetch.
    Wait(Cadence),
    Stop(StopReason),
}

/// Poll-cycle decisions for one calculation.
///
/// Consumes fetch/status results, renders through the sink and says what
/// to do next. Holds no I/O, so every transition is unit-testable.
#[derive(Debug, Clone)]
pub struct PollMachine {
    cursor: u64,
    run_state: RunState,
    lines_rendered: u64,
    stripe_counter: u64,
    stripe_rule: StripeRule,
    drain_on_finish: bool,
    last_batch_len: usize,
    banner_pending: bool,
}

impl PollMachine {
    #[must_use]
    pub fn new(assumed_running: bool, config: &PollConfig) -> Self {
        Self {
            cursor: 0,
            run_state: RunState::from_assumed(assumed_running),
            lines_rendered: 0,
            stripe_counter: 0,
            stripe_rule: config.stripe_rule,
            drain_on_finish: config.drain_on_finish,
            last_batch_len: 0,
            banner_pending: false,
        }
    }

    #[must_use]
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    #[must_use]
    pub fn lines_rendered(&self) -> u64 {
        self.lines_rendered
    }

    /// Apply the result of a log fetch issued at the current cursor.
    pub fn on_log_batch(
        &mut self,
        result: Result<Vec<LogLine>, ApiError>,
        sink: &dyn LogSink,
    ) -> Step {
        let lines = match result {
            Ok(lines) => lines,
            Err(err) if self.banner_pending => return self.drain_failed(&err, sink),
            Err(err) => return Self::fail(err, sink),
        };

        let count = lines.len();
        self.last_batch_len = count;
        for line in lines {
            self.render_line(line, sink);
        }
        self.cursor += count as u64;

        match self.run_state {
            RunState::Finished => {
                if std::mem::take(&mut self.banner_pending) {
                    sink.render(PollEvent::Finished);
                }
                Step::Stop(StopReason::Finished)
            }
            RunState::Unknown => Step::CheckStatus,
            RunState::Running if count == 0 => Step::CheckStatus,
            RunState::Running => Step::Wait(Cadence::Fast),
        }
    }

    /// Apply the result of a status check.
    pub fn on_status(
        &mut self,
        result: Result<CalcStatus, ApiError>,
        sink: &dyn LogSink,
    ) -> Step {
        let status = match result {
            Ok(status) => status,
            Err(err) => return Self::fail(err, sink),
        };

        if status.is_running {
            self.run_state = RunState::Running;
            if self.last_batch_len == 0 {
                sink.render(PollEvent::StillRunning);
                return Step::Wait(Cadence::Slow);
            }
            return Step::Wait(Cadence::Fast);
        }

        self.run_state = RunState::Finished;
        if self.drain_on_finish {
            self.banner_pending = true;
            return Step::Fetch;
        }
        sink.render(PollEvent::Finished);
        Step::Stop(StopReason::Finished)
    }

    fn render_line(&mut self, line: LogLine, sink: &dyn LogSink) {
        let stripe = u8::from(self.stripe_counter % 2 == 1);
        let advances = match self.stripe_rule {
            StripeRule::AllLines => true,
            StripeRule::NonBlank => !line.is_blank(),
        };
        if advances {
            self.stripe_counter += 1;
        }
        self.lines_rendered += 1;
        sink.render(PollEvent::Line(RenderedLine { line, stripe }));
    }

    /// The engine already reported completion; a failed last fetch only
    /// loses trailing lines.
    fn drain_failed(&mut self, err: &ApiError, sink: &dyn LogSink) -> Step {
        warn!(error = %err, "final log fetch failed");
        self.banner_pending = false;
        sink.render(PollEvent::Finished);
        Step::Stop(StopReason::Finished)
    }

    fn fail(err: ApiError, sink: &dyn LogSink) -> Step {
        if err.is_not_found() {
            info!("calculation not found, polling stopped");
            sink.render(PollEvent::NotFound);
            return Step::Stop(StopReason::NotFound);
        }
        warn!(error = %err, "engine request failed, polling stopped");
        sink.render(PollEvent::TransientFetchError(err.to_string()));
        Step::Stop(StopReason::Failed)
    }
}
