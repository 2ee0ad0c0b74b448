use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use calc_core::model::{CalcId, RunState};
use engine::EngineApi;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::{Cadence, PollConfig};
use super::machine::{PollMachine, Step, StopReason};
use super::sink::LogSink;

/// What a session is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// A log request is in flight.
    Fetching,
    /// A status request is in flight.
    CheckingStatus,
    /// The next poll is scheduled.
    Waiting(Cadence),
    Stopped(StopReason),
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub calc_id: CalcId,
    pub cursor: u64,
    pub run_state: RunState,
    pub activity: Activity,
    pub lines_rendered: u64,
}

struct SessionState {
    machine: PollMachine,
    activity: Activity,
}

impl SessionState {
    fn is_stopped(&self) -> bool {
        matches!(self.activity, Activity::Stopped(_))
    }
}

struct Shared {
    calc_id: CalcId,
    state: Mutex<SessionState>,
    stopped: watch::Sender<Option<StopReason>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the next activity. Returns the cursor to poll from, or `None`
    /// once the session is stopped.
    fn enter(&self, activity: Activity) -> Option<u64> {
        let mut state = self.lock();
        if state.is_stopped() {
            return None;
        }
        state.activity = activity;
        Some(state.machine.cursor())
    }

    /// Run a transition unless the session was stopped while the request was
    /// in flight. The sink is called inside `f`, under the lock.
    fn apply(&self, f: impl FnOnce(&mut PollMachine) -> Step) -> Option<Step> {
        let mut state = self.lock();
        if state.is_stopped() {
            return None;
        }
        Some(f(&mut state.machine))
    }

    /// Mark the session stopped. The first reason wins.
    fn finish(&self, reason: StopReason) {
        let mut state = self.lock();
        if state.is_stopped() {
            return;
        }
        state.activity = Activity::Stopped(reason);
        drop(state);
        info!(calc_id = %self.calc_id, ?reason, "log polling stopped");
        self.stopped.send_replace(Some(reason));
    }
}

/// Starts poll sessions against an engine.
#[derive(Clone)]
pub struct LogPoller {
    api: Arc<dyn EngineApi>,
    config: PollConfig,
}

impl LogPoller {
    #[must_use]
    pub fn new(api: Arc<dyn EngineApi>, config: PollConfig) -> Self {
        Self { api, config }
    }

    #[must_use]
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Open a session for `calc_id` and issue its first fetch.
    ///
    /// The cursor starts at 0. `assumed_running = false` leaves the run state
    /// unknown until the first status check answers.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start(
        &self,
        calc_id: CalcId,
        assumed_running: bool,
        sink: Arc<dyn LogSink>,
    ) -> PollSession {
        let (stopped, _) = watch::channel(None);
        let shared = Arc::new(Shared {
            calc_id,
            state: Mutex::new(SessionState {
                machine: PollMachine::new(assumed_running, &self.config),
                activity: Activity::Fetching,
            }),
            stopped,
        });
        debug!(calc_id = %shared.calc_id, assumed_running, "log polling started");

        let task = tokio::spawn(drive(
            Arc::clone(&shared),
            Arc::clone(&self.api),
            sink,
            self.config.clone(),
        ));
        PollSession { shared, task }
    }
}

/// Ends the session as failed if the driver unwinds before recording a
/// stop reason. A no-op after a normal stop since the first reason wins.
struct FailOnUnwind(Arc<Shared>);

impl Drop for FailOnUnwind {
    fn drop(&mut self) {
        if std::thread::panicking() {
            warn!(calc_id = %self.0.calc_id, "log polling task panicked");
        }
        self.0.finish(StopReason::Failed);
    }
}

async fn drive(
    shared: Arc<Shared>,
    api: Arc<dyn EngineApi>,
    sink: Arc<dyn LogSink>,
    config: PollConfig,
) {
    let _guard = FailOnUnwind(Arc::clone(&shared));
    let mut step = Step::Fetch;
    loop {
        let next = match step {
            Step::Fetch => {
                let Some(cursor) = shared.enter(Activity::Fetching) else {
                    return;
                };
                debug!(calc_id = %shared.calc_id, cursor, "fetching log");
                let result = api.fetch_log(&shared.calc_id, cursor).await;
                shared.apply(|machine| machine.on_log_batch(result, sink.as_ref()))
            }
            Step::CheckStatus => {
                if shared.enter(Activity::CheckingStatus).is_none() {
                    return;
                }
                debug!(calc_id = %shared.calc_id, "checking status");
                let result = api.status(&shared.calc_id).await;
                shared.apply(|machine| machine.on_status(result, sink.as_ref()))
            }
            Step::Wait(cadence) => {
                if shared.enter(Activity::Waiting(cadence)).is_none() {
                    return;
                }
                tokio::time::sleep(config.delay(cadence)).await;
                Some(Step::Fetch)
            }
            Step::Stop(reason) => {
                shared.finish(reason);
                return;
            }
        };
        match next {
            Some(next) => step = next,
            None => return,
        }
    }
}

/// Handle on one calculation's log polling.
///
/// Dropping the handle stops the session.
pub struct PollSession {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl PollSession {
    #[must_use]
    pub fn calc_id(&self) -> &CalcId {
        &self.shared.calc_id
    }

    /// Cancel the in-flight request and the scheduled poll, if any.
    ///
    /// Idempotent. Once this returns the sink receives nothing more from
    /// this session.
    pub fn stop(&self) {
        self.shared.finish(StopReason::Cancelled);
        self.task.abort();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shared.lock().is_stopped()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.shared.lock();
        SessionSnapshot {
            calc_id: self.shared.calc_id.clone(),
            cursor: state.machine.cursor(),
            run_state: state.machine.run_state(),
            activity: state.activity,
            lines_rendered: state.machine.lines_rendered(),
        }
    }

    /// Wait until the session reaches a terminal state.
    pub async fn wait(&self) -> StopReason {
        let mut rx = self.shared.stopped.subscribe();
        match rx.wait_for(Option::is_some).await {
            Ok(reason) => (*reason).unwrap_or(StopReason::Cancelled),
            Err(_) => StopReason::Cancelled,
        }
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for PollSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollSession")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}
