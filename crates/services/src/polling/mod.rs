//! Incremental polling of a calculation's log and status.
//!
//! `machine` holds the per-cycle decisions and is free of I/O; `session`
//! drives it from a tokio task and owns cancellation.

mod config;
mod machine;
mod session;
mod sink;

pub use config::{Cadence, PollConfig, StripeRule, StripeRuleError};
pub use machine::{PollMachine, Step, StopReason};
pub use session::{Activity, LogPoller, PollSession, SessionSnapshot};
pub use sink::{LogSink, PollEvent, RecordingSink, RenderedLine};
