#![forbid(unsafe_code)]

pub mod calc_service;
pub mod error;
pub mod polling;

pub use calc_service::CalcService;
pub use error::CalcServiceError;

pub use polling::{
    Activity, Cadence, LogPoller, LogSink, PollConfig, PollEvent, PollSession, RecordingSink,
    RenderedLine, SessionSnapshot, StopReason, StripeRule,
};
