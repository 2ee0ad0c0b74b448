mod calc;
mod ids;
mod log;
mod output;

pub use calc::{
    CalcAction, CalcActionError, CalcStatus, CalcSummary, ListFilter, RunState,
};
pub use ids::{CalcId, CalcIdError};
pub use log::{LogLevel, LogLine};
pub use output::CalcOutput;
