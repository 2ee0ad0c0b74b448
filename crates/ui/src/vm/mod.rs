mod calc_list_vm;
mod log_vm;
mod time_fmt;

pub use calc_list_vm::{CalcRowVm, CalcStatusVm, OutputRowVm, map_calc_rows, map_output_rows};
pub use log_vm::{LogRowVm, Tone, format_log_line};
pub use time_fmt::{format_engine_time, format_log_time};
