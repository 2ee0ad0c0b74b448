mod calc_list;
mod log_view;
mod state;
mod style;

pub use calc_list::{
    CalcListView, render_calc_table, render_results_table, render_status, render_traceback,
};
pub use log_view::{LogViewer, TerminalSink};
pub use state::ViewError;
