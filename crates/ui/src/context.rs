use std::{io::Write, sync::Arc};

use services::{CalcService, LogPoller};

use crate::views::{CalcListView, LogViewer, TerminalSink};

pub trait UiApp: Send + Sync {
    fn calc_service(&self) -> Arc<CalcService>;
    fn log_poller(&self) -> Arc<LogPoller>;

    /// Whether output may carry ANSI styling.
    fn styled_output(&self) -> bool;
}

#[derive(Clone)]
pub struct AppContext {
    styled: bool,
    calc_service: Arc<CalcService>,
    log_poller: Arc<LogPoller>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            styled: app.styled_output(),
            calc_service: app.calc_service(),
            log_poller: app.log_poller(),
        }
    }

    #[must_use]
    pub fn styled(&self) -> bool {
        self.styled
    }

    #[must_use]
    pub fn calc_service(&self) -> Arc<CalcService> {
        Arc::clone(&self.calc_service)
    }

    #[must_use]
    pub fn log_poller(&self) -> Arc<LogPoller> {
        Arc::clone(&self.log_poller)
    }

    #[must_use]
    pub fn calc_list(&self) -> CalcListView {
        CalcListView::new(self.calc_service(), self.styled)
    }

    /// A log viewer printing to `out`.
    #[must_use]
    pub fn log_viewer<W>(&self, out: W) -> LogViewer
    where
        W: Write + Send + 'static,
    {
        let sink = Arc::new(TerminalSink::new(out, self.styled));
        LogViewer::new(self.log_poller(), sink)
    }
}

// Provided by the composition root in `crates/app`.

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
