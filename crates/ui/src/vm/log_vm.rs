use calc_core::model::{LogLevel, LogLine};
use services::PollEvent;

use crate::vm::time_fmt::format_log_time;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Warning,
    Error,
    Banner,
    Muted,
}

/// One printable row of the log view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRowVm {
    pub text: String,
    /// Set for log lines only.
    pub stripe: Option<u8>,
    pub tone: Tone,
}

impl LogRowVm {
    #[must_use]
    pub fn is_still_running(&self) -> bool {
        self.tone == Tone::Muted
    }
}

impl From<&PollEvent> for LogRowVm {
    fn from(event: &PollEvent) -> Self {
        match event {
            PollEvent::Line(rendered) => Self {
                text: format_log_line(&rendered.line),
                stripe: Some(rendered.stripe),
                tone: tone_for(rendered.line.level()),
            },
            PollEvent::NotFound => Self {
                text: "Calculation not found.".into(),
                stripe: None,
                tone: Tone::Error,
            },
            PollEvent::TransientFetchError(reason) => Self {
                text: format!("Could not fetch the calculation log: {reason}"),
                stripe: None,
                tone: Tone::Error,
            },
            PollEvent::Finished => Self {
                text: "Calculation finished.".into(),
                stripe: None,
                tone: Tone::Banner,
            },
            PollEvent::StillRunning => Self {
                text: "(still running)".into(),
                stripe: None,
                tone: Tone::Muted,
            },
        }
    }
}

fn tone_for(level: &LogLevel) -> Tone {
    match level {
        LogLevel::Error | LogLevel::Critical => Tone::Error,
        LogLevel::Warning => Tone::Warning,
        _ => Tone::Plain,
    }
}

#[must_use]
pub fn format_log_line(line: &LogLine) -> String {
    let process = line.process().map(|p| format!(" {p}")).unwrap_or_default();
    format!(
        "{time} [{level:<8}]{process} {message}",
        time = format_log_time(line),
        level = line.level().as_str().to_ascii_uppercase(),
        message = line.message(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::RenderedLine;

    fn line(level: LogLevel, process: Option<&str>) -> LogLine {
        LogLine::new(
            4,
            "2024-05-01T10:00:00.5",
            level,
            process.map(str::to_owned),
            "Reading sources",
        )
    }

    #[test]
    fn formats_line_with_process() {
        assert_eq!(
            format_log_line(&line(LogLevel::Info, Some("MainProcess"))),
            "10:00:00.500 [INFO    ] MainProcess Reading sources"
        );
        assert_eq!(
            format_log_line(&line(LogLevel::Warning, None)),
            "10:00:00.500 [WARNING ] Reading sources"
        );
    }

    #[test]
    fn line_rows_keep_stripe_and_tone() {
        let event = PollEvent::Line(RenderedLine {
            line: line(LogLevel::Critical, None),
            stripe: 1,
        });
        let row = LogRowVm::from(&event);
        assert_eq!(row.stripe, Some(1));
        assert_eq!(row.tone, Tone::Error);
    }

    #[test]
    fn terminal_events_have_distinct_text() {
        let not_found = LogRowVm::from(&PollEvent::NotFound);
        let failed = LogRowVm::from(&PollEvent::TransientFetchError("timeout".into()));
        assert_ne!(not_found.text, failed.text);
        assert!(failed.text.ends_with("timeout"));
        assert_eq!(LogRowVm::from(&PollEvent::Finished).tone, Tone::Banner);
        assert!(LogRowVm::from(&PollEvent::StillRunning).is_still_running());
    }
}
