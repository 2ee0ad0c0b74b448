use chrono::NaiveDateTime;

//
// ─── LOG LEVEL ────────────────────────────────────────────────────────────────
//

/// Severity attached to a calculation log record.
///
/// The engine emits lowercase level names. Anything outside the known set is
/// preserved verbatim in `Other` so nothing the server says is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    Other(String),
}

impl LogLevel {
    /// Parses a level name, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warning,
            "error" => Self::Error,
            "critical" | "fatal" => Self::Critical,
            _ => Self::Other(raw.trim().to_owned()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
            LogLevel::Other(raw) => raw,
        }
    }

    /// True for warning and above.
    #[must_use]
    pub fn is_problem(&self) -> bool {
        matches!(self, Self::Warning | Self::Error | Self::Critical)
    }
}

//
// ─── LOG LINE ─────────────────────────────────────────────────────────────────
//

/// One record of a calculation log.
///
/// `seq` is the 0-based position of the record in the calculation log. It is
/// derived from the cursor the record was fetched at, so it is strictly
/// increasing across batches of the same calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    seq: u64,
    timestamp: String,
    level: LogLevel,
    process: Option<String>,
    message: String,
}

impl LogLine {
    #[must_use]
    pub fn new(
        seq: u64,
        timestamp: impl Into<String>,
        level: LogLevel,
        process: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            seq,
            timestamp: timestamp.into(),
            level,
            process,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The timestamp as sent by the engine.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    #[must_use]
    pub fn level(&self) -> &LogLevel {
        &self.level
    }

    #[must_use]
    pub fn process(&self) -> Option<&str> {
        self.process.as_deref()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the message carries no visible text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.message.trim().is_empty()
    }

    /// Parses the engine timestamp (ISO 8601, fractional seconds optional,
    /// no zone). Returns `None` for anything else.
    #[must_use]
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        let raw = self.timestamp.trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn level_parsing_is_case_insensitive() {
        assert_eq!(LogLevel::parse("INFO"), LogLevel::Info);
        assert_eq!(LogLevel::parse("warn"), LogLevel::Warning);
        assert_eq!(LogLevel::parse("Critical"), LogLevel::Critical);
        assert_eq!(LogLevel::parse("progress"), LogLevel::Other("progress".into()));
        assert_eq!(LogLevel::Other("progress".into()).as_str(), "progress");
    }

    #[test]
    fn problem_levels() {
        assert!(!LogLevel::Info.is_problem());
        assert!(LogLevel::Warning.is_problem());
        assert!(LogLevel::Critical.is_problem());
    }

    #[test]
    fn parses_truncated_engine_timestamps() {
        let line = LogLine::new(0, "2015-03-10T12:34:56.12", LogLevel::Info, None, "x");
        let ts = line.parsed_timestamp().expect("timestamp parses");
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.second(), 56);
        assert_eq!(ts.nanosecond(), 120_000_000);

        let plain = LogLine::new(0, "2015-03-10T12:34:56", LogLevel::Info, None, "x");
        assert!(plain.parsed_timestamp().is_some());

        let junk = LogLine::new(0, "yesterday", LogLevel::Info, None, "x");
        assert!(junk.parsed_timestamp().is_none());
    }

    #[test]
    fn blank_detection_ignores_whitespace() {
        assert!(LogLine::new(0, "", LogLevel::Info, None, "  \t").is_blank());
        assert!(!LogLine::new(0, "", LogLevel::Info, None, " a ").is_blank());
    }
}
