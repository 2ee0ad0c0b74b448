use calc_core::model::LogLine;

/// Wall-clock part of a log timestamp (`HH:MM:SS.mmm`), or the raw value
/// when the engine sent something unparsable.
#[must_use]
pub fn format_log_time(line: &LogLine) -> String {
    line.parsed_timestamp().map_or_else(
        || line.timestamp().trim().to_owned(),
        |ts| ts.format("%H:%M:%S%.3f").to_string(),
    )
}

/// Engine start/stop times arrive as `YYYY-MM-DD HH:MM:SS[.ffffff]`; keep
/// them to the second.
#[must_use]
pub fn format_engine_time(raw: &str) -> String {
    let raw = raw.trim();
    match raw.split_once('.') {
        Some((head, _)) => head.to_owned(),
        None => raw.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calc_core::model::LogLevel;

    #[test]
    fn log_time_is_clock_only() {
        let line = LogLine::new(0, "2024-05-01T10:00:03.25", LogLevel::Info, None, "x");
        assert_eq!(format_log_time(&line), "10:00:03.250");
    }

    #[test]
    fn unparsable_log_time_is_kept() {
        let line = LogLine::new(0, " soon ", LogLevel::Info, None, "x");
        assert_eq!(format_log_time(&line), "soon");
    }

    #[test]
    fn engine_time_drops_fraction() {
        assert_eq!(format_engine_time("2024-05-01 10:00:00.123456"), "2024-05-01 10:00:00");
        assert_eq!(format_engine_time("None"), "None");
    }
}
