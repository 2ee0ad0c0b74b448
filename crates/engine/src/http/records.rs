//! Wire shapes of the engine REST API and their mapping to domain types.

use calc_core::model::{LogLevel, LogLine};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::api::ApiError;

/// A log record as the engine serializes it.
///
/// The engine sends `[timestamp, level, process, message]` rows; the object
/// form is accepted for engines that name their fields.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawLogRow {
    Row(String, String, String, String),
    Record {
        timestamp: String,
        level: String,
        #[serde(default)]
        process: Option<String>,
        message: String,
    },
}

impl RawLogRow {
    pub(crate) fn into_log_line(self, seq: u64) -> LogLine {
        match self {
            RawLogRow::Row(timestamp, level, process, message) => LogLine::new(
                seq,
                timestamp,
                LogLevel::parse(&level),
                non_empty(process),
                message,
            ),
            RawLogRow::Record {
                timestamp,
                level,
                process,
                message,
            } => LogLine::new(
                seq,
                timestamp,
                LogLevel::parse(&level),
                process.and_then(non_empty),
                message,
            ),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

/// Decode a log batch fetched at `cursor`, numbering records from it.
pub(crate) fn decode_log_batch(body: &[u8], cursor: u64) -> Result<Vec<LogLine>, ApiError> {
    let rows: Vec<RawLogRow> = decode(body)?;
    Ok(rows
        .into_iter()
        .zip(cursor..)
        .map(|(row, seq)| row.into_log_line(seq))
        .collect())
}

/// Interpret the reply to an action POST.
///
/// Success bodies are `{}` or `[]`; failures carry an `error` field, or a
/// list of traceback lines alongside a 5xx status.
pub(crate) fn action_outcome(status: StatusCode, body: &[u8]) -> Result<(), ApiError> {
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound);
    }

    let parsed: Option<Value> = serde_json::from_slice(body).ok();
    match parsed {
        Some(Value::Object(map)) => {
            if let Some(error) = map.get("error").and_then(Value::as_str) {
                return Err(ApiError::Rejected(error.to_owned()));
            }
        }
        Some(Value::Array(lines)) if !status.is_success() && !lines.is_empty() => {
            let message = lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n");
            return Err(ApiError::Rejected(message));
        }
        _ => {}
    }

    if !status.is_success() {
        return Err(ApiError::HttpStatus(status));
    }
    Ok(())
}

/// The version endpoint answers with a JSON string or bare text.
pub(crate) fn decode_version(body: &str) -> Result<String, ApiError> {
    let version = serde_json::from_str::<String>(body)
        .unwrap_or_else(|_| body.trim().to_owned());
    if version.is_empty() {
        return Err(ApiError::Decode("empty engine version".into()));
    }
    Ok(version)
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_numbered_from_the_cursor() {
        let body = br#"[
            ["2015-03-10T12:00:00.00", "info", "MainProcess", "starting"],
            ["2015-03-10T12:00:01.00", "WARNING", "", "slow source"]
        ]"#;
        let lines = decode_log_batch(body, 7).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].seq(), 7);
        assert_eq!(lines[0].process(), Some("MainProcess"));
        assert_eq!(lines[1].seq(), 8);
        assert_eq!(lines[1].level(), &LogLevel::Warning);
        assert_eq!(lines[1].process(), None);
        assert_eq!(lines[1].message(), "slow source");
    }

    #[test]
    fn object_records_are_accepted() {
        let body = br#"[{"timestamp": "t", "level": "error", "message": "boom"}]"#;
        let lines = decode_log_batch(body, 0).unwrap();
        assert_eq!(lines[0].level(), &LogLevel::Error);
        assert_eq!(lines[0].message(), "boom");
    }

    #[test]
    fn empty_batch_decodes_to_nothing() {
        assert!(decode_log_batch(b"[]", 12).unwrap().is_empty());
    }

    #[test]
    fn malformed_batch_is_a_decode_error() {
        let err = decode_log_batch(br#"{"rows": []}"#, 0).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn action_success_bodies() {
        assert!(action_outcome(StatusCode::OK, b"{}").is_ok());
        assert!(action_outcome(StatusCode::OK, b"[]").is_ok());
        assert!(action_outcome(StatusCode::OK, b"").is_ok());
    }

    #[test]
    fn action_error_field_is_rejected() {
        let err = action_outcome(StatusCode::OK, br#"{"error": "not running"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Rejected(msg) if msg == "not running"));
    }

    #[test]
    fn action_traceback_is_rejected() {
        let err = action_outcome(
            StatusCode::INTERNAL_SERVER_ERROR,
            br#"["Traceback", "KeyError: 3"]"#,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(msg) if msg == "Traceback\nKeyError: 3"));
    }

    #[test]
    fn action_status_errors() {
        assert!(action_outcome(StatusCode::NOT_FOUND, b"").unwrap_err().is_not_found());
        assert!(matches!(
            action_outcome(StatusCode::FORBIDDEN, b"").unwrap_err(),
            ApiError::HttpStatus(StatusCode::FORBIDDEN)
        ));
    }

    #[test]
    fn version_accepts_json_or_text() {
        assert_eq!(decode_version("\"3.11.2\"").unwrap(), "3.11.2");
        assert_eq!(decode_version("3.11.2\n").unwrap(), "3.11.2");
        assert!(decode_version("  ").is_err());
    }
}
