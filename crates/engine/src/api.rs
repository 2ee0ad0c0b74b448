use async_trait::async_trait;
use calc_core::model::{
    CalcAction, CalcId, CalcOutput, CalcStatus, CalcSummary, ListFilter, LogLevel, LogLine,
};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by engine adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("calculation not found")]
    NotFound,

    #[error("engine request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid engine response: {0}")]
    Decode(String),

    #[error("engine rejected the request: {0}")]
    Rejected(String),

    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("invalid engine url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// The slice of the engine REST API this client consumes.
#[async_trait]
pub trait EngineApi: Send + Sync {
    /// Fetch the log records of a calculation starting at `cursor`.
    ///
    /// An empty vector means no records were written since `cursor`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown calculations, or other transport errors.
    async fn fetch_log(&self, id: &CalcId, cursor: u64) -> Result<Vec<LogLine>, ApiError>;

    /// Fetch the status of a calculation.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown calculations, or other transport errors.
    async fn status(&self, id: &CalcId) -> Result<CalcStatus, ApiError>;

    /// Number of log records written so far.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown calculations, or other transport errors.
    async fn log_size(&self, id: &CalcId) -> Result<u64, ApiError>;

    /// List calculations visible to the client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decoding failures.
    async fn list(&self, filter: &ListFilter) -> Result<Vec<CalcSummary>, ApiError>;

    /// Apply an action to a calculation.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the engine reports an error for the action.
    async fn perform(&self, id: &CalcId, action: CalcAction) -> Result<(), ApiError>;

    /// Exportable outputs of a calculation.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown calculations and, like the
    /// engine, for calculations without outputs yet.
    async fn results(&self, id: &CalcId) -> Result<Vec<CalcOutput>, ApiError>;

    /// Lines of the traceback logged by a failed calculation; empty when
    /// nothing critical was logged.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown calculations, or other transport errors.
    async fn traceback(&self, id: &CalcId) -> Result<Vec<String>, ApiError>;

    /// Version string of the engine.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decoding failures.
    async fn engine_version(&self) -> Result<String, ApiError>;
}

#[derive(Debug, Clone)]
struct StoredCalc {
    summary: CalcSummary,
    lines: Vec<LogLine>,
    outputs: Vec<CalcOutput>,
    shared: bool,
}

/// In-memory engine for tests and offline demos.
///
/// Calculations are listed newest first, like the real engine. Tag and
/// preferred-only filters are ignored since nothing here carries tags.
#[derive(Clone)]
pub struct InMemoryEngine {
    calcs: Arc<Mutex<Vec<StoredCalc>>>,
    version: String,
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calcs: Arc::new(Mutex::new(Vec::new())),
            version: "in-memory".into(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    fn guard(&self) -> Result<MutexGuard<'_, Vec<StoredCalc>>, ApiError> {
        self.calcs
            .lock()
            .map_err(|e| ApiError::Unavailable(e.to_string()))
    }

    /// Register or replace a calculation.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unavailable` if the store lock is poisoned.
    pub fn upsert_calc(&self, summary: CalcSummary) -> Result<(), ApiError> {
        let mut guard = self.guard()?;
        if let Some(existing) = guard.iter_mut().find(|c| c.summary.id == summary.id) {
            existing.summary = summary;
        } else {
            guard.push(StoredCalc {
                summary,
                lines: Vec::new(),
                outputs: Vec::new(),
                shared: false,
            });
        }
        Ok(())
    }

    /// Append a record to a calculation log and return its sequence number.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the calculation does not exist.
    pub fn append_log(
        &self,
        id: &CalcId,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Result<u64, ApiError> {
        let mut guard = self.guard()?;
        let calc = find_mut(&mut guard, id)?;
        let seq = calc.lines.len() as u64;
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
        calc.lines.push(LogLine::new(
            seq,
            timestamp,
            level,
            Some("MainProcess".into()),
            message,
        ));
        Ok(seq)
    }

    /// Attach an output to a calculation.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the calculation does not exist.
    pub fn add_output(&self, id: &CalcId, output: CalcOutput) -> Result<(), ApiError> {
        let mut guard = self.guard()?;
        find_mut(&mut guard, id)?.outputs.push(output);
        Ok(())
    }

    /// Flip the running flag of a calculation, updating its status text.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the calculation does not exist.
    pub fn set_running(&self, id: &CalcId, is_running: bool) -> Result<(), ApiError> {
        let mut guard = self.guard()?;
        let calc = find_mut(&mut guard, id)?;
        calc.summary.is_running = is_running;
        calc.summary.status = if is_running { "executing" } else { "complete" }.into();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the calculation does not exist.
    pub fn is_shared(&self, id: &CalcId) -> Result<bool, ApiError> {
        let mut guard = self.guard()?;
        Ok(find_mut(&mut guard, id)?.shared)
    }
}

fn find_mut<'a>(calcs: &'a mut [StoredCalc], id: &CalcId) -> Result<&'a mut StoredCalc, ApiError> {
    calcs
        .iter_mut()
        .find(|c| &c.summary.id == id)
        .ok_or(ApiError::NotFound)
}

#[async_trait]
impl EngineApi for InMemoryEngine {
    async fn fetch_log(&self, id: &CalcId, cursor: u64) -> Result<Vec<LogLine>, ApiError> {
        let mut guard = self.guard()?;
        let calc = find_mut(&mut guard, id)?;
        let skip = usize::try_from(cursor).unwrap_or(usize::MAX);
        Ok(calc.lines.iter().skip(skip).cloned().collect())
    }

    async fn status(&self, id: &CalcId) -> Result<CalcStatus, ApiError> {
        let mut guard = self.guard()?;
        let calc = find_mut(&mut guard, id)?;
        Ok(CalcStatus {
            is_running: calc.summary.is_running,
            status: Some(calc.summary.status.clone()),
            start_time: None,
            stop_time: None,
        })
    }

    async fn log_size(&self, id: &CalcId) -> Result<u64, ApiError> {
        let mut guard = self.guard()?;
        Ok(find_mut(&mut guard, id)?.lines.len() as u64)
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<CalcSummary>, ApiError> {
        let guard = self.guard()?;
        Ok(guard
            .iter()
            .rev()
            .map(|c| &c.summary)
            .filter(|summary| filter.matches(summary))
            .cloned()
            .collect())
    }

    async fn perform(&self, id: &CalcId, action: CalcAction) -> Result<(), ApiError> {
        let mut guard = self.guard()?;
        match action {
            CalcAction::Abort => {
                let calc = find_mut(&mut guard, id)?;
                if !calc.summary.is_running {
                    return Err(ApiError::Rejected(format!(
                        "calculation {id} is not running"
                    )));
                }
                calc.summary.is_running = false;
                calc.summary.status = "aborted".into();
            }
            CalcAction::Remove => {
                let before = guard.len();
                guard.retain(|c| &c.summary.id != id);
                if guard.len() == before {
                    return Err(ApiError::NotFound);
                }
            }
            CalcAction::Share | CalcAction::Unshare => {
                find_mut(&mut guard, id)?.shared = action == CalcAction::Share;
            }
        }
        Ok(())
    }

    async fn results(&self, id: &CalcId) -> Result<Vec<CalcOutput>, ApiError> {
        let mut guard = self.guard()?;
        let calc = find_mut(&mut guard, id)?;
        if calc.outputs.is_empty() {
            return Err(ApiError::NotFound);
        }
        Ok(calc.outputs.clone())
    }

    async fn traceback(&self, id: &CalcId) -> Result<Vec<String>, ApiError> {
        let mut guard = self.guard()?;
        let calc = find_mut(&mut guard, id)?;
        Ok(calc
            .lines
            .iter()
            .rev()
            .find(|line| *line.level() == LogLevel::Critical)
            .map(|line| line.message().lines().map(str::to_owned).collect())
            .unwrap_or_default())
    }

    async fn engine_version(&self) -> Result<String, ApiError> {
        Ok(self.version.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: u64, is_running: bool) -> CalcSummary {
        CalcSummary {
            id: CalcId::from(id),
            owner: "ops".into(),
            status: if is_running { "executing" } else { "complete" }.into(),
            job_type: Some("hazard".into()),
            calculation_mode: None,
            is_running,
            description: format!("calc {id}"),
            url: None,
        }
    }

    #[tokio::test]
    async fn log_is_sliced_by_cursor() {
        let engine = InMemoryEngine::new();
        let id = CalcId::from(1);
        engine.upsert_calc(summary(1, true)).unwrap();
        for message in ["a", "b", "c"] {
            engine.append_log(&id, LogLevel::Info, message).unwrap();
        }

        let tail = engine.fetch_log(&id, 1).await.unwrap();
        assert_eq!(tail.iter().map(LogLine::seq).collect::<Vec<_>>(), vec![1, 2]);
        assert!(engine.fetch_log(&id, 10).await.unwrap().is_empty());
        assert_eq!(engine.log_size(&id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn unknown_calc_is_not_found() {
        let engine = InMemoryEngine::new();
        let id = CalcId::from(5);
        assert!(engine.fetch_log(&id, 0).await.unwrap_err().is_not_found());
        assert!(engine.status(&id).await.unwrap_err().is_not_found());
        assert!(engine.append_log(&id, LogLevel::Info, "x").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_filtered() {
        let engine = InMemoryEngine::new();
        engine.upsert_calc(summary(1, false)).unwrap();
        engine.upsert_calc(summary(2, true)).unwrap();

        let all = engine.list(&ListFilter::default()).await.unwrap();
        assert_eq!(all[0].id, CalcId::from(2));

        let running = engine
            .list(&ListFilter::default().with_running(Some(true)))
            .await
            .unwrap();
        assert_eq!(running.len(), 1);
        assert!(running[0].is_running);
    }

    #[tokio::test]
    async fn actions_update_state() {
        let engine = InMemoryEngine::new();
        let id = CalcId::from(3);
        engine.upsert_calc(summary(3, true)).unwrap();

        engine.perform(&id, CalcAction::Share).await.unwrap();
        assert!(engine.is_shared(&id).unwrap());
        engine.perform(&id, CalcAction::Unshare).await.unwrap();
        assert!(!engine.is_shared(&id).unwrap());

        engine.perform(&id, CalcAction::Abort).await.unwrap();
        let status = engine.status(&id).await.unwrap();
        assert!(!status.is_running);
        assert_eq!(status.status.as_deref(), Some("aborted"));

        let err = engine.perform(&id, CalcAction::Abort).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected(_)));

        engine.perform(&id, CalcAction::Remove).await.unwrap();
        assert!(engine.perform(&id, CalcAction::Remove).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn results_need_outputs() {
        let engine = InMemoryEngine::new();
        let id = CalcId::from(6);
        assert!(engine.results(&id).await.unwrap_err().is_not_found());

        engine.upsert_calc(summary(6, false)).unwrap();
        assert!(engine.results(&id).await.unwrap_err().is_not_found());

        engine
            .add_output(&id, CalcOutput::new(1, "Hazard Curves", "hcurves"))
            .unwrap();
        let outputs = engine.results(&id).await.unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].kind, "hcurves");
    }

    #[tokio::test]
    async fn traceback_is_the_last_critical_record() {
        let engine = InMemoryEngine::new();
        let id = CalcId::from(7);
        engine.upsert_calc(summary(7, false)).unwrap();
        assert!(engine.traceback(&id).await.unwrap().is_empty());

        engine.append_log(&id, LogLevel::Critical, "old failure").unwrap();
        engine.append_log(&id, LogLevel::Info, "retrying").unwrap();
        engine
            .append_log(
                &id,
                LogLevel::Critical,
                "Traceback (most recent call last):\n  File \"job.py\"\nValueError: bad site",
            )
            .unwrap();

        let lines = engine.traceback(&id).await.unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "ValueError: bad site");
        assert!(engine.traceback(&CalcId::from(8)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn set_running_updates_status_text() {
        let engine = InMemoryEngine::new().with_version("3.16.0");
        let id = CalcId::from(4);
        engine.upsert_calc(summary(4, true)).unwrap();
        engine.set_running(&id, false).unwrap();

        let status = engine.status(&id).await.unwrap();
        assert_eq!(status.status.as_deref(), Some("complete"));
        assert_eq!(engine.engine_version().await.unwrap(), "3.16.0");
    }
}
