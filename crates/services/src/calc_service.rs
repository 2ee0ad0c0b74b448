use std::sync::Arc;

use calc_core::model::{CalcAction, CalcId, CalcOutput, CalcStatus, CalcSummary, ListFilter};
use engine::{ApiError, EngineApi};
use tracing::info;

use crate::error::CalcServiceError;

/// Calculation list, status and actions, on top of an engine adapter.
#[derive(Clone)]
pub struct CalcService {
    api: Arc<dyn EngineApi>,
}

impl CalcService {
    #[must_use]
    pub fn new(api: Arc<dyn EngineApi>) -> Self {
        Self { api }
    }

    /// List calculations matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `CalcServiceError::Api` on engine failures.
    pub async fn list(&self, filter: &ListFilter) -> Result<Vec<CalcSummary>, CalcServiceError> {
        Ok(self.api.list(filter).await?)
    }

    /// Current status of a calculation.
    ///
    /// # Errors
    ///
    /// Returns `CalcServiceError::NotFound` for unknown ids.
    pub async fn status(&self, id: &CalcId) -> Result<CalcStatus, CalcServiceError> {
        self.api
            .status(id)
            .await
            .map_err(|e| CalcServiceError::for_calc(id, e))
    }

    /// Whether the calculation is still running; used to pick the initial
    /// run state of a log view.
    ///
    /// # Errors
    ///
    /// Returns `CalcServiceError::NotFound` for unknown ids.
    pub async fn is_running(&self, id: &CalcId) -> Result<bool, CalcServiceError> {
        Ok(self.status(id).await?.is_running)
    }

    /// Number of log lines written so far.
    ///
    /// # Errors
    ///
    /// Returns `CalcServiceError::NotFound` for unknown ids.
    pub async fn log_size(&self, id: &CalcId) -> Result<u64, CalcServiceError> {
        self.api
            .log_size(id)
            .await
            .map_err(|e| CalcServiceError::for_calc(id, e))
    }

    /// Exportable outputs of a calculation; empty while it has none.
    ///
    /// The engine answers 404 for both an unknown calculation and one
    /// without outputs, so a 404 is disambiguated with a status request.
    ///
    /// # Errors
    ///
    /// Returns `CalcServiceError::NotFound` for unknown ids.
    pub async fn results(&self, id: &CalcId) -> Result<Vec<CalcOutput>, CalcServiceError> {
        match self.api.results(id).await {
            Ok(outputs) => Ok(outputs),
            Err(ApiError::NotFound) => {
                self.status(id).await?;
                Ok(Vec::new())
            }
            Err(err) => Err(CalcServiceError::for_calc(id, err)),
        }
    }

    /// Traceback lines of a failed calculation.
    ///
    /// # Errors
    ///
    /// Returns `CalcServiceError::NotFound` for unknown ids.
    pub async fn traceback(&self, id: &CalcId) -> Result<Vec<String>, CalcServiceError> {
        self.api
            .traceback(id)
            .await
            .map_err(|e| CalcServiceError::for_calc(id, e))
    }

    /// # Errors
    ///
    /// Returns `CalcServiceError::Api` on engine failures.
    pub async fn engine_version(&self) -> Result<String, CalcServiceError> {
        Ok(self.api.engine_version().await?)
    }

    /// Apply `action` to a calculation.
    ///
    /// # Errors
    ///
    /// Returns `CalcServiceError::Rejected` when the engine refuses the action,
    /// or `CalcServiceError::NotFound` for unknown ids.
    pub async fn perform(&self, id: &CalcId, action: CalcAction) -> Result<(), CalcServiceError> {
        match self.api.perform(id, action).await {
            Ok(()) => {
                info!(calc_id = %id, %action, "calculation action applied");
                Ok(())
            }
            Err(ApiError::Rejected(reason)) => Err(CalcServiceError::Rejected {
                id: id.clone(),
                action: action.as_str(),
                reason,
            }),
            Err(err) => Err(CalcServiceError::for_calc(id, err)),
        }
    }
}
