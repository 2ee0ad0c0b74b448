//! Shared error types for the services crate.

use thiserror::Error;

use calc_core::model::CalcId;
use engine::ApiError;

/// Errors emitted by `CalcService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CalcServiceError {
    #[error("calculation {0} not found")]
    NotFound(CalcId),
    #[error("engine rejected {action} on calculation {id}: {reason}")]
    Rejected {
        id: CalcId,
        action: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CalcServiceError {
    /// Attach the calculation id to a bare `ApiError::NotFound`.
    pub(crate) fn for_calc(id: &CalcId, err: ApiError) -> Self {
        match err {
            ApiError::NotFound => Self::NotFound(id.clone()),
            other => Self::Api(other),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
