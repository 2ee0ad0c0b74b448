use std::io;

use services::CalcServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ViewError {
    #[error("could not write to the terminal: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Service(#[from] CalcServiceError),
}

impl ViewError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Service(err) if err.is_not_found())
    }
}
