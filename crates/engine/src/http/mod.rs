mod records;

use async_trait::async_trait;
use calc_core::model::{
    CalcAction, CalcId, CalcOutput, CalcStatus, CalcSummary, ListFilter, LogLine,
};
use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

use crate::api::{ApiError, EngineApi};
use crate::config::EngineConfig;

/// `EngineApi` over the engine's HTTP interface.
#[derive(Clone, Debug)]
pub struct HttpEngineClient {
    client: Client,
    base_url: Url,
}

impl HttpEngineClient {
    /// Build a client for the configured engine.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if the base URL cannot carry a path, or
    /// `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &EngineConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.base_url.clone()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn calc_endpoint(&self, id: &CalcId, tail: &[&str]) -> Result<Url, ApiError> {
        let mut segments = vec!["v1", "calc", id.as_str()];
        segments.extend_from_slice(tail);
        self.endpoint(&segments)
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, ApiError> {
        debug!(%url, "engine GET");
        let response = self.client.get(url).send().await?;
        let response = check_status(response)?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound);
    }
    if !status.is_success() {
        return Err(ApiError::HttpStatus(status));
    }
    Ok(response)
}

#[async_trait]
impl EngineApi for HttpEngineClient {
    async fn fetch_log(&self, id: &CalcId, cursor: u64) -> Result<Vec<LogLine>, ApiError> {
        // `{cursor}:` is an open-ended slice; the engine returns everything past it.
        let slice = format!("{cursor}:");
        let url = self.calc_endpoint(id, &["log", slice.as_str()])?;
        let body = self.get_bytes(url).await?;
        records::decode_log_batch(&body, cursor)
    }

    async fn status(&self, id: &CalcId) -> Result<CalcStatus, ApiError> {
        let url = self.calc_endpoint(id, &["status"])?;
        records::decode(&self.get_bytes(url).await?)
    }

    async fn log_size(&self, id: &CalcId) -> Result<u64, ApiError> {
        let url = self.calc_endpoint(id, &["log", "size"])?;
        records::decode(&self.get_bytes(url).await?)
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<CalcSummary>, ApiError> {
        let mut url = self.endpoint(&["v1", "calc", "list"])?;
        let pairs = filter.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        records::decode(&self.get_bytes(url).await?)
    }

    async fn perform(&self, id: &CalcId, action: CalcAction) -> Result<(), ApiError> {
        let url = self.calc_endpoint(id, &[action.as_str()])?;
        debug!(%url, "engine POST");
        let response = self.client.post(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        records::action_outcome(status, &body)
    }

    async fn results(&self, id: &CalcId) -> Result<Vec<CalcOutput>, ApiError> {
        let url = self.calc_endpoint(id, &["results"])?;
        records::decode(&self.get_bytes(url).await?)
    }

    async fn traceback(&self, id: &CalcId) -> Result<Vec<String>, ApiError> {
        let url = self.calc_endpoint(id, &["traceback"])?;
        records::decode(&self.get_bytes(url).await?)
    }

    async fn engine_version(&self) -> Result<String, ApiError> {
        let url = self.endpoint(&["v1", "engine_version"])?;
        let body = self.get_bytes(url).await?;
        records::decode_version(&String::from_utf8_lossy(&body))
    }
}
