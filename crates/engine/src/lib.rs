#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod http;

pub use api::{ApiError, EngineApi, InMemoryEngine};
pub use config::EngineConfig;
pub use http::HttpEngineClient;
