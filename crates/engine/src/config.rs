use std::env;
use std::time::Duration;

pub const SERVER_URL_ENV: &str = "CALCWATCH_SERVER_URL";
pub const TIMEOUT_ENV: &str = "CALCWATCH_TIMEOUT_MS";

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8800";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the remote engine lives and how long a single request may take.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Reads `CALCWATCH_SERVER_URL` and `CALCWATCH_TIMEOUT_MS`, falling back
    /// to defaults for unset or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let base_url = lookup(SERVER_URL_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.base_url);
        let timeout = lookup(TIMEOUT_ENV)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map_or(defaults.timeout, Duration::from_millis);
        Self { base_url, timeout }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_engine() {
        let config = EngineConfig::default();
        assert_eq!(config.base_url, "http://localhost:8800");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn builder_overrides_timeout() {
        let config = EngineConfig::new("http://engine:80").with_timeout(Duration::from_millis(5));
        assert_eq!(config.base_url, "http://engine:80");
        assert_eq!(config.timeout, Duration::from_millis(5));
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = EngineConfig::from_lookup(vars(&[
            (SERVER_URL_ENV, "http://engine.local:8800"),
            (TIMEOUT_ENV, " 1500 "),
        ]));
        assert_eq!(config.base_url, "http://engine.local:8800");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn blank_or_unparsable_values_fall_back() {
        let config = EngineConfig::from_lookup(vars(&[(SERVER_URL_ENV, "  "), (TIMEOUT_ENV, "soon")]));
        assert_eq!(config, EngineConfig::default());
        assert_eq!(EngineConfig::from_lookup(vars(&[])), EngineConfig::default());
    }
}
