use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const FAST_POLL_ENV: &str = "CALCWATCH_FAST_POLL_MS";
pub const SLOW_POLL_ENV: &str = "CALCWATCH_SLOW_POLL_MS";

/// Delay class of the next poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// New lines just arrived; more are likely.
    Fast,
    /// Nothing new; the calculation is still running.
    Slow,
}

/// How the stripe parity counter advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StripeRule {
    /// Every rendered line flips the stripe.
    #[default]
    AllLines,
    /// Blank lines take the current stripe without flipping it.
    NonBlank,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown stripe rule: {0} (expected `all` or `non-blank`)")]
pub struct StripeRuleError(String);

impl FromStr for StripeRule {
    type Err = StripeRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "all-lines" => Ok(Self::AllLines),
            "non-blank" | "nonblank" => Ok(Self::NonBlank),
            _ => Err(StripeRuleError(s.to_owned())),
        }
    }
}

impl fmt::Display for StripeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StripeRule::AllLines => "all",
            StripeRule::NonBlank => "non-blank",
        })
    }
}

/// Tuning knobs of a `LogPoller`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub fast_interval: Duration,
    pub slow_interval: Duration,
    /// Fetch once more after a status check reports the calculation finished.
    pub drain_on_finish: bool,
    pub stripe_rule: StripeRule,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            fast_interval: Duration::from_millis(250),
            slow_interval: Duration::from_millis(1000),
            drain_on_finish: true,
            stripe_rule: StripeRule::AllLines,
        }
    }
}

impl PollConfig {
    /// Defaults overridden by `CALCWATCH_FAST_POLL_MS` / `CALCWATCH_SLOW_POLL_MS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`. Unparsable
    /// values keep the default.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str| {
            lookup(key)
                .and_then(|value: String| value.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };
        let defaults = Self::default();
        Self {
            fast_interval: millis(FAST_POLL_ENV).unwrap_or(defaults.fast_interval),
            slow_interval: millis(SLOW_POLL_ENV).unwrap_or(defaults.slow_interval),
            ..defaults
        }
    }

    #[must_use]
    pub fn with_intervals(mut self, fast: Duration, slow: Duration) -> Self {
        self.fast_interval = fast;
        self.slow_interval = slow;
        self
    }

    #[must_use]
    pub fn with_drain_on_finish(mut self, drain: bool) -> Self {
        self.drain_on_finish = drain;
        self
    }

    #[must_use]
    pub fn with_stripe_rule(mut self, rule: StripeRule) -> Self {
        self.stripe_rule = rule;
        self
    }

    #[must_use]
    pub fn delay(&self, cadence: Cadence) -> Duration {
        match cadence {
            Cadence::Fast => self.fast_interval,
            Cadence::Slow => self.slow_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cadence() {
        let config = PollConfig::default();
        assert_eq!(config.delay(Cadence::Fast), Duration::from_millis(250));
        assert_eq!(config.delay(Cadence::Slow), Duration::from_millis(1000));
        assert!(config.drain_on_finish);
        assert_eq!(config.stripe_rule, StripeRule::AllLines);
    }

    #[test]
    fn stripe_rule_parsing() {
        assert_eq!("all".parse::<StripeRule>(), Ok(StripeRule::AllLines));
        assert_eq!("Non-Blank".parse::<StripeRule>(), Ok(StripeRule::NonBlank));
        assert!("odd".parse::<StripeRule>().is_err());
        assert_eq!(StripeRule::NonBlank.to_string(), "non-blank");
    }

    #[test]
    fn intervals_come_from_environment() {
        let config = PollConfig::from_lookup(|key| match key {
            FAST_POLL_ENV => Some("100".into()),
            SLOW_POLL_ENV => Some(" 2000 ".into()),
            _ => None,
        });
        assert_eq!(config.delay(Cadence::Fast), Duration::from_millis(100));
        assert_eq!(config.delay(Cadence::Slow), Duration::from_millis(2000));
        assert!(config.drain_on_finish);
    }

    #[test]
    fn unparsable_intervals_keep_defaults() {
        let config = PollConfig::from_lookup(|key| match key {
            FAST_POLL_ENV => Some("fast".into()),
            _ => None,
        });
        assert_eq!(config, PollConfig::default());
    }
}
