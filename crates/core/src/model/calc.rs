use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::CalcId;

//
// ─── RUN STATE ────────────────────────────────────────────────────────────────
//

/// What the client currently believes about a calculation's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Finished,
    /// No status check has answered yet.
    Unknown,
}

impl RunState {
    /// Initial state for a log view opened with the caller's best guess.
    #[must_use]
    pub fn from_assumed(assumed_running: bool) -> Self {
        if assumed_running {
            Self::Running
        } else {
            Self::Unknown
        }
    }
}

//
// ─── SUMMARY / STATUS ─────────────────────────────────────────────────────────
//

/// One row of the engine's calculation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcSummary {
    pub id: CalcId,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub calculation_mode: Option<String>,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Status object returned for a single calculation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalcStatus {
    pub is_running: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub stop_time: Option<String>,
}

impl CalcStatus {
    #[must_use]
    pub fn running() -> Self {
        Self {
            is_running: true,
            status: Some("executing".into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn finished(status: impl Into<String>) -> Self {
        Self {
            is_running: false,
            status: Some(status.into()),
            ..Self::default()
        }
    }
}

//
// ─── ACTIONS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalcActionError {
    #[error("unknown calculation action: {0}")]
    Unknown(String),
}

/// Mutations the engine accepts on an existing calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalcAction {
    Abort,
    Remove,
    Share,
    Unshare,
}

impl CalcAction {
    pub const ALL: [CalcAction; 4] = [Self::Abort, Self::Remove, Self::Share, Self::Unshare];

    /// Path segment used by the engine for this action.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CalcAction::Abort => "abort",
            CalcAction::Remove => "remove",
            CalcAction::Share => "share",
            CalcAction::Unshare => "unshare",
        }
    }
}

impl FromStr for CalcAction {
    type Err = CalcActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CalcActionError::Unknown(s.to_owned()))
    }
}

impl fmt::Display for CalcAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── LIST FILTER ──────────────────────────────────────────────────────────────
//

/// Query options for the calculation list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub preferred_only: bool,
    pub tag: Option<String>,
    pub is_running: Option<bool>,
}

impl ListFilter {
    #[must_use]
    pub fn preferred_only(mut self) -> Self {
        self.preferred_only = true;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.tag = (!tag.trim().is_empty()).then(|| tag.trim().to_owned());
        self
    }

    #[must_use]
    pub fn with_running(mut self, is_running: Option<bool>) -> Self {
        self.is_running = is_running;
        self
    }

    /// Query-string pairs in the order the engine documents them.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if self.preferred_only {
            pairs.push(("preferred_only", "1".to_owned()));
        }
        if let Some(tag) = &self.tag {
            pairs.push(("filter_by_tag", tag.clone()));
        }
        if let Some(is_running) = self.is_running {
            pairs.push(("is_running", is_running.to_string()));
        }
        pairs
    }

    /// Applies the filter locally; used by adapters without server-side filtering.
    #[must_use]
    pub fn matches(&self, summary: &CalcSummary) -> bool {
        self.is_running.is_none_or(|running| summary.is_running == running)
    }
}
