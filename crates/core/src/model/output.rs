use serde::{Deserialize, Serialize};

/// One exportable output of a finished calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcOutput {
    pub id: u64,
    pub name: String,
    /// Output kind, e.g. `hazard_curves`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Export formats the engine offers for this output.
    #[serde(default)]
    pub outtypes: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl CalcOutput {
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: kind.into(),
            outtypes: Vec::new(),
            url: None,
        }
    }

    #[must_use]
    pub fn with_outtypes<I, S>(mut self, outtypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outtypes = outtypes.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_engine_result_objects() {
        let output: CalcOutput = serde_json::from_str(
            r#"{"id": 12, "name": "Hazard Curves", "type": "hcurves",
                "outtypes": ["csv", "xml"], "url": "http://e/v1/calc/result/12"}"#,
        )
        .unwrap();
        assert_eq!(
            output,
            CalcOutput {
                url: Some("http://e/v1/calc/result/12".into()),
                ..CalcOutput::new(12, "Hazard Curves", "hcurves").with_outtypes(["csv", "xml"])
            }
        );
    }

    #[test]
    fn export_formats_are_optional() {
        let output: CalcOutput =
            serde_json::from_str(r#"{"id": 3, "name": "Ruptures", "type": "ruptures"}"#).unwrap();
        assert!(output.outtypes.is_empty());
        assert_eq!(output.url, None);
    }
}
