use calc_core::model::{CalcId, CalcOutput, CalcStatus, CalcSummary};

use crate::vm::time_fmt::format_engine_time;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalcRowVm {
    pub id: CalcId,
    pub status: String,
    pub owner: String,
    pub mode: String,
    pub description: String,
    pub is_running: bool,
}

impl From<&CalcSummary> for CalcRowVm {
    fn from(summary: &CalcSummary) -> Self {
        let mode = summary
            .calculation_mode
            .as_deref()
            .or(summary.job_type.as_deref())
            .unwrap_or("-");
        Self {
            id: summary.id.clone(),
            status: if summary.status.is_empty() {
                "-".into()
            } else {
                summary.status.clone()
            },
            owner: summary.owner.clone(),
            mode: mode.to_owned(),
            description: summary.description.clone(),
            is_running: summary.is_running,
        }
    }
}

#[must_use]
pub fn map_calc_rows(items: &[CalcSummary]) -> Vec<CalcRowVm> {
    items.iter().map(CalcRowVm::from).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRowVm {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub formats: String,
}

impl From<&CalcOutput> for OutputRowVm {
    fn from(output: &CalcOutput) -> Self {
        Self {
            id: output.id.to_string(),
            name: output.name.clone(),
            kind: output.kind.clone(),
            formats: if output.outtypes.is_empty() {
                "-".into()
            } else {
                output.outtypes.join(",")
            },
        }
    }
}

#[must_use]
pub fn map_output_rows(items: &[CalcOutput]) -> Vec<OutputRowVm> {
    items.iter().map(OutputRowVm::from).collect()
}

/// `label: value` pairs describing one calculation's status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalcStatusVm {
    pub fields: Vec<(&'static str, String)>,
}

impl CalcStatusVm {
    #[must_use]
    pub fn new(id: &CalcId, status: &CalcStatus) -> Self {
        let mut fields = vec![
            ("id", id.to_string()),
            (
                "running",
                if status.is_running { "yes" } else { "no" }.to_owned(),
            ),
        ];
        if let Some(text) = &status.status {
            fields.push(("status", text.clone()));
        }
        if let Some(start) = &status.start_time {
            fields.push(("started", format_engine_time(start)));
        }
        if let Some(stop) = &status.stop_time {
            fields.push(("stopped", format_engine_time(stop)));
        }
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_prefers_calculation_mode() {
        let mut summary = CalcSummary {
            id: CalcId::from(1),
            owner: "ops".into(),
            status: String::new(),
            job_type: Some("hazard".into()),
            calculation_mode: Some("event_based".into()),
            is_running: false,
            description: "ses".into(),
            url: None,
        };
        assert_eq!(CalcRowVm::from(&summary).mode, "event_based");
        assert_eq!(CalcRowVm::from(&summary).status, "-");

        summary.calculation_mode = None;
        assert_eq!(CalcRowVm::from(&summary).mode, "hazard");
    }

    #[test]
    fn output_formats_are_joined() {
        let rows = map_output_rows(&[
            CalcOutput::new(4, "Hazard Curves", "hcurves").with_outtypes(["csv", "xml"]),
            CalcOutput::new(5, "Report", "fullreport"),
        ]);
        assert_eq!(rows[0].formats, "csv,xml");
        assert_eq!(rows[1].formats, "-");
        assert_eq!(rows[1].id, "5");
    }

    #[test]
    fn status_fields_skip_missing_values() {
        let vm = CalcStatusVm::new(&CalcId::from(5), &CalcStatus::running());
        let labels: Vec<_> = vm.fields.iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["id", "running", "status"]);
    }
}
