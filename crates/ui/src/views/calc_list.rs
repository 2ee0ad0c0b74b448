use std::{io, io::Write, sync::Arc};

use calc_core::model::{CalcId, CalcStatus, ListFilter};
use console::Style;
use services::CalcService;

use crate::views::{ViewError, style::paint};
use crate::vm::{CalcRowVm, CalcStatusVm, OutputRowVm, map_calc_rows, map_output_rows};

const CALC_HEADERS: [&str; 5] = ["ID", "STATUS", "MODE", "OWNER", "DESCRIPTION"];
const OUTPUT_HEADERS: [&str; 4] = ["ID", "TYPE", "FORMATS", "NAME"];

/// Calculation table and single-calculation status output.
#[derive(Clone)]
pub struct CalcListView {
    service: Arc<CalcService>,
    styled: bool,
}

impl CalcListView {
    #[must_use]
    pub fn new(service: Arc<CalcService>, styled: bool) -> Self {
        Self { service, styled }
    }

    /// Fetch and print the calculations matching `filter`. Returns the
    /// number of rows printed.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Service` when listing fails and `ViewError::Io`
    /// when `out` cannot be written.
    pub async fn show<W: Write>(&self, filter: &ListFilter, out: &mut W) -> Result<usize, ViewError> {
        let items = self.service.list(filter).await?;
        let rows = map_calc_rows(&items);
        render_calc_table(out, &rows, self.styled)?;
        Ok(rows.len())
    }

    /// # Errors
    ///
    /// Returns `ViewError::Service` for unknown ids or engine failures.
    pub async fn show_status<W: Write>(
        &self,
        id: &CalcId,
        out: &mut W,
    ) -> Result<CalcStatus, ViewError> {
        let status = self.service.status(id).await?;
        render_status(out, &CalcStatusVm::new(id, &status))?;
        Ok(status)
    }

    /// Fetch and print a calculation's outputs. Returns the number printed.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Service` for unknown ids or engine failures.
    pub async fn show_results<W: Write>(&self, id: &CalcId, out: &mut W) -> Result<usize, ViewError> {
        let outputs = self.service.results(id).await?;
        render_results_table(out, &map_output_rows(&outputs), self.styled)?;
        Ok(outputs.len())
    }

    /// # Errors
    ///
    /// Returns `ViewError::Service` for unknown ids or engine failures.
    pub async fn show_traceback<W: Write>(&self, id: &CalcId, out: &mut W) -> Result<usize, ViewError> {
        let lines = self.service.traceback(id).await?;
        render_traceback(out, &lines, self.styled)?;
        Ok(lines.len())
    }
}

fn calc_cells(row: &CalcRowVm) -> Vec<String> {
    vec![
        row.id.to_string(),
        row.status.clone(),
        row.mode.clone(),
        row.owner.clone(),
        row.description.clone(),
    ]
}

fn output_cells(row: &OutputRowVm) -> Vec<String> {
    vec![
        row.id.clone(),
        row.kind.clone(),
        row.formats.clone(),
        row.name.clone(),
    ]
}

/// Print `rows` as a left-aligned table. Running calculations are
/// highlighted when `styled` is set.
///
/// # Errors
///
/// Propagates write failures.
pub fn render_calc_table<W: Write>(out: &mut W, rows: &[CalcRowVm], styled: bool) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "No calculations.");
    }
    let table: Vec<Vec<String>> = rows.iter().map(calc_cells).collect();
    let running: Vec<bool> = rows.iter().map(|row| row.is_running).collect();
    render_table(out, &CALC_HEADERS, &table, &running, styled)
}

/// # Errors
///
/// Propagates write failures.
pub fn render_results_table<W: Write>(
    out: &mut W,
    rows: &[OutputRowVm],
    styled: bool,
) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "No results yet.");
    }
    let table: Vec<Vec<String>> = rows.iter().map(output_cells).collect();
    render_table(out, &OUTPUT_HEADERS, &table, &vec![false; rows.len()], styled)
}

fn render_table<W: Write>(
    out: &mut W,
    headers: &[&str],
    table: &[Vec<String>],
    highlighted: &[bool],
    styled: bool,
) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for cells in table {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<String> = headers.iter().map(|h| (*h).to_owned()).collect();
    writeln!(out, "{}", paint(&format_cells(&header, &widths), Style::new().bold(), styled))?;
    for (cells, &highlight) in table.iter().zip(highlighted) {
        let style = if highlight {
            Style::new().yellow()
        } else {
            Style::new()
        };
        writeln!(out, "{}", paint(&format_cells(cells, &widths), style, styled))?;
    }
    Ok(())
}

fn format_cells(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (i, (cell, &width)) in cells.iter().zip(widths).enumerate() {
        if i + 1 == cells.len() {
            line.push_str(cell);
        } else {
            line.push_str(&format!("{cell:<width$}  "));
        }
    }
    line.trim_end().to_owned()
}

/// Print traceback lines, or a note when the engine recorded none.
///
/// # Errors
///
/// Propagates write failures.
pub fn render_traceback<W: Write>(out: &mut W, lines: &[String], styled: bool) -> io::Result<()> {
    if lines.is_empty() {
        return writeln!(out, "No traceback recorded.");
    }
    for line in lines {
        writeln!(out, "{}", paint(line, Style::new().red(), styled))?;
    }
    Ok(())
}

/// # Errors
///
/// Propagates write failures.
pub fn render_status<W: Write>(out: &mut W, vm: &CalcStatusVm) -> io::Result<()> {
    let width = vm.fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, value) in &vm.fields {
        writeln!(out, "{:<width$}  {value}", format!("{label}:"), width = width + 1)?;
    }
    Ok(())
}
