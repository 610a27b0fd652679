//! KPI report display views

use opsdash_model::{KpiReport, KpiRow, RecordId};
use serde::Serialize;

/// Whether a row is shown: its indicator name or description is non-empty
///
/// Whitespace counts as content; only truly empty fields hide a row.
#[inline]
#[must_use]
pub fn is_displayable(row: &KpiRow) -> bool {
    !row.kpi.is_empty() || !row.desc.is_empty()
}

/// Rows of `report` worth displaying, in their original order
#[must_use]
pub fn displayable_rows(report: &KpiReport) -> Vec<&KpiRow> {
    report.rows.iter().filter(|row| is_displayable(row)).collect()
}

/// Display-ready view of a report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: RecordId,
    pub name: String,
    pub month_label: String,
    pub rows: Vec<KpiRow>,
    /// Rows dropped because both `kpi` and `desc` were empty
    pub hidden_rows: usize,
    /// Retained rows with an SLA target
    pub rows_with_sla: usize,
}

impl ReportView {
    /// Build the view for `report`
    #[must_use]
    pub fn of(report: &KpiReport) -> Self {
        let rows: Vec<KpiRow> = displayable_rows(report).into_iter().cloned().collect();
        let rows_with_sla = rows.iter().filter(|r| !r.sla.is_empty()).count();
        Self {
            id: report.id.clone(),
            name: report.name.clone(),
            month_label: report.month_label.clone(),
            hidden_rows: report.rows.len() - rows.len(),
            rows_with_sla,
            rows,
        }
    }
}
