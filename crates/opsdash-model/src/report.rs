//! Reporting records: KPI reports and quality evaluations

use crate::error::{require, ModelError};
use crate::id::RecordId;
use crate::record::{lenient, timestamp, EntityKind, Record};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One row of a KPI report table
///
/// Rows are embedded in their report and have no identity of their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiRow {
    #[serde(deserialize_with = "lenient")]
    pub kpi: String,
    #[serde(deserialize_with = "lenient")]
    pub desc: String,
    #[serde(deserialize_with = "lenient")]
    pub measure: String,
    #[serde(deserialize_with = "lenient")]
    pub note: String,
    #[serde(deserialize_with = "lenient")]
    pub imp: String,
    #[serde(deserialize_with = "lenient")]
    pub util: String,
    #[serde(deserialize_with = "lenient")]
    pub input: String,
    #[serde(deserialize_with = "lenient")]
    pub output: String,
    #[serde(deserialize_with = "lenient")]
    pub sla: String,
}

impl KpiRow {
    /// Row with indicator name and description
    #[inline]
    #[must_use]
    pub fn new(kpi: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            kpi: kpi.into(),
            desc: desc.into(),
            ..Self::default()
        }
    }

    /// With SLA target
    #[inline]
    #[must_use]
    pub fn with_sla(mut self, sla: impl Into<String>) -> Self {
        self.sla = sla.into();
        self
    }

    /// With measurement method
    #[inline]
    #[must_use]
    pub fn with_measure(mut self, measure: impl Into<String>) -> Self {
        self.measure = measure.into();
        self
    }
}

/// Named monthly KPI report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiReport {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    /// `YYYY-MM`
    #[serde(default, deserialize_with = "lenient")]
    pub month: String,
    #[serde(default, deserialize_with = "lenient")]
    pub month_label: String,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient")]
    pub rows: Vec<KpiRow>,
}

/// Draft for a new KPI report
#[derive(Debug, Clone, Default)]
pub struct KpiReportDraft {
    pub name: String,
    pub month: String,
    /// Derived from `month` when empty
    pub month_label: String,
    pub rows: Vec<KpiRow>,
}

impl Record for KpiReport {
    type Draft = KpiReportDraft;

    const KIND: EntityKind = EntityKind::KpiReport;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(
        id: RecordId,
        _parent: Option<&RecordId>,
        draft: Self::Draft,
        now: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        require("kpi_report", "name", &draft.name)?;
        let month_label = if draft.month_label.trim().is_empty() {
            month_label(&draft.month).unwrap_or_else(|| draft.month.clone())
        } else {
            draft.month_label
        };
        Ok(Self {
            id,
            name: draft.name,
            month: draft.month,
            month_label,
            created_at: timestamp(now),
            rows: draft.rows,
        })
    }
}

/// Human label for a `YYYY-MM` month ("May 2024")
#[must_use]
pub fn month_label(month: &str) -> Option<String> {
    let first = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").ok()?;
    Some(first.format("%B %Y").to_string())
}

/// A single scored evaluation of an employee's call handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityRecord {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient")]
    pub employee_name: String,
    /// `YYYY-MM-DD`
    #[serde(default, deserialize_with = "lenient")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient")]
    pub call_type: String,
    #[serde(default, deserialize_with = "lenient")]
    pub score: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub weakest_area: String,
    #[serde(default, deserialize_with = "lenient")]
    pub note: String,
}

/// Draft for a new quality record
#[derive(Debug, Clone, Default)]
pub struct QualityDraft {
    pub employee_name: String,
    pub date: String,
    pub call_type: String,
    pub score: f64,
    pub weakest_area: String,
    pub note: String,
}

impl QualityDraft {
    /// Draft with the fields used by aggregation
    #[must_use]
    pub fn new(
        employee_name: impl Into<String>,
        date: impl Into<String>,
        score: f64,
        weakest_area: impl Into<String>,
    ) -> Self {
        Self {
            employee_name: employee_name.into(),
            date: date.into(),
            score,
            weakest_area: weakest_area.into(),
            ..Self::default()
        }
    }

    /// With call type
    #[inline]
    #[must_use]
    pub fn with_call_type(mut self, call_type: impl Into<String>) -> Self {
        self.call_type = call_type.into();
        self
    }
}

impl Record for QualityRecord {
    type Draft = QualityDraft;

    const KIND: EntityKind = EntityKind::QualityRecord;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(
        id: RecordId,
        _parent: Option<&RecordId>,
        draft: Self::Draft,
        _now: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        require("quality_record", "employeeName", &draft.employee_name)?;
        if !(0.0..=100.0).contains(&draft.score) {
            return Err(ModelError::ScoreOutOfRange(draft.score));
        }
        Ok(Self {
            id,
            employee_name: draft.employee_name,
            date: draft.date,
            call_type: draft.call_type,
            score: draft.score,
            weakest_area: draft.weakest_area,
            note: draft.note,
        })
    }
}
