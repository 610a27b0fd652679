//! Per-employee quality analysis
//!
//! Groups quality records by employee and derives mean score, a
//! chronological score trend and the most frequent weakest area.

use chrono::NaiveDate;
use indexmap::IndexMap;
use opsdash_model::QualityRecord;
use serde::Serialize;
use std::cmp::Ordering;

/// One point of an employee's score trend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub score: f64,
}

/// Mean score for one call type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallTypeScore {
    pub call_type: String,
    pub records: usize,
    pub mean_score: f64,
}

/// Aggregate quality view for one employee
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeQuality {
    pub employee_name: String,
    pub records: usize,
    pub mean_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    /// Scores by ascending date
    pub trend: Vec<TrendPoint>,
    /// Latest minus earliest score; `None` with fewer than two records
    pub trend_delta: Option<f64>,
    /// Most frequent weakest area, ties going to the earliest
    pub weakest_area: Option<String>,
    /// Per call type, in order of first appearance on the trend
    pub by_call_type: Vec<CallTypeScore>,
}

/// Quality view across all employees
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityOverview {
    pub records: usize,
    /// Mean over all records; `None` when there are none
    pub mean_score: Option<f64>,
    /// In order of each employee's first record in the collection
    pub employees: Vec<EmployeeQuality>,
}

/// Analyze every employee in `records`
#[must_use]
pub fn analyze(records: &[QualityRecord]) -> QualityOverview {
    let mut groups: IndexMap<&str, Vec<&QualityRecord>> = IndexMap::new();
    for record in records {
        groups
            .entry(record.employee_name.as_str())
            .or_default()
            .push(record);
    }

    let employees = groups
        .into_iter()
        .map(|(name, group)| summarize(name, group))
        .collect();

    QualityOverview {
        records: records.len(),
        mean_score: mean(records.iter().map(|r| r.score)),
        employees,
    }
}

/// Analyze one employee; `None` if they have no records
#[must_use]
pub fn analyze_employee(records: &[QualityRecord], employee_name: &str) -> Option<EmployeeQuality> {
    let group: Vec<_> = records
        .iter()
        .filter(|r| r.employee_name == employee_name)
        .collect();
    if group.is_empty() {
        return None;
    }
    Some(summarize(employee_name, group))
}

/// Most frequent non-empty value, ties going to the first encountered
#[must_use]
pub fn mode<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for value in values.into_iter().filter(|v| !v.is_empty()) {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Chronological order: parsable dates ascending, then unparsable ones lexically
fn by_date(a: &QualityRecord, b: &QualityRecord) -> Ordering {
    let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    match (parse(&a.date), parse(&b.date)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.date.cmp(&b.date),
    }
}

fn summarize(name: &str, mut group: Vec<&QualityRecord>) -> EmployeeQuality {
    // Stable: same-day records keep collection order
    group.sort_by(|a, b| by_date(a, b));

    let scores: Vec<f64> = group.iter().map(|r| r.score).collect();
    let trend: Vec<TrendPoint> = group
        .iter()
        .map(|r| TrendPoint {
            date: r.date.clone(),
            score: r.score,
        })
        .collect();

    let trend_delta = match (scores.first(), scores.last()) {
        (Some(first), Some(last)) if scores.len() > 1 => Some(last - first),
        _ => None,
    };

    let mut call_types: IndexMap<&str, Vec<f64>> = IndexMap::new();
    for record in &group {
        if !record.call_type.is_empty() {
            call_types
                .entry(record.call_type.as_str())
                .or_default()
                .push(record.score);
        }
    }
    let by_call_type = call_types
        .into_iter()
        .map(|(call_type, scores)| CallTypeScore {
            call_type: call_type.to_string(),
            records: scores.len(),
            mean_score: mean(scores.iter().copied()).unwrap_or_default(),
        })
        .collect();

    EmployeeQuality {
        employee_name: name.to_string(),
        records: group.len(),
        mean_score: mean(scores.iter().copied()).unwrap_or_default(),
        min_score: scores.iter().copied().fold(f64::INFINITY, f64::min),
        max_score: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        weakest_area: mode(group.iter().map(|r| r.weakest_area.as_str())).map(str::to_string),
        trend,
        trend_delta,
        by_call_type,
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
