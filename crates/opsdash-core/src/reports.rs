//! Reporting service: KPI reports and quality records

use crate::config::DashConfig;
use crate::error::{DashError, DashResult};
use opsdash_analytics::{analyze, analyze_employee, EmployeeQuality, QualityOverview, ReportView};
use opsdash_model::{EntityKind, KpiReport, KpiReportDraft, QualityDraft, QualityRecord, RecordId};
use opsdash_repo::{Clock, Collections, IdGenerator, Repository, SystemClock};
use opsdash_store::KeyValueStore;
use std::sync::Arc;

/// KPI reports and quality records over one store
#[derive(Debug, Clone)]
pub struct ReportDesk {
    reports: Repository<KpiReport>,
    quality: Repository<QualityRecord>,
}

impl ReportDesk {
    /// Create with the system clock
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, config: &DashConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create with an explicit clock
    #[must_use]
    pub fn with_clock(store: Arc<dyn KeyValueStore>, config: &DashConfig, clock: Arc<dyn Clock>) -> Self {
        let collections = Collections::new(store).with_max_retries(config.max_write_retries);
        let ids = Arc::new(IdGenerator::new(config.id_strategy));
        Self {
            reports: Repository::with_parts(collections.clone(), Arc::clone(&ids), Arc::clone(&clock)),
            quality: Repository::with_parts(collections, ids, clock),
        }
    }

    // KPI reports

    /// Save a new report
    ///
    /// # Errors
    /// Returns a validation error for a report without a name
    pub fn create_report(&self, draft: KpiReportDraft) -> DashResult<KpiReport> {
        Ok(self.reports.create(None, draft)?)
    }

    /// All reports in stored order
    ///
    /// # Errors
    /// Returns error if the store fails
    pub fn reports(&self) -> DashResult<Vec<KpiReport>> {
        Ok(self.reports.list(None)?)
    }

    /// Report with `id`
    ///
    /// # Errors
    /// Returns [`DashError::NotFound`] if no report has `id`
    pub fn report(&self, id: &RecordId) -> DashResult<KpiReport> {
        self.reports
            .get(None, id)?
            .ok_or_else(|| DashError::not_found(EntityKind::KpiReport, id.clone()))
    }

    /// Display view of the report with `id`, blank rows removed
    ///
    /// # Errors
    /// Returns [`DashError::NotFound`] if no report has `id`
    pub fn report_view(&self, id: &RecordId) -> DashResult<ReportView> {
        Ok(ReportView::of(&self.report(id)?))
    }

    /// Remove the report with `id`
    ///
    /// # Errors
    /// Returns [`DashError::NotFound`] if no report has `id`
    pub fn delete_report(&self, id: &RecordId) -> DashResult<KpiReport> {
        Ok(self.reports.delete(None, id)?)
    }

    // Quality records

    /// Save a new quality record
    ///
    /// # Errors
    /// Returns a validation error for a missing name or a score outside 0..=100
    pub fn record_quality(&self, draft: QualityDraft) -> DashResult<QualityRecord> {
        Ok(self.quality.create(None, draft)?)
    }

    /// All quality records in stored order
    ///
    /// # Errors
    /// Returns error if the store fails
    pub fn quality_records(&self) -> DashResult<Vec<QualityRecord>> {
        Ok(self.quality.list(None)?)
    }

    /// Remove the quality record with `id`
    ///
    /// # Errors
    /// Returns [`DashError::NotFound`] if no record has `id`
    pub fn delete_quality_record(&self, id: &RecordId) -> DashResult<QualityRecord> {
        Ok(self.quality.delete(None, id)?)
    }

    /// Per-employee analysis, recomputed from a fresh read
    ///
    /// # Errors
    /// Returns error if the store fails
    pub fn quality_overview(&self) -> DashResult<QualityOverview> {
        Ok(analyze(&self.quality_records()?))
    }

    /// Analysis of one employee
    ///
    /// # Errors
    /// Returns [`DashError::NotFound`] if the employee has no records
    pub fn employee_quality(&self, employee_name: &str) -> DashResult<EmployeeQuality> {
        analyze_employee(&self.quality_records()?, employee_name)
            .ok_or_else(|| DashError::not_found(EntityKind::QualityRecord, employee_name))
    }
}
