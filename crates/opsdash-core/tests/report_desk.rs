use opsdash_core::DashError;
use opsdash_model::{KpiReportDraft, KpiRow, QualityDraft};
use opsdash_store::KeyValueStore;
use opsdash_test_utils::{weekly_quality, Fixture};
use pretty_assertions::assert_eq;

#[test]
fn weekly_quality_summary() {
    let f = Fixture::default();
    for draft in weekly_quality("Sara") {
        f.desk.record_quality(draft).unwrap();
    }
    f.desk
        .record_quality(QualityDraft::new("Omar", "2024-05-02", 70.0, "").with_call_type("Billing"))
        .unwrap();

    let overview = f.desk.quality_overview().unwrap();
    assert_eq!(overview.records, 5);

    let sara = &overview.employees[0];
    assert_eq!(sara.employee_name, "Sara");
    assert_eq!(sara.mean_score, 85.75);
    assert_eq!(sara.weakest_area.as_deref(), Some("Diagnosis"));
    assert_eq!(sara.trend_delta, Some(3.0));

    let omar = &overview.employees[1];
    assert_eq!(omar.weakest_area, None);
    assert_eq!(omar.by_call_type[0].call_type, "Billing");
}

#[test]
fn corrupt_quality_collection_analyzes_as_empty() {
    let f = Fixture::default();
    f.store.set("quality_records", "][").unwrap();

    let overview = f.desk.quality_overview().unwrap();
    assert!(overview.employees.is_empty());
    assert_eq!(overview.mean_score, None);
}

#[test]
fn reports_keep_insertion_order_and_month_labels() {
    let f = Fixture::default();
    for (name, month) in [("April", "2024-04"), ("May", "2024-05")] {
        f.desk
            .create_report(KpiReportDraft {
                name: name.into(),
                month: month.into(),
                rows: vec![KpiRow::new("AHT", ""), KpiRow::default()],
                ..KpiReportDraft::default()
            })
            .unwrap();
    }

    let reports = f.desk.reports().unwrap();
    let labels: Vec<_> = reports.iter().map(|r| r.month_label.as_str()).collect();
    assert_eq!(labels, vec!["April 2024", "May 2024"]);
    assert_eq!(reports[0].created_at, "2024-05-01T08:00:00.000Z");

    let view = f.desk.report_view(&reports[1].id).unwrap();
    assert_eq!(view.rows, vec![KpiRow::new("AHT", "")]);
}

#[test]
fn nameless_report_is_rejected() {
    let f = Fixture::default();
    let err = f.desk.create_report(KpiReportDraft::default()).unwrap_err();
    assert!(matches!(err, DashError::Validation(_)));
}
