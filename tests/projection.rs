mod common;

use common::report;
use costlens::calculation::projection::{other_last, project};
use serde_json::json;

fn ids(report_json: serde_json::Value, id_key: &str) -> Vec<String> {
    project(Some(&report(report_json)), id_key, id_key)
        .into_iter()
        .map(|item| item.id)
        .collect()
}

#[test]
fn other_goes_last_keeping_the_rest_in_order() {
    let ids = ids(
        json!({ "data": [{ "values": [
            { "id": "A", "total": 10 },
            { "id": "Other", "total": 5 },
            { "id": "B", "total": 20 }
        ]}]}),
        "id",
    );

    assert_eq!(ids, vec!["A", "B", "Other"]);
}

#[test]
fn every_other_bucket_moves() {
    let ids = ids(
        json!({ "data": [{ "values": [
            { "project": "2 Others", "total": 1 },
            { "project": "web", "total": 2 },
            { "project": "Other", "total": 3 },
            { "project": "db", "total": 4 }
        ]}]}),
        "project",
    );

    assert_eq!(ids, vec!["web", "db", "2 Others", "Other"]);
}

#[test]
fn nothing_in_nothing_out() {
    assert!(project(None, "account", "account_alias").is_empty());
    assert!(ids(json!({ "data": [] }), "account").is_empty());
    assert!(other_last(vec![]).is_empty());
}

#[test]
fn date_keyed_report_lists_periods() {
    let items = project(
        Some(&report(json!({ "data": [
            { "date": "2019-01-01", "values": [{ "date": "2019-01-01", "total": 1.5, "units": "USD" }] },
            { "date": "2019-01-02", "values": [{ "date": "2019-01-02", "total": 2.5, "units": "USD" }] }
        ]}))),
        "date",
        "date",
    );

    let totals: Vec<(&str, f64)> = items
        .iter()
        .map(|item| (item.id.as_str(), item.value))
        .collect();

    assert_eq!(totals, vec![("2019-01-01", 1.5), ("2019-01-02", 2.5)]);
}
