mod common;

use common::{MockSource, orchestrator, report_with_total, server_error};
use costlens::cli::{Provider, ReportType};
use costlens::query::{Filter, GroupBySelector, Query, Resolution, codec};
use costlens::store::{FetchOutcome, FetchStatus, KeyPolicy, Subscription};

fn daily() -> Query {
    Query {
        filter: Filter {
            resolution: Some(Resolution::Daily),
            ..Filter::default()
        },
        ..Query::default()
    }
}

fn grouped(keys: &[&str]) -> Query {
    let mut query = daily();

    for key in keys {
        query.group_by.insert(*key, GroupBySelector::All);
    }

    query
}

#[test]
fn daily_cost_query_hits_the_aws_cost_resource() {
    let source = MockSource::new();
    let mut orchestrator = orchestrator(&source, Provider::Aws);

    assert_eq!(codec::serialize(&daily()), "filter[resolution]=daily");

    let outcome = orchestrator
        .ensure_fetched(ReportType::Cost, &daily(), false)
        .unwrap();

    assert_eq!(outcome, FetchOutcome::Fetched);
    assert_eq!(source.urls(), vec!["reports/costs/aws/?filter[resolution]=daily"]);
}

#[test]
fn unchanged_query_is_fetched_once() {
    let source = MockSource::new().respond(Ok(report_with_total(1.0)));
    let mut orchestrator = orchestrator(&source, Provider::Aws);

    orchestrator
        .ensure_fetched(ReportType::Cost, &daily(), false)
        .unwrap();
    let second = orchestrator
        .ensure_fetched(ReportType::Cost, &daily(), false)
        .unwrap();

    assert_eq!(second, FetchOutcome::Cached);
    assert_eq!(source.calls(), 1);
}

#[test]
fn force_fetches_again() {
    let source = MockSource::new()
        .respond(Ok(report_with_total(1.0)))
        .respond(Ok(report_with_total(2.0)));
    let mut orchestrator = orchestrator(&source, Provider::Aws);

    orchestrator
        .ensure_fetched(ReportType::Cost, &daily(), false)
        .unwrap();
    orchestrator
        .ensure_fetched(ReportType::Cost, &daily(), true)
        .unwrap();

    let entry = orchestrator.entry(ReportType::Cost, &daily()).unwrap();

    assert_eq!(source.calls(), 2);
    assert_eq!(entry.data, Some(report_with_total(2.0)));
}

#[test]
fn failed_refresh_keeps_the_last_report() {
    let source = MockSource::new()
        .respond(Ok(report_with_total(1.0)))
        .respond(Err(server_error()));
    let mut orchestrator = orchestrator(&source, Provider::Aws);

    orchestrator
        .ensure_fetched(ReportType::Cost, &daily(), false)
        .unwrap();
    let outcome = orchestrator
        .ensure_fetched(ReportType::Cost, &daily(), true)
        .unwrap();

    let entry = orchestrator.entry(ReportType::Cost, &daily()).unwrap();

    assert_eq!(outcome, FetchOutcome::Failed);
    assert_eq!(entry.status, FetchStatus::Error);
    assert_eq!(entry.error, Some(server_error()));
    assert_eq!(entry.data, Some(report_with_total(1.0)));

    let report = orchestrator
        .fetch_report(ReportType::Cost, &daily(), false)
        .unwrap();
    assert_eq!(report, &report_with_total(1.0));
}

#[test]
fn failed_fetch_is_not_retried_without_force() {
    let source = MockSource::new()
        .respond(Err(server_error()))
        .respond(Ok(report_with_total(3.0)));
    let mut orchestrator = orchestrator(&source, Provider::Aws);

    let first = orchestrator
        .ensure_fetched(ReportType::Cost, &daily(), false)
        .unwrap();
    let second = orchestrator
        .ensure_fetched(ReportType::Cost, &daily(), false)
        .unwrap();

    let entry = orchestrator.entry(ReportType::Cost, &daily()).unwrap();

    assert_eq!(first, FetchOutcome::Failed);
    assert_eq!(second, FetchOutcome::Errored);
    assert_eq!(entry.status, FetchStatus::Error);
    assert_eq!(source.calls(), 1);
}

#[test]
fn reading_after_a_failed_refresh_sends_nothing() {
    let source = MockSource::new()
        .respond(Ok(report_with_total(1.0)))
        .respond(Err(server_error()))
        .respond(Ok(report_with_total(9.0)));
    let mut orchestrator = orchestrator(&source, Provider::Aws);

    orchestrator
        .ensure_fetched(ReportType::Cost, &daily(), false)
        .unwrap();
    orchestrator
        .ensure_fetched(ReportType::Cost, &daily(), true)
        .unwrap();
    let report = orchestrator
        .fetch_report(ReportType::Cost, &daily(), false)
        .unwrap()
        .clone();

    let entry = orchestrator.entry(ReportType::Cost, &daily()).unwrap();

    assert_eq!(source.calls(), 2);
    assert_eq!(report, report_with_total(1.0));
    assert_eq!(entry.status, FetchStatus::Error);
}

#[test]
fn force_retries_a_failed_fetch() {
    let source = MockSource::new()
        .respond(Err(server_error()))
        .respond(Ok(report_with_total(3.0)));
    let mut orchestrator = orchestrator(&source, Provider::Aws);

    orchestrator
        .ensure_fetched(ReportType::Cost, &daily(), false)
        .unwrap();
    let retried = orchestrator
        .ensure_fetched(ReportType::Cost, &daily(), true)
        .unwrap();

    let entry = orchestrator.entry(ReportType::Cost, &daily()).unwrap();

    assert_eq!(retried, FetchOutcome::Fetched);
    assert_eq!(entry.status, FetchStatus::Complete);
    assert_eq!(source.calls(), 2);
}

#[test]
fn failure_without_data_surfaces_as_an_error() {
    let source = MockSource::new().respond(Err(server_error()));
    let mut orchestrator = orchestrator(&source, Provider::Aws);

    let result = orchestrator.fetch_report(ReportType::Cost, &daily(), false);

    assert!(result.is_err());
}

#[test]
fn in_flight_key_is_not_sent_twice() {
    let source = MockSource::new();
    let mut orchestrator = orchestrator(&source, Provider::Aws);

    let pending = orchestrator
        .dispatch(ReportType::Cost, &daily(), false)
        .unwrap();
    let outcome = orchestrator
        .ensure_fetched(ReportType::Cost, &daily(), false)
        .unwrap();

    assert!(pending.is_some());
    assert_eq!(outcome, FetchOutcome::Pending);
    assert_eq!(source.calls(), 0);
}

#[test]
fn late_response_of_an_older_request_is_dropped() {
    let source = MockSource::new();
    let mut orchestrator = orchestrator(&source, Provider::Aws);

    let older = orchestrator
        .dispatch(ReportType::Cost, &daily(), true)
        .unwrap()
        .unwrap();
    let newer = orchestrator
        .dispatch(ReportType::Cost, &daily(), true)
        .unwrap()
        .unwrap();

    assert!(orchestrator.settle(newer, Ok(report_with_total(2.0))));
    assert!(!orchestrator.settle(older, Ok(report_with_total(1.0))));

    let entry = orchestrator.entry(ReportType::Cost, &daily()).unwrap();

    assert_eq!(entry.status, FetchStatus::Complete);
    assert_eq!(entry.data, Some(report_with_total(2.0)));
}

#[test]
fn late_failure_of_an_older_request_is_dropped() {
    let source = MockSource::new();
    let mut orchestrator = orchestrator(&source, Provider::Aws);

    let older = orchestrator
        .dispatch(ReportType::Cost, &daily(), true)
        .unwrap()
        .unwrap();
    let newer = orchestrator
        .dispatch(ReportType::Cost, &daily(), true)
        .unwrap()
        .unwrap();

    assert!(orchestrator.settle(newer, Ok(report_with_total(2.0))));
    assert!(!orchestrator.settle(older, Err(server_error())));

    let entry = orchestrator.entry(ReportType::Cost, &daily()).unwrap();

    assert_eq!(entry.status, FetchStatus::Complete);
    assert!(entry.error.is_none());
}

#[test]
fn report_type_missing_for_the_provider_is_an_error() {
    let source = MockSource::new();
    let mut orchestrator = orchestrator(&source, Provider::Ocp);

    let result = orchestrator.ensure_fetched(ReportType::Storage, &daily(), false);

    assert!(result.is_err());
    assert_eq!(source.calls(), 0);
    assert!(orchestrator.store().is_empty());
}

#[test]
fn verbatim_keys_follow_insertion_order() {
    let source = MockSource::new();
    let mut orchestrator = orchestrator(&source, Provider::Aws);

    orchestrator
        .ensure_fetched(ReportType::Cost, &grouped(&["service", "account"]), false)
        .unwrap();
    orchestrator
        .ensure_fetched(ReportType::Cost, &grouped(&["account", "service"]), false)
        .unwrap();

    assert_eq!(source.calls(), 2);
    assert_eq!(orchestrator.store().len(), 2);
}

#[test]
fn sorted_keys_share_one_entry() {
    let source = MockSource::new();
    let mut orchestrator = orchestrator(&source, Provider::Aws).with_key_policy(KeyPolicy::Sorted);

    orchestrator
        .ensure_fetched(ReportType::Cost, &grouped(&["service", "account"]), false)
        .unwrap();
    orchestrator
        .ensure_fetched(ReportType::Cost, &grouped(&["account", "service"]), false)
        .unwrap();

    assert_eq!(source.calls(), 1);
    assert_eq!(
        source.urls(),
        vec!["reports/costs/aws/?filter[resolution]=daily&group_by[account]=*&group_by[service]=*"]
    );
}

#[test]
fn subscription_fetches_on_first_declaration_and_on_change() {
    let source = MockSource::new();
    let mut orchestrator = orchestrator(&source, Provider::Aws);
    let mut subscription = Subscription::new();

    let first = subscription
        .declare(&mut orchestrator, ReportType::Cost, &daily())
        .unwrap();
    let repeated = subscription
        .declare(&mut orchestrator, ReportType::Cost, &daily())
        .unwrap();
    let changed = subscription
        .declare(&mut orchestrator, ReportType::Cost, &grouped(&["account"]))
        .unwrap();

    assert_eq!(first, Some(FetchOutcome::Fetched));
    assert_eq!(repeated, None);
    assert_eq!(changed, Some(FetchOutcome::Fetched));
    assert_eq!(source.calls(), 2);
    assert_eq!(
        subscription.key().map(|key| key.as_str()),
        Some("cost/filter[resolution]=daily&group_by[account]=*")
    );
    assert!(subscription.entry(&orchestrator).is_some());
}

#[test]
fn subscriptions_share_the_store() {
    let source = MockSource::new();
    let mut orchestrator = orchestrator(&source, Provider::Aws);
    let mut chart = Subscription::new();
    let mut list = Subscription::new();

    chart
        .declare(&mut orchestrator, ReportType::Cost, &daily())
        .unwrap();
    let outcome = list
        .declare(&mut orchestrator, ReportType::Cost, &daily())
        .unwrap();

    assert_eq!(outcome, Some(FetchOutcome::Cached));
    assert_eq!(source.calls(), 1);
}
