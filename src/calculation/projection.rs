use itertools::Itertools;
use jiff::civil::Date;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::io::report_client::{Report, ReportValue};
use crate::query::model::{TAG_PREFIX, tag_name};

/// Ids containing this are the API's catch-all bucket.
const OTHER_MARKER: &str = "Other";

/// One report row shaped for a list or a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedReportItem {
    pub id: String,
    pub label: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    pub delta_value: f64,
    pub delta_percent: f64,
}

/// Shapes a report into items keyed by `id_key`, labelled by `label_key`.
///
/// Items keep the order they first appear in. Values sum every row of the item.
/// Deltas come from the API when it reported them, otherwise from the two most
/// recent periods in the report. Catch-all `Other` items always go last.
pub fn project(report: Option<&Report>, id_key: &str, label_key: &str) -> Vec<ComputedReportItem> {
    let Some(report) = report else {
        return vec![];
    };

    let values = collect_values(&report.data);
    let periods = recent_periods(&values);

    let grouped = group_in_order(
        values
            .iter()
            .filter_map(|value| row_id(value, id_key).map(|id| (id, value))),
    );

    let items = grouped
        .into_iter()
        .map(|(id, rows)| compute_item(id, rows, label_key, periods.as_ref()))
        .collect();

    other_last(items)
}

/// Keys of a key-only tag report, duplicates pruned, order kept.
pub fn tag_keys(report: Option<&Report>) -> Vec<String> {
    report
        .map(|report| {
            report
                .data
                .iter()
                .filter_map(Value::as_str)
                .unique()
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Group-by options for tag keys, `environment` becomes `tag:environment`.
pub fn tag_group_by_options(keys: &[String]) -> Vec<String> {
    keys.iter().map(|key| format!("{}{}", TAG_PREFIX, key)).collect()
}

/// Moves every `Other` item behind the rest, both groups keep their order.
pub fn other_last(items: Vec<ComputedReportItem>) -> Vec<ComputedReportItem> {
    let (others, mut rest): (Vec<_>, Vec<_>) = items
        .into_iter()
        .partition(|item| item.id.contains(OTHER_MARKER));

    rest.extend(others);
    rest
}

// private

fn compute_item(
    id: String,
    rows: Vec<&ReportValue>,
    label_key: &str,
    periods: Option<&(String, String)>,
) -> ComputedReportItem {
    let label = rows
        .iter()
        .find_map(|row| dimension_string(row, label_key))
        .unwrap_or_else(|| id.clone());
    let value = rows.iter().map(|row| row.total).sum();
    let units = rows.iter().find_map(|row| row.units.clone());

    let (delta_value, delta_percent) = reported_delta(&rows, value)
        .or_else(|| periods.map(|periods| period_delta(&rows, periods)))
        .unwrap_or((0.0, 0.0));

    ComputedReportItem {
        id,
        label,
        value,
        units,
        delta_value,
        delta_percent,
    }
}

/// Sums the API's own deltas, `None` when no row carries one.
fn reported_delta(rows: &[&ReportValue], value: f64) -> Option<(f64, f64)> {
    let reported: Vec<&ReportValue> = rows
        .iter()
        .copied()
        .filter(|row| row.delta_value.is_some())
        .collect();

    match reported.as_slice() {
        [] => None,
        [only] => Some((
            only.delta_value.unwrap_or_default(),
            only.delta_percent.unwrap_or_default(),
        )),
        many => {
            let delta_value: f64 = many.iter().filter_map(|row| row.delta_value).sum();
            Some((delta_value, percent_change(delta_value, value - delta_value)))
        }
    }
}

/// Current period total minus the previous one.
fn period_delta(rows: &[&ReportValue], (current, previous): &(String, String)) -> (f64, f64) {
    let total_at = |period: &str| -> f64 {
        rows.iter()
            .filter(|row| row.date.as_deref() == Some(period))
            .map(|row| row.total)
            .sum()
    };

    let current_total = total_at(current.as_str());
    let previous_total = total_at(previous.as_str());
    let delta_value = current_total - previous_total;

    (delta_value, percent_change(delta_value, previous_total))
}

fn percent_change(delta_value: f64, base: f64) -> f64 {
    match base == 0.0 {
        true => 0.0,
        false => delta_value / base * 100.0,
    }
}

/// The latest two periods of the report, latest first. `None` with fewer than two.
fn recent_periods(values: &[ReportValue]) -> Option<(String, String)> {
    let mut periods = values
        .iter()
        .filter_map(|value| value.date.as_deref())
        .unique()
        .sorted_by_key(|period| period_sort_key(period))
        .rev();

    let current = periods.next()?.to_owned();
    let previous = periods.next()?.to_owned();

    Some((current, previous))
}

/// Orders `YYYY-MM` and `YYYY-MM-DD` periods by date, anything unparseable sorts first by text.
fn period_sort_key(period: &str) -> (Option<Date>, String) {
    let date = period
        .parse::<Date>()
        .or_else(|_| format!("{}-01", period).parse::<Date>())
        .ok();

    (date, period.to_owned())
}

/// Finds every leaf row: objects inside any `values` array, however deep.
fn collect_values(data: &[Value]) -> Vec<ReportValue> {
    let mut values = vec![];

    for datum in data {
        walk(datum, &mut values);
    }

    values
}

fn walk(node: &Value, values: &mut Vec<ReportValue>) {
    let Value::Object(map) = node else {
        if let Value::Array(items) = node {
            items.iter().for_each(|item| walk(item, values));
        }
        return;
    };

    for (key, child) in map {
        match (key.as_str(), child) {
            ("values", Value::Array(rows)) => {
                for row in rows {
                    match serde_json::from_value::<ReportValue>(row.clone()) {
                        Ok(value) => values.push(value),
                        Err(error) => debug!(%error, "skipping a report row"),
                    }
                }
            }
            (_, Value::Array(_) | Value::Object(_)) => walk(child, values),
            _ => {}
        }
    }
}

/// The row's id for `id_key`. Tag keys also match the bare tag name.
fn row_id(row: &ReportValue, id_key: &str) -> Option<String> {
    dimension_string(row, id_key).or_else(|| {
        tag_name(id_key).and_then(|name| dimension_string(row, name))
    })
}

fn dimension_string(row: &ReportValue, key: &str) -> Option<String> {
    if key == "date" {
        return row.date.clone();
    }

    match row.dimensions.get(key)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Groups rows by id, ids in the order they first appear.
fn group_in_order<'a>(
    rows: impl Iterator<Item = (String, &'a ReportValue)>,
) -> Vec<(String, Vec<&'a ReportValue>)> {
    let mut groups: Vec<(String, Vec<&'a ReportValue>)> = vec![];

    for (id, row) in rows {
        match groups.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, grouped)) => grouped.push(row),
            None => groups.push((id, vec![row])),
        }
    }

    groups
}
