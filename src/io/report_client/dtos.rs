use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A report payload as the cost management API returns it.
///
/// The shape of `data` depends on the report type and the group-by: grouped reports
/// nest buckets (`{ "date": .., "accounts": [ { "account": .., "values": [..] } ] }`),
/// key-only tag reports are a flat list of strings. It stays untyped here and the
/// projection walks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ReportMeta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<ReportLinks>,

    #[serde(default)]
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReportMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,

    /// Aggregate over every row of the report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<ReportTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReportTotal {
    #[serde(default)]
    pub value: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReportLinks {
    #[serde(default)]
    pub first: Option<String>,

    #[serde(default)]
    pub next: Option<String>,

    #[serde(default)]
    pub previous: Option<String>,

    #[serde(default)]
    pub last: Option<String>,
}

/// One leaf row inside a `values` array.
///
/// Dimension fields (`account`, `project`, `account_alias`, a tag name, ..) are
/// whatever the group-by asked for, so they are kept in `dimensions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReportValue {
    /// Period of the row, `YYYY-MM` or `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub total: f64,

    #[serde(default)]
    pub units: Option<String>,

    #[serde(default)]
    pub delta_value: Option<f64>,

    #[serde(default)]
    pub delta_percent: Option<f64>,

    #[serde(flatten)]
    pub dimensions: Map<String, Value>,
}

/// Response of the sources listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SourcesPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ReportMeta>,

    #[serde(default)]
    pub data: Vec<Source>,
}

/// A configured cost source, a cloud account or a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub uuid: String,

    pub name: String,

    /// `AWS` or `OCP`.
    #[serde(rename = "type")]
    pub source_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}
