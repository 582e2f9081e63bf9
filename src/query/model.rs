use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde::ser::Serializer;

use crate::error::Error;

/// An insertion-ordered bag of keyed values.
///
/// Inserting an existing key replaces its value in place. Equality ignores order,
/// two bags are equal when they hold the same keys with the same values.
#[derive(Debug, Clone)]
pub struct Params<V = String> {
    entries: Vec<(String, V)>,
}

impl<V> Default for Params<V> {
    fn default() -> Self {
        Params { entries: vec![] }
    }
}

impl<V> Params<V> {
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();

        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let index = self.entries.iter().position(|(existing, _)| existing == key)?;

        Some(self.entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reorders entries by key.
    pub fn sort_keys(&mut self) {
        self.entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    }
}

impl<V: PartialEq> PartialEq for Params<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|theirs| theirs == value))
    }
}

impl<V: Eq> Eq for Params<V> {}

impl<K: Into<String>, V> FromIterator<(K, V)> for Params<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::default();

        for (key, value) in iter {
            params.insert(key, value);
        }

        params
    }
}

impl<V: Serialize> Serialize for Params<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Daily,
    Monthly,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Daily => "daily",
            Resolution::Monthly => "monthly",
        }
    }
}

impl FromStr for Resolution {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Resolution::Daily),
            "monthly" => Ok(Resolution::Monthly),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeScopeUnits {
    Day,
    Month,
}

impl TimeScopeUnits {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeScopeUnits::Day => "day",
            TimeScopeUnits::Month => "month",
        }
    }
}

impl FromStr for TimeScopeUnits {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(TimeScopeUnits::Day),
            "month" => Ok(TimeScopeUnits::Month),
            _ => Err(()),
        }
    }
}

/// Report filter. Unset keys are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_scope_units: Option<TimeScopeUnits>,

    /// Negative offsets from now, -1 is the current period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_scope_value: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_family: Option<String>,

    /// Anything else, kept verbatim, for example `tag:environment`.
    #[serde(skip_serializing_if = "Params::is_empty", flatten)]
    pub extras: Params,
}

/// Filter keys with a typed slot, in emission order.
pub const FILTER_KEYS: [&str; 6] = [
    "resolution",
    "time_scope_units",
    "time_scope_value",
    "limit",
    "offset",
    "product_family",
];

impl Filter {
    /// Sets a filter, rejecting typed keys whose value doesn't fit.
    pub fn try_set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        if !FILTER_KEYS.contains(&key) {
            self.extras.insert(key, value.to_owned());
            return Ok(());
        }

        if self.set_typed(key, value) {
            return Ok(());
        }

        Err(Error::InvalidFilter {
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }

    /// Sets a filter, keeping anything that doesn't fit a typed slot in the extras.
    pub fn set_lenient(&mut self, key: &str, value: &str) {
        if !self.set_typed(key, value) {
            self.extras.insert(key, value.to_owned());
        }
    }

    /// Returns false when the key has no typed slot or the value doesn't parse.
    fn set_typed(&mut self, key: &str, value: &str) -> bool {
        match key {
            "resolution" => value.parse().map(|v| self.resolution = Some(v)).is_ok(),
            "time_scope_units" => value
                .parse()
                .map(|v| self.time_scope_units = Some(v))
                .is_ok(),
            "time_scope_value" => value
                .parse()
                .map(|v| self.time_scope_value = Some(v))
                .is_ok(),
            "limit" => value.parse().map(|v| self.limit = Some(v)).is_ok(),
            "offset" => value.parse().map(|v| self.offset = Some(v)).is_ok(),
            "product_family" if !value.is_empty() => {
                self.product_family = Some(value.to_owned());
                true
            }
            _ => false,
        }
    }

    /// Set filters as `(key, value)` strings, typed keys first in `FILTER_KEYS` order.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let typed = [
            self.resolution.map(|v| v.as_str().to_owned()),
            self.time_scope_units.map(|v| v.as_str().to_owned()),
            self.time_scope_value.map(|v| v.to_string()),
            self.limit.map(|v| v.to_string()),
            self.offset.map(|v| v.to_string()),
            self.product_family.clone(),
        ];

        FILTER_KEYS
            .iter()
            .zip(typed)
            .filter_map(|(key, value)| value.map(|value| ((*key).to_owned(), value)))
            .chain(
                self.extras
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone())),
            )
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }
}

/// A group-by value: one concrete id, or every value of the dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupBySelector {
    All,
    Id(String),
}

impl GroupBySelector {
    pub fn as_str(&self) -> &str {
        match self {
            GroupBySelector::All => "*",
            GroupBySelector::Id(id) => id,
        }
    }
}

impl From<&str> for GroupBySelector {
    fn from(value: &str) -> Self {
        match value {
            "*" => GroupBySelector::All,
            id => GroupBySelector::Id(id.to_owned()),
        }
    }
}

impl Serialize for GroupBySelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

pub type GroupBy = Params<GroupBySelector>;

pub const TAG_PREFIX: &str = "tag:";

/// `tag:<name>` group-by keys are dimensions of their own.
pub fn is_tag_key(key: &str) -> bool {
    key.starts_with(TAG_PREFIX)
}

pub fn tag_name(key: &str) -> Option<&str> {
    key.strip_prefix(TAG_PREFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(Error::InvalidSortDirection(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub key: String,
    pub direction: SortDirection,
}

/// Reads `key` or `key:direction`, ascending by default.
impl FromStr for OrderBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, direction) = match s.rsplit_once(':') {
            Some((key, direction)) if !key.is_empty() => (key, direction.parse()?),
            _ => (s, SortDirection::Asc),
        };

        Ok(OrderBy {
            key: key.to_owned(),
            direction,
        })
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.direction.as_str())
    }
}

/// Everything a report request asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Query {
    #[serde(skip_serializing_if = "Filter::is_empty")]
    pub filter: Filter,

    #[serde(skip_serializing_if = "Params::is_empty")]
    pub group_by: GroupBy,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,

    /// Ask for dimension keys only, not aggregated values.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub key_only: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub delta: bool,

    /// Top-level parameters with no dedicated slot.
    #[serde(skip_serializing_if = "Params::is_empty")]
    pub extras: Params,
}

impl Query {
    /// The same query with every keyed bag sorted by key.
    pub fn sorted(&self) -> Query {
        let mut sorted = self.clone();

        sorted.filter.extras.sort_keys();
        sorted.group_by.sort_keys();
        sorted.extras.sort_keys();

        sorted
    }
}
