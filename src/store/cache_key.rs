use std::fmt;

use serde::Serialize;

use crate::cli::ReportType;
use crate::query::{Query, codec};

/// Identifies one report in the store: `<report_type>/<query_string>`.
///
/// The query string is taken as is, so two equal queries serialized in a different
/// order get different keys unless `KeyPolicy::Sorted` is used to build them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(report_type: ReportType, query_string: &str) -> Self {
        CacheKey(format!("{}/{}", report_type, query_string))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a query becomes the string used for both the cache key and the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Insertion order, as the caller built the query.
    #[default]
    Verbatim,
    /// Keyed bags sorted first, equal queries share one entry and one request.
    Sorted,
}

impl KeyPolicy {
    pub fn query_string(&self, query: &Query) -> String {
        match self {
            KeyPolicy::Verbatim => codec::serialize(query),
            KeyPolicy::Sorted => codec::serialize(&query.sorted()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_type_slash_query() {
        let key = CacheKey::new(ReportType::InstanceType, "filter[resolution]=daily");

        assert_eq!(key.as_str(), "instance-type/filter[resolution]=daily");
    }

    #[test]
    fn verbatim_keeps_caller_order() {
        let one = codec::parse("group_by[account]=*&group_by[region]=*");
        let other = codec::parse("group_by[region]=*&group_by[account]=*");

        let policy = KeyPolicy::Verbatim;

        assert_eq!(one, other);
        assert_ne!(
            CacheKey::new(ReportType::Cost, &policy.query_string(&one)),
            CacheKey::new(ReportType::Cost, &policy.query_string(&other))
        );
    }

    #[test]
    fn sorted_shares_one_key() {
        let one = codec::parse("group_by[account]=*&group_by[region]=*");
        let other = codec::parse("group_by[region]=*&group_by[account]=*");

        let policy = KeyPolicy::Sorted;

        assert_eq!(policy.query_string(&one), "group_by[account]=*&group_by[region]=*");
        assert_eq!(policy.query_string(&one), policy.query_string(&other));
    }
}
