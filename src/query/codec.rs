//! Query string encoding.
//!
//! Nested bags are flattened with the `outer[inner]=value` bracket convention, so
//! `Query { filter: { resolution: daily } }` becomes `filter[resolution]=daily`.
//! Decoding is best-effort: a pair that can't be decoded is skipped and the rest of
//! the string still counts.

use super::model::{GroupBySelector, OrderBy, Query, SortDirection};

const FILTER: &str = "filter";
const GROUP_BY: &str = "group_by";
const ORDER_BY: &str = "order_by";
const KEY_ONLY: &str = "key_only";
const DELTA: &str = "delta";

/// Serializes a query into its canonical query string, without a leading `?`.
pub fn serialize(query: &Query) -> String {
    let mut pairs: Vec<String> = vec![];

    for (key, value) in query.filter.pairs() {
        push_pair(&mut pairs, &nested(FILTER, &key), &value);
    }

    for (key, selector) in query.group_by.iter() {
        push_pair(&mut pairs, &nested(GROUP_BY, key), selector.as_str());
    }

    if let Some(OrderBy { key, direction }) = &query.order_by {
        push_pair(&mut pairs, &nested(ORDER_BY, key), direction.as_str());
    }

    if query.key_only {
        push_pair(&mut pairs, KEY_ONLY, "true");
    }

    if query.delta {
        push_pair(&mut pairs, DELTA, "true");
    }

    for (key, value) in query.extras.iter() {
        let encoded_key = match split_key(key) {
            Some(RawKey::Nested(outer, inner)) => nested(outer, inner),
            _ => encode(key),
        };

        push_pair(&mut pairs, &encoded_key, value);
    }

    pairs.join("&")
}

/// Parses a query string, or a location search string with its leading `?`.
pub fn parse(input: &str) -> Query {
    let input = input.strip_prefix('?').unwrap_or(input);
    let mut query = Query::default();

    for pair in input.split('&').filter(|pair| !pair.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));

        let Some(value) = decode(raw_value) else {
            continue;
        };

        match split_key(raw_key) {
            Some(RawKey::Plain(raw)) => {
                let Some(key) = decode(raw) else { continue };
                apply_plain(&mut query, key, value);
            }
            Some(RawKey::Nested(raw_outer, raw_inner)) => {
                let (Some(outer), Some(inner)) = (decode(raw_outer), decode(raw_inner)) else {
                    continue;
                };
                apply_nested(&mut query, outer, inner, value);
            }
            None => continue,
        }
    }

    query
}

fn apply_plain(query: &mut Query, key: String, value: String) {
    if key.is_empty() || value.is_empty() {
        return;
    }

    match key.as_str() {
        KEY_ONLY => query.key_only = value == "true",
        DELTA => query.delta = value == "true",
        _ => query.extras.insert(key, value),
    }
}

fn apply_nested(query: &mut Query, outer: String, inner: String, value: String) {
    if inner.is_empty() || value.is_empty() {
        return;
    }

    match outer.as_str() {
        FILTER => query.filter.set_lenient(&inner, &value),
        GROUP_BY => query
            .group_by
            .insert(inner, GroupBySelector::from(value.as_str())),
        ORDER_BY => {
            if let Ok(direction) = value.parse::<SortDirection>() {
                query.order_by = Some(OrderBy {
                    key: inner,
                    direction,
                });
            }
        }
        _ => query.extras.insert(format!("{outer}[{inner}]"), value),
    }
}

enum RawKey<'a> {
    Plain(&'a str),
    Nested(&'a str, &'a str),
}

/// Splits `outer[inner]`. Unmatched or trailing brackets give `None`.
fn split_key(raw: &str) -> Option<RawKey<'_>> {
    let Some(open) = raw.find('[') else {
        return match raw.contains(']') {
            true => None,
            false => Some(RawKey::Plain(raw)),
        };
    };

    let outer = &raw[..open];
    let inner = raw[open + 1..].strip_suffix(']')?;

    if outer.is_empty() || outer.contains(']') || inner.contains(['[', ']']) {
        return None;
    }

    Some(RawKey::Nested(outer, inner))
}

fn push_pair(pairs: &mut Vec<String>, encoded_key: &str, value: &str) {
    if value.is_empty() {
        return;
    }

    pairs.push(format!("{}={}", encoded_key, encode(value)));
}

fn nested(outer: &str, inner: &str) -> String {
    format!("{}[{}]", encode(outer), encode(inner))
}

/// Leaves readable components alone, `tag:environment` and `*` stay as they are.
fn encode(component: &str) -> String {
    let readable = component
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | ':' | '*' | ','));

    match readable {
        true => component.to_owned(),
        false => urlencoding::encode(component).into_owned(),
    }
}

/// `None` when the percent-decoded bytes aren't utf-8.
fn decode(component: &str) -> Option<String> {
    let spaced = component.replace('+', " ");

    urlencoding::decode(&spaced).ok().map(|decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::model::{Filter, Resolution, TimeScopeUnits};

    #[test]
    fn serializes_filter_with_brackets() {
        let query = Query {
            filter: Filter {
                resolution: Some(Resolution::Daily),
                ..Filter::default()
            },
            ..Query::default()
        };

        assert_eq!(serialize(&query), "filter[resolution]=daily");
    }

    #[test]
    fn serializes_every_section_in_order() {
        let mut query = Query {
            filter: Filter {
                time_scope_units: Some(TimeScopeUnits::Month),
                time_scope_value: Some(-1),
                resolution: Some(Resolution::Monthly),
                limit: Some(5),
                ..Filter::default()
            },
            order_by: Some("total:desc".parse().unwrap()),
            key_only: true,
            ..Query::default()
        };
        query.group_by.insert("cluster", GroupBySelector::Id("c1".to_owned()));
        query.group_by.insert("node", GroupBySelector::All);

        assert_eq!(
            serialize(&query),
            "filter[resolution]=monthly&filter[time_scope_units]=month&filter[time_scope_value]=-1&filter[limit]=5\
             &group_by[cluster]=c1&group_by[node]=*&order_by[total]=desc&key_only=true"
        );
    }

    #[test]
    fn empty_query_is_empty_string() {
        assert_eq!(serialize(&Query::default()), "");
    }

    #[test]
    fn encodes_unsafe_characters() {
        let mut query = Query::default();
        query
            .group_by
            .insert("tag:team name", GroupBySelector::Id("a&b".to_owned()));

        let serialized = serialize(&query);

        assert_eq!(serialized, "group_by[tag%3Ateam%20name]=a%26b");
        assert_eq!(parse(&serialized), query);
    }

    #[test]
    fn parses_tag_group_by_verbatim() {
        let query = parse("group_by[tag:environment]=prod");

        assert_eq!(
            query.group_by.get("tag:environment"),
            Some(&GroupBySelector::Id("prod".to_owned()))
        );
        assert!(query.filter.is_empty());
    }

    #[test]
    fn parses_location_search() {
        let query = parse("?group_by[account]=*&filter[time_scope_value]=-2&key_only=true");

        assert_eq!(query.group_by.get("account"), Some(&GroupBySelector::All));
        assert_eq!(query.filter.time_scope_value, Some(-2));
        assert!(query.key_only);
    }

    #[test]
    fn keeps_unknown_keys_where_they_appear() {
        let query = parse("filter[tag:app]=web&group_by[or:account]=*&page=2&links[next]=x");

        assert_eq!(query.filter.extras.get("tag:app").map(String::as_str), Some("web"));
        assert!(query.group_by.contains_key("or:account"));
        assert_eq!(query.extras.get("page").map(String::as_str), Some("2"));
        assert_eq!(query.extras.get("links[next]").map(String::as_str), Some("x"));
        assert_eq!(parse(&serialize(&query)), query);
    }

    #[test]
    fn skips_malformed_pairs() {
        let query = parse("filter[resolution=daily&group_by[account]]=*&filter[limit]=3&group_by[x]=%FF");

        assert_eq!(query.filter.resolution, None);
        assert!(query.group_by.is_empty());
        assert_eq!(query.filter.limit, Some(3));
    }

    #[test]
    fn plus_decodes_to_space() {
        let query = parse("filter[product_family]=Storage+Snapshot");

        assert_eq!(query.filter.product_family.as_deref(), Some("Storage Snapshot"));
    }

    #[test]
    fn empty_values_are_unset() {
        let query = parse("filter[limit]=&group_by[account]=&delta=");

        assert_eq!(query, Query::default());
    }
}
