use crate::cli::Provider;
use crate::config::resources::group_by_dimensions;
use crate::error::Error;

use super::model::{Filter, GroupBy, GroupBySelector, Query, Resolution, TimeScopeUnits, is_tag_key};

/// What a report is keyed by when nothing is grouped.
pub const DATE_KEY: &str = "date";

const DRILL_DOWN_LIMIT: u32 = 5;

/// The first of the provider's dimensions present in the group-by, or `date`.
pub fn id_key_for_group_by(group_by: &GroupBy, provider: Provider) -> &'static str {
    group_by_dimensions(provider)
        .iter()
        .find(|dimension| group_by.contains_key(dimension))
        .copied()
        .unwrap_or(DATE_KEY)
}

/// Recovers the group-by the user last picked, typically from a location search.
///
/// A `tag:` key wins over plain dimensions. With nothing grouped the provider's
/// default dimension is used.
pub fn current_group_by(query: &Query, provider: Provider) -> String {
    if let Some(tag_key) = query.group_by.keys().find(|key| is_tag_key(key)) {
        return tag_key.to_owned();
    }

    match id_key_for_group_by(&query.group_by, provider) {
        DATE_KEY => default_group_by(provider).to_owned(),
        key => key.to_owned(),
    }
}

/// The row field a report's items are keyed by: a `tag:` group-by, else the id key.
pub fn report_id_key(query: &Query, provider: Provider) -> String {
    match query.group_by.keys().find(|key| is_tag_key(key)) {
        Some(tag_key) => tag_key.to_owned(),
        None => id_key_for_group_by(&query.group_by, provider).to_owned(),
    }
}

pub fn default_group_by(provider: Provider) -> &'static str {
    match provider {
        Provider::Aws => "account",
        Provider::Ocp | Provider::OcpOnAws => "project",
    }
}

/// Which row field carries a readable name for an id.
pub fn label_key_for(id_key: &str) -> String {
    match id_key {
        "account" => "account_alias".to_owned(),
        other => other.to_owned(),
    }
}

/// The query behind an expanded item: this month, top five, `item_id` broken down by `group_by`.
///
/// Breaking an item down by its own dimension would overwrite the pinned id with `*`
/// and list every item again, so that is refused.
pub fn drill_down_query(
    parent: &Query,
    provider: Provider,
    item_id: &str,
    group_by: &str,
) -> Result<Query, Error> {
    let parent_id_key = report_id_key(parent, provider);

    if parent_id_key == group_by {
        return Err(Error::SameDrillDownDimension(group_by.to_owned()));
    }

    let mut query = Query {
        filter: Filter {
            time_scope_units: Some(TimeScopeUnits::Month),
            time_scope_value: Some(-1),
            resolution: Some(Resolution::Monthly),
            limit: Some(DRILL_DOWN_LIMIT),
            ..Filter::default()
        },
        ..Query::default()
    };

    query
        .group_by
        .insert(parent_id_key, GroupBySelector::Id(item_id.to_owned()));
    query.group_by.insert(group_by, GroupBySelector::All);

    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::codec;

    #[test]
    fn id_key_follows_dimension_order() {
        let query = codec::parse("group_by[region]=*&group_by[account]=123");

        assert_eq!(id_key_for_group_by(&query.group_by, Provider::Aws), "account");
    }

    #[test]
    fn id_key_defaults_to_date() {
        let query = codec::parse("group_by[tag:app]=*");

        assert_eq!(id_key_for_group_by(&query.group_by, Provider::Ocp), DATE_KEY);
    }

    #[test]
    fn tag_key_wins_current_group_by() {
        let query = codec::parse("?group_by[project]=*&group_by[tag:environment]=*");

        assert_eq!(current_group_by(&query, Provider::Ocp), "tag:environment");
    }

    #[test]
    fn current_group_by_falls_back_per_provider() {
        let query = codec::parse("");

        assert_eq!(current_group_by(&query, Provider::Aws), "account");
        assert_eq!(current_group_by(&query, Provider::OcpOnAws), "project");
    }

    #[test]
    fn report_id_key_prefers_tags() {
        let tagged = codec::parse("group_by[account]=*&group_by[tag:app]=*");
        let dated = codec::parse("filter[resolution]=daily");

        assert_eq!(report_id_key(&tagged, Provider::Aws), "tag:app");
        assert_eq!(report_id_key(&dated, Provider::Aws), DATE_KEY);
    }

    #[test]
    fn drill_down_pins_the_parent_item() {
        let parent = codec::parse("group_by[cluster]=*");

        let query = drill_down_query(&parent, Provider::Ocp, "prod-cluster", "node").unwrap();

        assert_eq!(
            codec::serialize(&query),
            "filter[resolution]=monthly&filter[time_scope_units]=month&filter[time_scope_value]=-1\
             &filter[limit]=5&group_by[cluster]=prod-cluster&group_by[node]=*"
        );
    }

    #[test]
    fn drill_down_by_the_parent_dimension_is_refused() {
        let parent = codec::parse("group_by[account]=*");

        assert!(matches!(
            drill_down_query(&parent, Provider::Aws, "111", "account"),
            Err(Error::SameDrillDownDimension(dimension)) if dimension == "account"
        ));
    }
}
