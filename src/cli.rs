use std::fmt;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::dashboard;
use crate::error::Error;
use crate::query::{GroupBySelector, OrderBy, Query, codec};

impl Cli {
    /// Convenience constructor to avoid redundant `Parser` imports in main.
    pub fn new() -> Self {
        Cli::parse()
    }
}

impl QueryArgs {
    /// Builds the query the user described.
    ///
    /// A `--from-location` string is the starting point when given, otherwise the
    /// current month at monthly resolution. Flags are layered on top in order.
    pub fn try_into_query(&self) -> miette::Result<Query> {
        let mut query = match &self.from_location {
            Some(search) => codec::parse(search),
            None => Query {
                filter: dashboard::details_filter(),
                ..Query::default()
            },
        };

        for pair in &self.filter {
            let (key, value) = split_pair(pair)?;
            query.filter.try_set(key, value)?;
        }

        for pair in &self.group_by {
            let (key, value) = split_pair(pair)?;
            query.group_by.insert(key, GroupBySelector::from(value));
        }

        if let Some(order_by) = &self.order_by {
            query.order_by = Some(order_by.parse::<OrderBy>()?);
        }

        query.key_only |= self.key_only;
        query.delta |= self.delta;

        Ok(query)
    }
}

impl Commands {
    /// Only item listings pick a format, everything else prints text.
    pub fn output_format(&self) -> OutputFormat {
        match self {
            Commands::Report(args) => args.format,
            Commands::Details(args) => args.format,
            _ => OutputFormat::Text,
        }
    }
}

/// Splits `key=value`, both sides must be present.
fn split_pair(pair: &str) -> Result<(&str, &str), Error> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() && !value.is_empty() => Ok((key, value)),
        _ => Err(Error::InvalidPair(pair.to_owned())),
    }
}

// Structs

#[derive(Parser, Debug)]
#[command(name = "costlens", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    //
    // Global args start here..
    //

    //
    /// Base url of the cost management API.
    #[arg(
        long,
        env = "COSTLENS_API_URL",
        default_value = "http://localhost:8000/api/cost-management/v1/",
        global = true
    )]
    pub api_url: String,

    /// Bearer token sent with every request.
    #[arg(long, env = "COSTLENS_API_TOKEN", hide_env_values = true, global = true)]
    pub api_token: Option<String>,

    /// Which billing source family to report on.
    #[arg(long, default_value = "aws", global = true)]
    pub provider: Provider,

    /// Sort group-by and extra filter keys before building cache keys and requests.
    #[arg(long, default_value_t = false, global = true)]
    pub normalize_keys: bool,

    /// Skip animations
    #[arg(long, default_value_t = false, global = true)]
    pub no_animate: bool,

    /// No format.
    #[arg(long, default_value_t = false, global = true)]
    pub unformatted: bool,

    /// More logs on stderr, repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a report and list its items.
    Report(ReportArgs),

    /// List the items of a group-by with their share of the total.
    Details(DetailsArgs),

    /// Summaries and top items for every dashboard widget.
    Dashboard,

    /// List the tag keys available as group-by dimensions.
    Tags,

    /// Retrieve the raw report payload as JSON.
    ///
    /// Useful for piping into tools like `jq`.
    Raw(QueryArgs),

    /// Build or inspect query strings without touching the network.
    #[command(subcommand)]
    Query(QueryCommands),

    /// Manage cost sources.
    #[command(subcommand)]
    Sources(SourcesCommands),
}

#[derive(Args, Debug, Default)]
pub struct QueryArgs {
    /// Which report to fetch.
    #[arg(long = "type", default_value = "cost")]
    pub report_type: ReportType,

    /// Filter pair, for example 'resolution=daily'. Repeatable.
    #[arg(long)]
    pub filter: Vec<String>,

    /// Group-by pair, for example 'account=*' or 'tag:environment=prod'. Repeatable.
    #[arg(long)]
    pub group_by: Vec<String>,

    /// Sort key with an optional direction, for example 'total:desc'.
    #[arg(long)]
    pub order_by: Option<String>,

    /// Only ask for dimension keys.
    #[arg(long, default_value_t = false)]
    pub key_only: bool,

    /// Ask the API for deltas against the previous period.
    #[arg(long, default_value_t = false)]
    pub delta: bool,

    /// Start from a browser location search string, for example '?group_by[account]=*'.
    #[arg(long)]
    pub from_location: Option<String>,

    /// Fetch again even when the report is already in the store.
    #[arg(long, default_value_t = false)]
    pub refresh: bool,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// How to print the items.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct DetailsArgs {
    /// Dimension to group by. Defaults to the provider's main dimension.
    #[arg(long)]
    pub group_by: Option<String>,

    /// Item id to drill into.
    #[arg(long)]
    pub expand: Option<String>,

    /// Dimension for the drill-down, used with --expand.
    #[arg(long, requires = "expand")]
    pub by: Option<String>,

    /// Recover the group-by from a browser location search string when --group-by is absent.
    #[arg(long, conflicts_with = "group_by")]
    pub from_location: Option<String>,

    /// How to print the items.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum QueryCommands {
    /// Print the canonical query string for the given flags.
    Build(QueryArgs),

    /// Decode a query string and print it as JSON.
    Parse {
        /// A query string or location search string.
        input: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SourcesCommands {
    /// List the configured sources.
    List {
        /// Only sources whose name matches.
        #[arg(long)]
        search: Option<String>,
    },

    /// Delete a source.
    Remove {
        /// The source uuid.
        uuid: String,

        /// Don't ask.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Serialize, ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Text,
    Csv,
    Json,
}

#[derive(Clone, Copy, Debug, Default, Serialize, ValueEnum, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    #[default]
    Aws,
    Ocp,
    OcpOnAws,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Ocp => "ocp",
            Provider::OcpOnAws => "ocp-on-aws",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which API resource a query targets.
#[derive(Clone, Copy, Debug, Default, Serialize, ValueEnum, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ReportType {
    #[default]
    Cost,
    Storage,
    InstanceType,
    Tag,
    Cpu,
    Memory,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Cost => "cost",
            ReportType::Storage => "storage",
            ReportType::InstanceType => "instance-type",
            ReportType::Tag => "tag",
            ReportType::Cpu => "cpu",
            ReportType::Memory => "memory",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Resolution, SortDirection};

    #[test]
    fn flags_layer_on_top_of_the_location() {
        let args = QueryArgs {
            filter: vec!["resolution=daily".to_owned()],
            group_by: vec!["tag:environment=prod".to_owned()],
            order_by: Some("total:asc".to_owned()),
            from_location: Some("?filter[limit]=5&group_by[account]=*".to_owned()),
            ..QueryArgs::default()
        };

        let query = args.try_into_query().unwrap();

        assert_eq!(query.filter.resolution, Some(Resolution::Daily));
        assert_eq!(query.filter.limit, Some(5));
        assert_eq!(query.group_by.get("account"), Some(&GroupBySelector::All));
        assert_eq!(
            query.group_by.get("tag:environment"),
            Some(&GroupBySelector::Id("prod".to_owned()))
        );
        assert_eq!(query.order_by.unwrap().direction, SortDirection::Asc);
    }

    #[test]
    fn bare_flags_start_from_the_current_month() {
        let query = QueryArgs::default().try_into_query().unwrap();

        assert_eq!(codec::serialize(&query), "filter[resolution]=monthly&filter[time_scope_units]=month&filter[time_scope_value]=-1");
    }

    #[test]
    fn pair_without_value_is_rejected() {
        let args = QueryArgs {
            filter: vec!["resolution".to_owned()],
            ..QueryArgs::default()
        };

        assert!(args.try_into_query().is_err());
    }

    #[test]
    fn typed_filter_with_bad_value_is_rejected() {
        let args = QueryArgs {
            filter: vec!["limit=lots".to_owned()],
            ..QueryArgs::default()
        };

        assert!(args.try_into_query().is_err());
    }
}
