use miette::Diagnostic;
use thiserror::Error;

use crate::cli::{Provider, ReportType};

// Codes are grouped like this:
// costlens::parse -> cli argument parsing/validation.
// costlens::config -> static tables, environment.
// costlens::api -> http/report errors.
// costlens::input -> things the user asked for that aren't there.

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Invalid pair: expected 'key=value', got '{0}'")]
    #[diagnostic(
        code(costlens::parse::pair),
        help("Please provide a key and a value separated by '=', like 'resolution=daily'.")
    )]
    InvalidPair(String),

    #[error("Unknown filter '{key}' with value '{value}'")]
    #[diagnostic(
        code(costlens::parse::filter),
        help(
            "Recognized filters are resolution, time_scope_units, time_scope_value, limit, offset and product_family."
        )
    )]
    InvalidFilter { key: String, value: String },

    #[error("Invalid sort direction '{0}'")]
    #[diagnostic(
        code(costlens::parse::order_by),
        help("Use 'asc' or 'desc', for example '--order-by total:desc'.")
    )]
    InvalidSortDirection(String),

    #[error("Can't break an item down by its own dimension '{0}'")]
    #[diagnostic(
        code(costlens::parse::drill_down),
        help("Pick another dimension with --by, or leave it out to use the next one.")
    )]
    SameDrillDownDimension(String),

    #[error("No resource path for the {report_type} report on {provider}")]
    #[diagnostic(
        code(costlens::config::report_path),
        help("This report type is not available for the selected provider.")
    )]
    ReportPathNotFound {
        provider: Provider,
        report_type: ReportType,
    },

    #[error("Failed to fetch '{key}': {message}")]
    #[diagnostic(
        code(costlens::api::request),
        help(
            "Check that COSTLENS_API_URL points at the cost management API and that COSTLENS_API_TOKEN is valid."
        )
    )]
    ReportFetch {
        key: String,
        status: Option<u16>,
        message: String,
    },

    #[error("The report '{0}' has not been fetched.")]
    #[diagnostic(code(costlens::api::not_fetched))]
    ReportNotFetched(String),

    #[error("No item '{0}' in the report.")]
    #[diagnostic(
        code(costlens::input::item),
        help("Run the same command without --expand to list the available item ids.")
    )]
    ItemNotFound(String),

    #[error("Source removal was not confirmed.")]
    #[diagnostic(
        code(costlens::input::confirmation),
        help("Pass --yes to remove a source without the prompt.")
    )]
    RemovalNotConfirmed,
}
