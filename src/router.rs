use std::io::{BufRead, Write};

use crate::app::App;
use crate::calculation::item_report::{ItemReport, render_value};
use crate::calculation::projection::{ComputedReportItem, project, tag_group_by_options, tag_keys};
use crate::cli::{
    Commands, DetailsArgs, Provider, QueryArgs, QueryCommands, ReportType, SourcesCommands,
};
use crate::config::dashboard::{
    default_filters, details_filter, query_for_widget, query_for_widget_tabs, tab_filters,
    widgets_for,
};
use crate::config::resources::group_by_dimensions;
use crate::error::Error;
use crate::io::report_client::{HttpReportSource, Report};
use crate::prelude::*;
use crate::query::selection::{
    current_group_by, default_group_by, drill_down_query, label_key_for, report_id_key,
};
use crate::query::{Filter, GroupBySelector, Query, Resolution, TimeScopeUnits, codec};
use crate::store::{FetchOrchestrator, ReportSource, Subscription};

/// Runs the command the user asked for and returns what to print.
pub fn route(app: &mut App) -> AppResult<ItemReport> {
    let App {
        cli,
        spinner,
        orchestrator,
    } = app;

    let no_animate = cli.no_animate;

    match &cli.command {
        // costlens report.
        Commands::Report(args) => {
            spinner.start_unless_no_terminal_or(no_animate, "Fetching report");
            report_items(orchestrator, &args.query)
        }

        // costlens details.
        Commands::Details(args) => {
            spinner.start_unless_no_terminal_or(no_animate, "Fetching details");
            details_items(orchestrator, args)
        }

        // costlens dashboard.
        Commands::Dashboard => {
            spinner.start_unless_no_terminal_or(no_animate, "Fetching dashboard");
            dashboard_sections(orchestrator)
        }

        // costlens tags.
        Commands::Tags => {
            spinner.start_unless_no_terminal_or(no_animate, "Fetching tag keys");
            tag_options(orchestrator)
        }

        // costlens raw.
        Commands::Raw(args) => {
            spinner.start_unless_no_terminal_or(no_animate, "Fetching report");
            raw_report(orchestrator, args, cli.unformatted)
        }

        // costlens query build.
        Commands::Query(QueryCommands::Build(args)) => {
            let query = args.try_into_query()?;
            Ok(ItemReport::Lines(vec![codec::serialize(&query)]))
        }

        // costlens query parse.
        Commands::Query(QueryCommands::Parse { input }) => {
            let query = codec::parse(input);
            Ok(ItemReport::Raw(to_json(&query, cli.unformatted)?))
        }

        // costlens sources list.
        Commands::Sources(SourcesCommands::List { search }) => {
            spinner.start_unless_no_terminal_or(no_animate, "Fetching sources");
            list_sources(orchestrator.source(), search.as_deref())
        }

        // costlens sources remove.
        Commands::Sources(SourcesCommands::Remove { uuid, yes }) => {
            if !*yes && !confirm(&format!("Remove source {}?", uuid))? {
                return Err(Error::RemovalNotConfirmed.into());
            }

            spinner.start_unless_no_terminal_or(no_animate, "Removing source");
            orchestrator.source().delete_source(uuid)?;
            info!(%uuid, "source removed");

            Ok(ItemReport::Lines(vec![format!("Removed {}", uuid)]))
        }
    }
}

/// Items of any report. Key-only queries list keys instead.
pub fn report_items<S: ReportSource>(
    orchestrator: &mut FetchOrchestrator<S>,
    args: &QueryArgs,
) -> AppResult<ItemReport> {
    let query = args.try_into_query()?;
    let provider = orchestrator.provider();
    let report = orchestrator.fetch_report(args.report_type, &query, args.refresh)?;

    if query.key_only || args.report_type == ReportType::Tag {
        return Ok(ItemReport::Lines(tag_keys(Some(report))));
    }

    let id_key = report_id_key(&query, provider);
    let items = project(Some(report), &id_key, &label_key_for(&id_key));

    Ok(ItemReport::items(items))
}

/// Cost items for one dimension with their share of the total, or the
/// breakdown of a single item when `--expand` is given.
pub fn details_items<S: ReportSource>(
    orchestrator: &mut FetchOrchestrator<S>,
    args: &DetailsArgs,
) -> AppResult<ItemReport> {
    let provider = orchestrator.provider();
    let group_by = match (&args.group_by, &args.from_location) {
        (Some(group_by), _) => group_by.clone(),
        (None, Some(search)) => current_group_by(&codec::parse(search), provider),
        (None, None) => default_group_by(provider).to_owned(),
    };

    let mut query = Query {
        filter: details_filter(),
        ..Query::default()
    };
    query.group_by.insert(group_by.as_str(), GroupBySelector::All);

    let report = orchestrator.fetch_report(ReportType::Cost, &query, false)?;
    let items = project(Some(report), &group_by, &label_key_for(&group_by));
    let total = report_total(report);

    let Some(item_id) = &args.expand else {
        return Ok(ItemReport::Items {
            items,
            total,
            fraction_digits: 2,
        });
    };

    let parent = find_item(&items, item_id)?;
    let by = args
        .by
        .clone()
        .unwrap_or_else(|| next_dimension(provider, &group_by).to_owned());

    let child_query = drill_down_query(&query, provider, &parent.id, &by)?;
    let child = orchestrator.fetch_report(ReportType::Cost, &child_query, false)?;

    Ok(ItemReport::Items {
        items: project(Some(child), &by, &label_key_for(&by)),
        total: Some(parent.value),
        fraction_digits: 2,
    })
}

/// One section per widget: its total in the title, the current tab's top items below.
pub fn dashboard_sections<S: ReportSource>(
    orchestrator: &mut FetchOrchestrator<S>,
) -> AppResult<ItemReport> {
    let provider = orchestrator.provider();
    let mut sections = vec![];

    for widget in widgets_for(provider) {
        let mut summary = Subscription::new();
        let mut tabs = Subscription::new();

        summary.declare(orchestrator, widget.report_type, &query_for_widget(default_filters()))?;
        tabs.declare(
            orchestrator,
            widget.report_type,
            &query_for_widget_tabs(widget, tab_filters()),
        )?;

        let summary_report = usable(&summary, orchestrator);
        let total = summary_report.and_then(report_total);
        let units = summary_report.and_then(report_units);

        let dimension = widget.current_tab.dimension();
        let items = project(
            usable(&tabs, orchestrator),
            dimension,
            &label_key_for(dimension),
        );

        let title = match total {
            Some(total) => format!(
                "{} {} (top {})",
                widget.title,
                render_value(total, units.as_deref(), widget.fraction_digits, false),
                dimension
            ),
            None => format!("{} unavailable", widget.title),
        };

        sections.push((
            title,
            ItemReport::Items {
                items,
                total,
                fraction_digits: widget.fraction_digits,
            },
        ));
    }

    Ok(ItemReport::Sections(sections))
}

/// Tag keys of this month as group-by options.
pub fn tag_options<S: ReportSource>(
    orchestrator: &mut FetchOrchestrator<S>,
) -> AppResult<ItemReport> {
    let report = orchestrator.fetch_report(ReportType::Tag, &tag_keys_query(), false)?;

    Ok(ItemReport::Lines(tag_group_by_options(&tag_keys(Some(report)))))
}

pub fn raw_report<S: ReportSource>(
    orchestrator: &mut FetchOrchestrator<S>,
    args: &QueryArgs,
    no_format: bool,
) -> AppResult<ItemReport> {
    let query = args.try_into_query()?;
    let report = orchestrator.fetch_report(args.report_type, &query, args.refresh)?;

    Ok(ItemReport::Raw(to_json(report, no_format)?))
}

/// Key-only tag query over the current month.
pub fn tag_keys_query() -> Query {
    Query {
        filter: Filter {
            resolution: Some(Resolution::Monthly),
            time_scope_units: Some(TimeScopeUnits::Month),
            time_scope_value: Some(-1),
            ..Filter::default()
        },
        key_only: true,
        ..Query::default()
    }
}

// private

fn list_sources(source: &HttpReportSource, search: Option<&str>) -> AppResult<ItemReport> {
    let page = source.list_sources(search)?;

    let lines = page
        .data
        .iter()
        .map(|source| format!("{}\t{}\t{}", source.uuid, source.source_type, source.name))
        .collect();

    Ok(ItemReport::Lines(lines))
}

/// A subscription's report, if there's anything to show. Failures are logged
/// so one broken widget doesn't take the dashboard down.
fn usable<'a, S: ReportSource>(
    subscription: &Subscription,
    orchestrator: &'a FetchOrchestrator<S>,
) -> Option<&'a Report> {
    let key = subscription.key()?;
    let entry = subscription.entry(orchestrator)?;

    match entry.usable_report(key) {
        Ok(report) => Some(report),
        Err(error) => {
            warn!(%key, %error, "widget report unavailable");
            None
        }
    }
}

fn report_total(report: &Report) -> Option<f64> {
    report.meta.as_ref()?.total.as_ref().map(|total| total.value)
}

fn report_units(report: &Report) -> Option<String> {
    report.meta.as_ref()?.total.as_ref()?.units.clone()
}

fn find_item<'a>(items: &'a [ComputedReportItem], id: &str) -> Result<&'a ComputedReportItem, Error> {
    items
        .iter()
        .find(|item| item.id == id)
        .ok_or_else(|| Error::ItemNotFound(id.to_owned()))
}

/// The provider dimension after `group_by`, wrapping around.
fn next_dimension(provider: Provider, group_by: &str) -> &'static str {
    let dimensions = group_by_dimensions(provider);

    let next = dimensions
        .iter()
        .position(|dimension| *dimension == group_by)
        .map(|index| (index + 1) % dimensions.len())
        .unwrap_or(0);

    dimensions[next]
}

fn to_json<T: Serialize>(value: &T, no_format: bool) -> AppResult<String> {
    let json = match no_format {
        true => serde_json::to_string(value),
        false => serde_json::to_string_pretty(value),
    };

    json.into_diagnostic()
}

fn confirm(prompt: &str) -> AppResult<bool> {
    eprint!("{} [y/N] ", prompt);
    std::io::stderr().flush().into_diagnostic()?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .into_diagnostic()
        .wrap_err("Failed to read the confirmation")?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
