use crate::cli::Cli;
use crate::display::SpinnerContainer;
use crate::io::report_client::HttpReportSource;
use crate::store::{FetchOrchestrator, KeyPolicy, ReportStore};

/// Everything a command needs for one run.
pub struct App {
    pub cli: Cli,
    pub spinner: SpinnerContainer,
    pub orchestrator: FetchOrchestrator<HttpReportSource>,
}

impl App {
    pub fn new(cli: Cli) -> Self {
        let source = HttpReportSource::new(&cli.api_url, cli.api_token.clone());

        let key_policy = match cli.normalize_keys {
            true => KeyPolicy::Sorted,
            false => KeyPolicy::Verbatim,
        };

        let orchestrator =
            FetchOrchestrator::new(source, ReportStore::new(), cli.provider).with_key_policy(key_policy);

        App {
            cli,
            spinner: SpinnerContainer::new(),
            orchestrator,
        }
    }
}
