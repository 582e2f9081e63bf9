use miette::IntoDiagnostic;
use tracing::debug;

use crate::config::resources::SOURCES_PATH;
use crate::prelude::AppResult;
use crate::query::{Query, codec};
use crate::store::{ErrorDetail, ReportRequest, ReportSource};

use super::dtos::{Report, SourcesPage};

/// Talks to the cost management API over http.
pub struct HttpReportSource {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpReportSource {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        HttpReportSource {
            agent: ureq::Agent::new_with_defaults(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            token,
        }
    }

    /// Lists sources, optionally only those whose name matches `search`.
    pub fn list_sources(&self, search: Option<&str>) -> AppResult<SourcesPage> {
        let mut query = Query::default();

        if let Some(name) = search {
            query.extras.insert("name", name.to_owned());
        }

        let relative = match codec::serialize(&query) {
            query_string if query_string.is_empty() => SOURCES_PATH.to_owned(),
            query_string => format!("{}?{}", SOURCES_PATH, query_string),
        };

        let request = self.authorize(self.agent.get(&self.url(&relative)));

        let body = request
            .call()
            .into_diagnostic()?
            .body_mut()
            .read_json::<SourcesPage>()
            .into_diagnostic()?;

        Ok(body)
    }

    pub fn delete_source(&self, uuid: &str) -> AppResult {
        let relative = format!("{}{}/", SOURCES_PATH, urlencoding::encode(uuid));

        self.authorize(self.agent.delete(&self.url(&relative)))
            .call()
            .into_diagnostic()?;

        Ok(())
    }

    /// Absolute url for a path relative to the base.
    /// Brackets are escaped here, the rest of the query string already is.
    fn url(&self, relative: &str) -> String {
        let escaped = relative.replace('[', "%5B").replace(']', "%5D");

        format!("{}/{}", self.base_url, escaped)
    }

    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        let request = request.header("Accept", "application/json");

        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }
}

impl ReportSource for HttpReportSource {
    fn fetch(&self, request: &ReportRequest) -> Result<Report, ErrorDetail> {
        let url = self.url(&request.relative_url());

        debug!(%url, "GET");

        let report = self
            .authorize(self.agent.get(&url))
            .call()?
            .body_mut()
            .read_json::<Report>()?;

        Ok(report)
    }
}

/// Maps the http error into what the store keeps.
impl From<ureq::Error> for ErrorDetail {
    fn from(error: ureq::Error) -> Self {
        let status = match &error {
            ureq::Error::StatusCode(code) => Some(*code),
            _ => None,
        };

        ErrorDetail {
            status,
            message: error.to_string(),
        }
    }
}
