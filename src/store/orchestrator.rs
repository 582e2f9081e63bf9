use tracing::{debug, info};

use crate::cli::{Provider, ReportType};
use crate::config::resources::resource_path;
use crate::error::Error;
use crate::io::report_client::Report;
use crate::prelude::AppResult;
use crate::query::Query;

use super::cache_key::{CacheKey, KeyPolicy};
use super::report_store::{ErrorDetail, FetchStatus, ReportEntry, ReportStore, RequestToken};

/// One GET against the API, relative to its base url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub path: &'static str,
    pub query_string: String,
}

impl ReportRequest {
    /// `path?query`, or just the path for an empty query.
    pub fn relative_url(&self) -> String {
        match self.query_string.is_empty() {
            true => self.path.to_owned(),
            false => format!("{}?{}", self.path, self.query_string),
        }
    }
}

/// Anything that can answer a report request. The http client in production,
/// a canned one in tests.
pub trait ReportSource {
    fn fetch(&self, request: &ReportRequest) -> Result<Report, ErrorDetail>;
}

impl<S: ReportSource + ?Sized> ReportSource for &S {
    fn fetch(&self, request: &ReportRequest) -> Result<Report, ErrorDetail> {
        (**self).fetch(request)
    }
}

/// A fetch that has begun and not settled yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub key: CacheKey,
    pub token: RequestToken,
    pub request: ReportRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A request went out and its report is in the store.
    Fetched,
    /// A request went out and failed, the error is in the store.
    Failed,
    /// A newer request for the same key settled first, this response was dropped.
    Superseded,
    /// Already complete, nothing sent.
    Cached,
    /// Already in flight, nothing sent.
    Pending,
    /// The last fetch failed, nothing sent until forced.
    Errored,
}

/// Decides when a report needs fetching and keeps the store in step with the answers.
pub struct FetchOrchestrator<S> {
    source: S,
    store: ReportStore,
    provider: Provider,
    key_policy: KeyPolicy,
}

impl<S: ReportSource> FetchOrchestrator<S> {
    pub fn new(source: S, store: ReportStore, provider: Provider) -> Self {
        FetchOrchestrator {
            source,
            store,
            provider,
            key_policy: KeyPolicy::default(),
        }
    }

    pub fn with_key_policy(mut self, key_policy: KeyPolicy) -> Self {
        self.key_policy = key_policy;
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The usable report for `(report_type, query)`, fetching it first when the key
    /// was never asked. A failed entry is read as it is: its stale report if it has
    /// one, its error otherwise.
    pub fn fetch_report(
        &mut self,
        report_type: ReportType,
        query: &Query,
        force: bool,
    ) -> AppResult<&Report> {
        self.ensure_fetched(report_type, query, force)?;

        let key = self.key_for(report_type, query);

        match self.store.get(&key) {
            Some(entry) => Ok(entry.usable_report(&key)?),
            None => Err(Error::ReportNotFetched(key.to_string()).into()),
        }
    }

    pub fn key_for(&self, report_type: ReportType, query: &Query) -> CacheKey {
        CacheKey::new(report_type, &self.key_policy.query_string(query))
    }

    pub fn entry(&self, report_type: ReportType, query: &Query) -> Option<&ReportEntry> {
        self.store.get(&self.key_for(report_type, query))
    }

    /// Makes sure the report for `(report_type, query)` is in the store or on its way.
    ///
    /// Fetches when the key was never asked or when `force` is set. Complete,
    /// in-flight and failed entries are left alone otherwise.
    /// Errors only for a report type the provider doesn't have, fetch failures
    /// end up in the store.
    pub fn ensure_fetched(
        &mut self,
        report_type: ReportType,
        query: &Query,
        force: bool,
    ) -> AppResult<FetchOutcome> {
        match self.dispatch(report_type, query, force)? {
            Some(pending) => Ok(self.run(pending)),
            None => Ok(match self.store.status(&self.key_for(report_type, query)) {
                FetchStatus::InFlight => FetchOutcome::Pending,
                FetchStatus::Error => FetchOutcome::Errored,
                FetchStatus::NotAsked | FetchStatus::Complete => FetchOutcome::Cached,
            }),
        }
    }

    /// The first half of a fetch: begins the key and returns what to send.
    /// `None` when nothing needs sending.
    pub fn dispatch(
        &mut self,
        report_type: ReportType,
        query: &Query,
        force: bool,
    ) -> AppResult<Option<PendingFetch>> {
        let path = resource_path(self.provider, report_type)?;
        let query_string = self.key_policy.query_string(query);
        let key = CacheKey::new(report_type, &query_string);

        // Failed entries stay failed until the caller forces a refresh. Retrying on
        // every read would hammer a broken endpoint and throw away the stale report
        // the consumer is still showing.
        match (self.store.status(&key), force) {
            (FetchStatus::NotAsked, _) | (_, true) => {}
            (status, false) => {
                debug!(%key, ?status, "already in the store");
                return Ok(None);
            }
        }

        let token = self.store.begin(key.clone());
        let request = ReportRequest { path, query_string };

        info!(url = %request.relative_url(), "fetching report");

        Ok(Some(PendingFetch {
            key,
            token,
            request,
        }))
    }

    /// Sends a dispatched request and settles it.
    pub fn run(&mut self, pending: PendingFetch) -> FetchOutcome {
        let result = self.source.fetch(&pending.request);
        let failed = result.is_err();

        match (self.settle(pending, result), failed) {
            (false, _) => FetchOutcome::Superseded,
            (true, false) => FetchOutcome::Fetched,
            (true, true) => FetchOutcome::Failed,
        }
    }

    /// The second half of a fetch. Returns false when a newer fetch for the key
    /// began in the meantime, in which case the store is untouched.
    pub fn settle(&mut self, pending: PendingFetch, result: Result<Report, ErrorDetail>) -> bool {
        let PendingFetch { key, token, .. } = pending;

        match result {
            Ok(report) => self.store.succeed(&key, token, report),
            Err(error) => self.store.fail(&key, token, error),
        }
    }
}
