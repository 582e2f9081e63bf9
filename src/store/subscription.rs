use crate::cli::ReportType;
use crate::prelude::AppResult;
use crate::query::Query;

use super::cache_key::CacheKey;
use super::orchestrator::{FetchOrchestrator, FetchOutcome, ReportSource};
use super::report_store::ReportEntry;

/// A consumer's standing interest in one report.
///
/// The consumer declares what it needs every time its inputs may have changed;
/// a fetch is only triggered on the first declaration and when the derived key
/// differs from the previous one.
#[derive(Debug, Default)]
pub struct Subscription {
    key: Option<CacheKey>,
}

impl Subscription {
    pub fn new() -> Self {
        Subscription::default()
    }

    /// Returns `None` when the declaration matches the previous one.
    pub fn declare<S: ReportSource>(
        &mut self,
        orchestrator: &mut FetchOrchestrator<S>,
        report_type: ReportType,
        query: &Query,
    ) -> AppResult<Option<FetchOutcome>> {
        let key = orchestrator.key_for(report_type, query);

        if self.key.as_ref() == Some(&key) {
            return Ok(None);
        }

        let outcome = orchestrator.ensure_fetched(report_type, query, false)?;
        self.key = Some(key);

        Ok(Some(outcome))
    }

    pub fn key(&self) -> Option<&CacheKey> {
        self.key.as_ref()
    }

    /// The entry behind the last declaration.
    pub fn entry<'a, S: ReportSource>(
        &self,
        orchestrator: &'a FetchOrchestrator<S>,
    ) -> Option<&'a ReportEntry> {
        orchestrator.store().get(self.key.as_ref()?)
    }
}
