use std::collections::HashMap;
use std::hash::BuildHasherDefault;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use twox_hash::XxHash64;

use crate::error::Error;
use crate::io::report_client::Report;

use super::cache_key::CacheKey;

/// Where a report is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    #[default]
    NotAsked,
    InFlight,
    Complete,
    Error,
}

/// Why a fetch failed, as far as the consumer needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct ErrorDetail {
    /// HTTP status, when the server answered.
    pub status: Option<u16>,
    pub message: String,
}

/// Identifies one `begin` for a key. Only the latest one may settle the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// Last good report. A failed refresh doesn't clear it.
    pub data: Option<Report>,
    pub status: FetchStatus,
    pub error: Option<ErrorDetail>,
    #[serde(skip)]
    token: RequestToken,
}

impl ReportEntry {
    /// The report to show, stale data included when a refresh failed.
    pub fn usable_report(&self, key: &CacheKey) -> Result<&Report, Error> {
        match (&self.data, &self.error) {
            (Some(report), Some(error)) => {
                warn!(%key, %error, "refresh failed, showing the last good report");
                Ok(report)
            }
            (Some(report), None) => Ok(report),
            (None, Some(error)) => Err(Error::ReportFetch {
                key: key.to_string(),
                status: error.status,
                message: error.message.clone(),
            }),
            (None, None) => Err(Error::ReportNotFetched(key.to_string())),
        }
    }
}

type KeyHasher = BuildHasherDefault<XxHash64>;

/// Reports by cache key, for one session.
///
/// Entries appear on the first `begin` and are never removed. Only `begin`,
/// `succeed` and `fail` change them.
#[derive(Debug, Default)]
pub struct ReportStore {
    entries: HashMap<CacheKey, ReportEntry, KeyHasher>,
}

impl ReportStore {
    pub fn new() -> Self {
        ReportStore::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&ReportEntry> {
        self.entries.get(key)
    }

    /// Absent keys read as `NotAsked`.
    pub fn status(&self, key: &CacheKey) -> FetchStatus {
        self.get(key).map(|entry| entry.status).unwrap_or_default()
    }

    /// Marks the key in flight and clears its error. Earlier tokens for the key go stale.
    pub fn begin(&mut self, key: CacheKey) -> RequestToken {
        let entry = self.entries.entry(key.clone()).or_insert_with(|| ReportEntry {
            data: None,
            status: FetchStatus::NotAsked,
            error: None,
            token: RequestToken(0),
        });

        entry.token = RequestToken(entry.token.0 + 1);
        entry.status = FetchStatus::InFlight;
        entry.error = None;

        debug!(%key, token = entry.token.0, "fetch started");

        entry.token
    }

    /// Stores the report. Returns false and changes nothing when the token is stale.
    pub fn succeed(&mut self, key: &CacheKey, token: RequestToken, data: Report) -> bool {
        let Some(entry) = self.current_entry(key, token) else {
            return false;
        };

        entry.data = Some(data);
        entry.status = FetchStatus::Complete;
        entry.error = None;

        debug!(%key, token = token.0, "fetch complete");

        true
    }

    /// Records the failure, keeping the previous report. Returns false when the token is stale.
    pub fn fail(&mut self, key: &CacheKey, token: RequestToken, error: ErrorDetail) -> bool {
        let Some(entry) = self.current_entry(key, token) else {
            return false;
        };

        debug!(%key, token = token.0, %error, "fetch failed");

        entry.status = FetchStatus::Error;
        entry.error = Some(error);

        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry a response may settle, or `None` when the response is stale.
    // A forced refresh can begin while the previous request is still out. If the old
    // answer arrived last and we took it, the store would show data for a request
    // nobody is waiting on anymore. So only the latest token gets to write, and
    // anything older is logged and thrown away.
    fn current_entry(&mut self, key: &CacheKey, token: RequestToken) -> Option<&mut ReportEntry> {
        match self.entries.get_mut(key) {
            Some(entry) if entry.token == token => Some(entry),
            Some(entry) => {
                warn!(%key, stale = token.0, current = entry.token.0, "dropping a superseded response");
                None
            }
            None => {
                warn!(%key, "dropping a response for a fetch that never began");
                None
            }
        }
    }
}
