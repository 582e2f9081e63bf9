//! Shared helpers for integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use costlens::cli::Provider;
use costlens::io::report_client::Report;
use costlens::store::{ErrorDetail, FetchOrchestrator, ReportRequest, ReportSource, ReportStore};
use serde_json::Value;

/// A report source answering from a queue, recording what was asked.
/// Once the queue is empty it answers with an empty report.
#[derive(Default)]
pub struct MockSource {
    responses: RefCell<VecDeque<Result<Report, ErrorDetail>>>,
    requests: RefCell<Vec<ReportRequest>>,
}

impl MockSource {
    pub fn new() -> Self {
        MockSource::default()
    }

    pub fn respond(self, response: Result<Report, ErrorDetail>) -> Self {
        self.responses.borrow_mut().push_back(response);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(ReportRequest::relative_url)
            .collect()
    }
}

impl ReportSource for MockSource {
    fn fetch(&self, request: &ReportRequest) -> Result<Report, ErrorDetail> {
        self.requests.borrow_mut().push(request.clone());

        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(Report::default()))
    }
}

pub fn orchestrator(source: &MockSource, provider: Provider) -> FetchOrchestrator<&MockSource> {
    FetchOrchestrator::new(source, ReportStore::new(), provider)
}

pub fn report(value: Value) -> Report {
    serde_json::from_value(value).unwrap_or_else(|e| panic!("Bad report fixture: {}", e))
}

/// A report whose meta total is `total`.
pub fn report_with_total(total: f64) -> Report {
    report(serde_json::json!({
        "meta": { "total": { "value": total, "units": "USD" } },
        "data": []
    }))
}

pub fn server_error() -> ErrorDetail {
    ErrorDetail {
        status: Some(500),
        message: "http status: 500".to_owned(),
    }
}
