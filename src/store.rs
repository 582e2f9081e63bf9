pub mod cache_key;
pub mod orchestrator;
pub mod report_store;
pub mod subscription;

pub use cache_key::{CacheKey, KeyPolicy};
pub use orchestrator::{FetchOrchestrator, FetchOutcome, PendingFetch, ReportRequest, ReportSource};
pub use report_store::{ErrorDetail, FetchStatus, ReportEntry, ReportStore, RequestToken};
pub use subscription::Subscription;
