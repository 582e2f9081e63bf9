pub mod client;
pub mod dtos;

pub use client::HttpReportSource;
pub use dtos::{Report, ReportMeta, ReportTotal, ReportValue, Source, SourcesPage};
