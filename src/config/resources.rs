use crate::cli::{Provider, ReportType};
use crate::error::Error;

/// Where a report lives on the API, relative to the base url.
pub struct ResourcePath {
    pub provider: Provider,
    pub report_type: ReportType,
    pub path: &'static str,
}

pub static REPORT_PATHS: &[ResourcePath] = &[
    ResourcePath {
        provider: Provider::Aws,
        report_type: ReportType::Cost,
        path: "reports/costs/aws/",
    },
    ResourcePath {
        provider: Provider::Aws,
        report_type: ReportType::Storage,
        path: "reports/inventory/aws/storage/",
    },
    ResourcePath {
        provider: Provider::Aws,
        report_type: ReportType::InstanceType,
        path: "reports/inventory/aws/instance-type/",
    },
    ResourcePath {
        provider: Provider::Aws,
        report_type: ReportType::Tag,
        path: "tags/aws/",
    },
    ResourcePath {
        provider: Provider::Ocp,
        report_type: ReportType::Cost,
        path: "reports/charges/ocp/",
    },
    ResourcePath {
        provider: Provider::Ocp,
        report_type: ReportType::Cpu,
        path: "reports/inventory/ocp/cpu/",
    },
    ResourcePath {
        provider: Provider::Ocp,
        report_type: ReportType::Memory,
        path: "reports/inventory/ocp/memory/",
    },
    ResourcePath {
        provider: Provider::Ocp,
        report_type: ReportType::Tag,
        path: "tags/ocp/",
    },
    ResourcePath {
        provider: Provider::OcpOnAws,
        report_type: ReportType::Cost,
        path: "reports/openshift/infrastructures/aws/costs/",
    },
    ResourcePath {
        provider: Provider::OcpOnAws,
        report_type: ReportType::Storage,
        path: "reports/openshift/infrastructures/aws/storage/",
    },
    ResourcePath {
        provider: Provider::OcpOnAws,
        report_type: ReportType::InstanceType,
        path: "reports/openshift/infrastructures/aws/instance-types/",
    },
    ResourcePath {
        provider: Provider::OcpOnAws,
        report_type: ReportType::Tag,
        path: "tags/openshift/infrastructures/aws/",
    },
];

/// Cost sources, listed and deleted here.
pub const SOURCES_PATH: &str = "providers/";

/// Looks up the resource path for a report.
/// A missing pair means the report doesn't exist for that provider.
pub fn resource_path(provider: Provider, report_type: ReportType) -> Result<&'static str, Error> {
    REPORT_PATHS
        .iter()
        .find(|entry| entry.provider == provider && entry.report_type == report_type)
        .map(|entry| entry.path)
        .ok_or(Error::ReportPathNotFound {
            provider,
            report_type,
        })
}

/// Plain group-by dimensions, in the order an id key is looked for.
pub fn group_by_dimensions(provider: Provider) -> &'static [&'static str] {
    match provider {
        Provider::Aws => &["account", "service", "region"],
        Provider::Ocp | Provider::OcpOnAws => &["cluster", "node", "project"],
    }
}
