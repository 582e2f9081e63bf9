use crate::cli::{Provider, ReportType};
use crate::query::{Filter, GroupBy, GroupBySelector, Query, Resolution, TimeScopeUnits};

const TAB_LIMIT: u32 = 3;

/// A dashboard tab is a dimension the widget can break its report down by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardTab {
    Accounts,
    Services,
    Regions,
    InstanceType,
    Clusters,
    Nodes,
    Projects,
}

impl DashboardTab {
    /// The group-by key this tab stands for.
    pub fn dimension(&self) -> &'static str {
        match self {
            DashboardTab::Accounts => "account",
            DashboardTab::Services => "service",
            DashboardTab::Regions => "region",
            DashboardTab::InstanceType => "instance_type",
            DashboardTab::Clusters => "cluster",
            DashboardTab::Nodes => "node",
            DashboardTab::Projects => "project",
        }
    }
}

pub struct DashboardWidget {
    pub title: &'static str,
    pub report_type: ReportType,
    pub available_tabs: &'static [DashboardTab],
    pub current_tab: DashboardTab,
    /// Digits after the decimal point when printing values.
    pub fraction_digits: usize,
}

pub static AWS_WIDGETS: &[DashboardWidget] = &[
    DashboardWidget {
        title: "Cost",
        report_type: ReportType::Cost,
        available_tabs: &[
            DashboardTab::Services,
            DashboardTab::Accounts,
            DashboardTab::Regions,
        ],
        current_tab: DashboardTab::Services,
        fraction_digits: 2,
    },
    DashboardWidget {
        title: "Storage",
        report_type: ReportType::Storage,
        available_tabs: &[DashboardTab::Accounts, DashboardTab::Regions],
        current_tab: DashboardTab::Accounts,
        fraction_digits: 0,
    },
    DashboardWidget {
        title: "Compute",
        report_type: ReportType::InstanceType,
        available_tabs: &[
            DashboardTab::InstanceType,
            DashboardTab::Accounts,
            DashboardTab::Regions,
        ],
        current_tab: DashboardTab::InstanceType,
        fraction_digits: 0,
    },
];

pub static OCP_WIDGETS: &[DashboardWidget] = &[
    DashboardWidget {
        title: "Charges",
        report_type: ReportType::Cost,
        available_tabs: &[
            DashboardTab::Projects,
            DashboardTab::Clusters,
            DashboardTab::Nodes,
        ],
        current_tab: DashboardTab::Projects,
        fraction_digits: 2,
    },
    DashboardWidget {
        title: "CPU usage",
        report_type: ReportType::Cpu,
        available_tabs: &[
            DashboardTab::Projects,
            DashboardTab::Clusters,
            DashboardTab::Nodes,
        ],
        current_tab: DashboardTab::Projects,
        fraction_digits: 0,
    },
    DashboardWidget {
        title: "Memory usage",
        report_type: ReportType::Memory,
        available_tabs: &[
            DashboardTab::Projects,
            DashboardTab::Clusters,
            DashboardTab::Nodes,
        ],
        current_tab: DashboardTab::Projects,
        fraction_digits: 0,
    },
];

pub static OCP_ON_AWS_WIDGETS: &[DashboardWidget] = &[
    DashboardWidget {
        title: "Cost",
        report_type: ReportType::Cost,
        available_tabs: &[
            DashboardTab::Projects,
            DashboardTab::Clusters,
            DashboardTab::Nodes,
        ],
        current_tab: DashboardTab::Projects,
        fraction_digits: 2,
    },
    DashboardWidget {
        title: "Storage",
        report_type: ReportType::Storage,
        available_tabs: &[DashboardTab::Projects, DashboardTab::Clusters],
        current_tab: DashboardTab::Projects,
        fraction_digits: 0,
    },
    DashboardWidget {
        title: "Compute",
        report_type: ReportType::InstanceType,
        available_tabs: &[
            DashboardTab::InstanceType,
            DashboardTab::Projects,
            DashboardTab::Clusters,
        ],
        current_tab: DashboardTab::InstanceType,
        fraction_digits: 0,
    },
];

pub fn widgets_for(provider: Provider) -> &'static [DashboardWidget] {
    match provider {
        Provider::Aws => AWS_WIDGETS,
        Provider::Ocp => OCP_WIDGETS,
        Provider::OcpOnAws => OCP_ON_AWS_WIDGETS,
    }
}

/// This month, day by day.
pub fn default_filters() -> Filter {
    Filter {
        time_scope_units: Some(TimeScopeUnits::Month),
        time_scope_value: Some(-1),
        resolution: Some(Resolution::Daily),
        ..Filter::default()
    }
}

/// Tabs only show the top few.
pub fn tab_filters() -> Filter {
    Filter {
        limit: Some(TAB_LIMIT),
        ..default_filters()
    }
}

/// This month as a single bucket, what lists and details start from.
pub fn details_filter() -> Filter {
    Filter {
        resolution: Some(Resolution::Monthly),
        ..default_filters()
    }
}

pub fn group_by_for_tab(tab: DashboardTab) -> GroupBy {
    [(tab.dimension(), GroupBySelector::All)].into_iter().collect()
}

pub fn query_for_widget(filter: Filter) -> Query {
    Query {
        filter,
        ..Query::default()
    }
}

pub fn query_for_widget_tabs(widget: &DashboardWidget, filter: Filter) -> Query {
    Query {
        filter,
        group_by: group_by_for_tab(widget.current_tab),
        ..Query::default()
    }
}
