pub mod item_report;
pub mod projection;
