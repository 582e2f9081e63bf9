pub mod dashboard;
pub mod resources;
