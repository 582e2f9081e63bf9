pub mod app;
pub mod calculation;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod io;
pub mod logging;
pub mod prelude;
pub mod query;
pub mod router;
pub mod store;
