pub mod codec;
pub mod model;
pub mod selection;

pub use model::{
    Filter, GroupBy, GroupBySelector, OrderBy, Params, Query, Resolution, SortDirection,
    TimeScopeUnits,
};
