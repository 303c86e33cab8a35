//! Geospatial value types used by near queries.

mod metric;
mod near_query;
mod point;

pub use metric::*;
pub use near_query::*;
pub use point::*;
