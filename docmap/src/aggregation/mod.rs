//! Aggregation pipeline operations.
//!
//! Every operation is an immutable value that renders itself against an
//! [AggregationOperationContext]. The context owns field-name translation,
//! so operations stay independent of entity mapping.

mod context;
mod geo_near;
mod operation;
mod pipeline;
mod stages;

pub use context::*;
pub use geo_near::*;
pub use operation::*;
pub use pipeline::*;
pub use stages::*;
