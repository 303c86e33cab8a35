//! # docmap - Object-Document Mapping Primitives
//!
//! `docmap` holds the pieces an object-document mapper needs between
//! application entities and a document database that speaks the
//! `$`-operator aggregation dialect.
//!
//! ## Key Features
//!
//! - **Geo-near stages**: build `$geoNear` aggregation stages from typed
//!   near-queries, with field names translated by a mapping context
//! - **Converter registrations**: decide whether a custom converter applies
//!   when reading, writing or both
//! - **Entity callbacks**: ordered before/after convert and save hooks, in
//!   blocking and reactive flavours
//! - **Auditing**: stamp created/modified metadata before conversion
//! - **Runtime hints**: a manifest of callback types per available driver
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docmap::aggregation::{AggregationOperation, GeoNearOperation, NoOpAggregationContext};
//! use docmap::geo::{Distance, Metric, NearQuery, Point};
//!
//! let query = NearQuery::near(Point::new(-73.99, 40.73))
//!     .with_max_distance(Distance::new(10.0, Metric::Kilometers)?)
//!     .with_limit(20)?;
//! let stage = GeoNearOperation::new(query, "distance")?
//!     .to_document(&NoOpAggregationContext)?;
//! ```
//!
//! ## Module Organization
//!
//! - [`document`] - Ordered wire documents and values
//! - [`geo`] - Points, metrics, distances and near-queries
//! - [`aggregation`] - Aggregation operations, contexts and pipelines
//! - [`convert`] - Simple types, converter registrations, custom conversions
//! - [`mapping`] - Entity callbacks and auditing
//! - [`hints`] - Runtime-hint manifest
//! - [`config`] - Shared configuration
//! - [`errors`] - Error types and result definitions

pub mod aggregation;
pub mod config;
pub mod convert;
pub mod document;
pub mod errors;
pub mod geo;
pub mod hints;
pub mod mapping;

#[cfg(test)]
mod tests {
    // Setup only one time throughout the project.
    // It will take effect during test, project wide
    #[ctor::ctor]
    fn init() {
        colog::init();
    }
}
