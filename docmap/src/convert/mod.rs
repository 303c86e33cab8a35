//! Type conversion support: simple types, converter registrations and the
//! custom conversion registry.

mod custom_conversions;
mod registration;
mod simple_types;

pub use custom_conversions::*;
pub use registration::*;
pub use simple_types::*;
