//! Relation expansion (denormalization) for IceType schemas.
//!
//! Expanding `customer` on `Order { customer: -> Customer }` inlines every
//! plain field of `Customer` into the order as `customer_<field>`.

pub mod engine;
pub mod errors;

pub use engine::{expand_relations, expanded_name};
pub use errors::{ExpandError, ExpandErrorCode, Result};
