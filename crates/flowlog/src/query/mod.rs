//! Query: translate a constrained search string into a record predicate.
//!
//! The grammar is a flat, comma-separated list of `column=value` terms
//! plus optional epoch bounds. Columns come from the catalog allow-list
//! and values are converted to the column type before they reach a
//! predicate, so nothing from the request is ever interpreted by the store.

pub mod builder;
pub mod error;
pub mod filter;

pub use builder::QueryFilterBuilder;
pub use error::{QueryError, QueryErrors};
pub use filter::{Predicate, QueryFilter};
