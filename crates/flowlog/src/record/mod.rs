//! Record: flow-log entry, its field catalog and value types.

pub mod catalog;
pub mod model;

pub use catalog::{Field, FieldCatalog, FieldKind};
pub use model::{FieldValue, FlowCandidate, FlowRecord};
