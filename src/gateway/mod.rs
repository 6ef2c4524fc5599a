// src/gateway/mod.rs

//! The tool gateway: contracts, descriptors, the catalog, and the single
//! invocation path every call goes through.

pub mod catalog;
pub mod contract;
pub mod descriptor;
pub mod dispatch;
pub mod envelope;
pub mod error;

pub use catalog::Catalog;
pub use contract::{Field, InputContract, Refinement, Violation};
pub use descriptor::OperationDescriptor;
pub use dispatch::Gateway;
pub use envelope::{Envelope, Outcome, Status};
pub use error::{CatalogError, GatewayError};
