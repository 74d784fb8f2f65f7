//! Shared Foundation for OpenShadow
//!
//! Status-style error taxonomy, well-known label keys, resource descriptors,
//! label/field selectors and the schema-less object model used by every layer
//! of the shadow storage stack.

#![warn(missing_docs)]

pub mod error;
pub mod labels;
pub mod options;
pub mod resource;
pub mod selector;
pub mod unstructured;
pub mod validation;

pub use error::{ApiError, ApiResult, StatusCause};
pub use options::{CreateOptions, DeleteOptions, ListOptions, UpdateOptions};
pub use resource::ResourceDescriptor;
pub use selector::{FieldRequirement, FieldSelector, Operator, Requirement, Selector};
pub use unstructured::{Unstructured, UnstructuredList};
