//! Core types, validation and analytics for the studio lead service.

pub mod analytics;
pub mod attribution;
pub mod error;
pub mod lead;
pub mod limits;
pub mod store;
pub mod tracking;

pub use analytics::*;
pub use attribution::*;
pub use error::{Error, FieldIssue, Result};
pub use lead::*;
pub use store::*;
pub use tracking::*;
