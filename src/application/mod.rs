//! Application layer: evaluation service and reports
//!
//! This layer orchestrates domain logic over a loaded site tree.

pub mod error;
pub mod report;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use report::{Report, ReportKind};
