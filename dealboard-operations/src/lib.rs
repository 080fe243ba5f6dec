//! # Dealboard Operations
//!
//! This crate provides the `Operation` trait for defining engine operations.
//! Operations are structs where the fields ARE the parameters - no duplication.
//!
//! ## Example
//!
//! ```ignore
//! use dealboard_operations::*;
//!
//! #[derive(Debug, Deserialize)]
//! pub struct AddValidation {
//!     /// The column the rule guards
//!     pub column_id: ColumnId,
//!     /// User-facing failure message
//!     pub message: String,
//! }
//!
//! operation!(AddValidation, verb = "add", noun = "validation",
//!     description = "Attach a validation rule to a column");
//!
//! #[async_trait]
//! impl Execute<FlowContext, FlowError> for AddValidation {
//!     async fn execute(&self, ctx: &FlowContext) -> Result<Value, FlowError> {
//!         // implementation returns a JSON payload
//!     }
//! }
//! ```

mod log;
mod operation;

pub use log::LogEntry;
pub use operation::{Execute, Operation};

// Re-export for use in implementations
pub use async_trait::async_trait;
pub use serde_json::Value;
