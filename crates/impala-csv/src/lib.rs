//! CSV export of stored documents.
//!
//! An [`ExportSchema`] fixes the column list for one collection; [`to_csv`]
//! renders every document against it. Documents are read as-is: a field a
//! document lacks becomes an empty cell rather than an error.
//!
//! # Example
//!
//! ```rust,ignore
//! let text = impala_csv::to_csv(&impala_csv::CONTACTS, &docs)?;
//! ```

pub mod error;
pub mod schema;
pub mod serialize;

pub use error::{Error, Result};
pub use schema::{CONTACTS, Column, ExportSchema, SUBSCRIPTIONS};
pub use serialize::{cell, to_csv};
