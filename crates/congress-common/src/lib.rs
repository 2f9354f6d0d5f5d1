//! Congress Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, validation errors, and logging setup for the congress
//! ingestion workspace.
//!
//! # Overview
//!
//! - **Error Handling**: validation error type and result alias
//! - **Types**: identifiers, chambers and congress numbers shared by every
//!   API resource
//! - **Logging**: `tracing` subscriber configuration
//!
//! # Example
//!
//! ```
//! use congress_common::types::{Chamber, CongressNumber};
//!
//! let chamber: Chamber = "senate".parse().unwrap();
//! let congress = CongressNumber::new(118).unwrap();
//! assert_eq!(format!("{}/{}", congress, chamber), "118/senate");
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{CommonError, Result};
pub use types::{Chamber, CongressNumber, Identifier};
