//! Congress.gov API access
//!
//! Transport, XML fallback decoding, pagination aggregation, and the typed
//! listing calls built on top of them.

pub mod aggregator;
pub mod client;
pub mod endpoints;
pub mod transport;
pub mod xml;

pub use aggregator::{aggregatable_keys, fetch_all, fetch_one, validate_lists, PaginationState};
pub use client::CongressClient;
pub use transport::{HttpTransport, QueryParams, Transport};
