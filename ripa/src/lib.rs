//! Loads RIPA traffic stop records from CSV into a document index.
//!
//! Each source row becomes one canonical [`types::StopDocument`] through the pure
//! [`transform::RowTransformer`]. A [`pipeline::Pipeline`] run recreates the target index from
//! [`schema::STOP_SCHEMA`] and then streams the documents into it in parallel batches, keyed by
//! `stop_id` + `pid` so that repeated runs converge to the same index contents.

pub mod conversions;
pub mod destination;
pub mod error;
pub mod index;
pub mod load;
mod macros;
pub mod metrics;
pub mod pipeline;
pub mod producer;
pub mod schema;
pub mod source;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transform;
pub mod types;
