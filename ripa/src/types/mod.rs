//! Core data types: raw records, cells and canonical documents.

mod cell;
mod document;
mod record;

pub use cell::Cell;
pub use document::{DocumentBuilder, DocumentId, StopDocument};
pub use record::RawRecord;
