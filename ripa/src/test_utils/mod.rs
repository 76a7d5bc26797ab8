//! Helpers for tests of the loader and of destination implementations.
//!
//! - [`records`] builds source rows and CSV text with every required column.
//! - [`faulty_destination`] wraps a destination to reject chosen documents and observe writes.

pub mod faulty_destination;
pub mod records;
