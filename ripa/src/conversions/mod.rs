//! Per-field normalizers applied by the row transformer.
//!
//! Every function here is pure: it reads text fragments and returns a typed value or a
//! [`crate::error::ErrorKind::ConversionError`].

pub mod address;
pub mod bool;
pub mod datetime;
pub mod gender;
pub mod numeric;
