//! Document store destinations for the RIPA loader.
//!
//! The core crate ships an in-memory destination; this crate adds stores reached over the
//! network.

pub mod elasticsearch;
