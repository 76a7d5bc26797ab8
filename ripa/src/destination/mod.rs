//! Document store abstraction.
//!
//! [`Destination`] is what the index lifecycle and the load orchestrator talk to.
//! [`memory::MemoryDestination`] keeps indexes in process and backs tests and dry runs.

mod base;
pub mod memory;

pub use base::Destination;
