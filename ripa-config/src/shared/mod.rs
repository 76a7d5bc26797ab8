//! Shared configuration types for the loader.

mod base;
mod batch;
mod destination;
mod loader;
mod pipeline;

pub use base::ValidationError;
pub use batch::BatchConfig;
pub use destination::{DestinationConfig, DestinationConfigWithoutSecrets};
pub use loader::{LoaderConfig, LoaderConfigWithoutSecrets};
pub use pipeline::{PipelineConfig, RowErrorPolicy};
