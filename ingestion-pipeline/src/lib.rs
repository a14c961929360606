#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod chunking;
pub mod extraction;
pub mod pipeline;

pub use pipeline::{IngestReport, IngestionPipeline};
