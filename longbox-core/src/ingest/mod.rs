//! Entity Resolver (C3), normalisation (part of C4), and the Scan Pipeline
//! itself (C4).

pub mod normalize;
pub mod pipeline;
pub mod resolver;

pub use pipeline::{ScanPipeline, ScanSummary};
