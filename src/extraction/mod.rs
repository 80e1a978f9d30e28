//! Extraction orchestration.
//!
//! - `models`: request/result types and the `Extractor` collaborator trait
//! - `orchestrator`: cache reuse vs. creation around each extraction call
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod models;
mod orchestrator;

pub use models::{
    CacheReport, Document, ExtractionCall, ExtractionOutput, ExtractionRequest,
    ExtractionResult, Extractor, TokenUsage,
};
pub use orchestrator::Orchestrator;
