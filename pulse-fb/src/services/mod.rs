//! Service modules for the feedback pipeline

pub mod enrichment;
pub mod orchestrator;

pub use enrichment::{EnrichmentClient, EnrichmentError, GenerateOptions};
pub use orchestrator::{
    DerivationWarning, SubmissionError, SubmissionOrchestrator, SubmissionReceipt,
};
