// Library interface for newsbrief modules
// This allows tests and other binaries to import modules

pub mod aggregator;
pub mod categories;
pub mod enrichment;
pub mod ingestion;
pub mod llm;
pub mod markup;
pub mod pipeline;
pub mod server;
