//! Core pipeline and domain logic for termdeck.
//!
//! This crate ties together the definition providers, the cache-aware
//! [`FetchPipeline`](fetch::FetchPipeline), card model construction and the
//! output writers into the end-to-end [`generate`](pipeline::generate) run.

pub mod chat;
pub mod deck;
pub mod fetch;
pub mod pipeline;
pub mod provider;
pub mod writer;

#[cfg(test)]
mod testing;

pub use chat::ChatProvider;
pub use deck::{build_card_model, load_terms, parse_terms};
pub use fetch::{FetchPipeline, Fetched, PipelineStats};
pub use pipeline::{GenerateConfig, GenerateResult, ProgressReporter, SilentProgress, generate};
pub use provider::{ConfiguredProvider, DefinitionProvider, StubProvider};
pub use writer::{DebugWriter, DeckWriter, OutputWriter, WriteSummary, render_debug};
