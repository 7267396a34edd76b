//! Definition providers: the capability the fetch pipeline calls on a cache miss.

use std::future::Future;

use termdeck_shared::{ProviderConfig, ProviderKind, Result};
use tracing::info;

use crate::chat::ChatProvider;

/// A source of definitions for terms.
///
/// Implementations know nothing about caching; the
/// [`FetchPipeline`](crate::fetch::FetchPipeline) decides when to call them.
pub trait DefinitionProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Produce a definition for `term`.
    fn provide(&self, term: &str) -> impl Future<Output = Result<String>> + Send;

    /// Release held resources. Called once when the owning pipeline closes.
    fn close(&mut self) {}
}

/// Offline provider returning a canned definition.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubProvider;

impl DefinitionProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn provide(&self, term: &str) -> Result<String> {
        Ok(format!("Dummy definition for term \"{term}\""))
    }
}

/// The provider chosen by configuration.
#[derive(Debug)]
pub enum ConfiguredProvider {
    Stub(StubProvider),
    External(ChatProvider),
}

impl ConfiguredProvider {
    /// Construct the provider selected by `kind`. The external provider
    /// needs its API key to be present in the environment.
    pub fn from_kind(kind: ProviderKind, config: &ProviderConfig) -> Result<Self> {
        let provider = match kind {
            ProviderKind::Stub => Self::Stub(StubProvider),
            ProviderKind::External => Self::External(ChatProvider::from_config(config)?),
        };
        info!(provider = provider.name(), "definition provider ready");
        Ok(provider)
    }
}

impl DefinitionProvider for ConfiguredProvider {
    fn name(&self) -> &'static str {
        match self {
            Self::Stub(p) => p.name(),
            Self::External(p) => p.name(),
        }
    }

    async fn provide(&self, term: &str) -> Result<String> {
        match self {
            Self::Stub(p) => p.provide(term).await,
            Self::External(p) => p.provide(term).await,
        }
    }

    fn close(&mut self) {
        match self {
            Self::Stub(p) => p.close(),
            Self::External(p) => p.close(),
        }
    }
}
