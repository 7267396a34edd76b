//! Cache-aware definition fetching.
//!
//! A [`FetchPipeline`] owns one [`FetchCache`] and one provider for the
//! duration of a run. Each distinct term reaches the provider at most once:
//! the first fetch inserts into the cache and every later fetch of the same
//! term is served from it.

use termdeck_shared::{Result, TermDeckError};
use termdeck_storage::FetchCache;
use tracing::{debug, info, warn};

use crate::provider::DefinitionProvider;

/// Result of a single [`FetchPipeline::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub definition: String,
    /// `true` when the definition came from the cache.
    pub hit: bool,
}

/// Counters reported when a pipeline closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub hits: usize,
    pub misses: usize,
    pub cached_entries: usize,
}

/// Scoped owner of the cache and provider for one run.
///
/// Release (cache flush + provider close) happens exactly once: either
/// through [`close`](Self::close), or on drop if the pipeline was never
/// closed.
pub struct FetchPipeline<P: DefinitionProvider> {
    cache: FetchCache,
    provider: P,
    hits: usize,
    misses: usize,
    closed: bool,
}

impl<P: DefinitionProvider> FetchPipeline<P> {
    pub fn new(cache: FetchCache, provider: P) -> Self {
        debug!(
            provider = provider.name(),
            cached = cache.len(),
            "fetch pipeline opened"
        );
        Self {
            cache,
            provider,
            hits: 0,
            misses: 0,
            closed: false,
        }
    }

    /// Return the definition for `term`, calling the provider only on a miss.
    ///
    /// A provider failure leaves the cache untouched.
    pub async fn fetch(&mut self, term: &str) -> Result<Fetched> {
        let term = term.trim();
        if term.is_empty() {
            return Err(TermDeckError::validation("cannot fetch a blank term"));
        }

        if let Some(definition) = self.cache.lookup(term) {
            self.hits += 1;
            debug!(term, "cache hit");
            return Ok(Fetched {
                definition: definition.to_string(),
                hit: true,
            });
        }

        debug!(term, provider = self.provider.name(), "cache miss");
        let definition = self.provider.provide(term).await?;
        self.cache.insert(term, definition.clone());
        self.misses += 1;

        Ok(Fetched {
            definition,
            hit: false,
        })
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            hits: self.hits,
            misses: self.misses,
            cached_entries: self.cache.len(),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Flush the cache and close the provider.
    ///
    /// The provider is closed even when the flush fails.
    pub fn close(mut self) -> Result<PipelineStats> {
        let stats = self.stats();
        self.release()?;
        info!(
            hits = stats.hits,
            misses = stats.misses,
            cached = stats.cached_entries,
            "fetch pipeline closed"
        );
        Ok(stats)
    }

    fn release(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let flushed = self.cache.flush();
        self.provider.close();
        flushed
    }
}

impl<P: DefinitionProvider> Drop for FetchPipeline<P> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        debug!("fetch pipeline dropped without close, releasing");
        if let Err(e) = self.release() {
            warn!(error = %e, "failed to flush definition cache");
        }
    }
}

impl<P: DefinitionProvider> std::fmt::Debug for FetchPipeline<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchPipeline")
            .field("provider", &self.provider.name())
            .field("cache", &self.cache.path())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .field("closed", &self.closed)
            .finish()
    }
}
