//! End-to-end `generate` pipeline: term list → definitions → card model → output file.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use termdeck_shared::{DeckConfig, OutputMode, Result};
use termdeck_storage::FetchCache;
use tracing::{info, instrument, warn};

use crate::deck::{build_card_model, load_terms};
use crate::fetch::FetchPipeline;
use crate::provider::DefinitionProvider;
use crate::writer::{DeckWriter, OutputWriter};

/// Resolved settings for one `generate` run.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Term list, one term per line.
    pub input: PathBuf,
    /// Destination file.
    pub output: PathBuf,
    /// Debug listing or importable package.
    pub mode: OutputMode,
    /// Persistent definition cache.
    pub cache_path: PathBuf,
    /// Deck and note type settings (package mode only).
    pub deck: DeckConfig,
}

/// Result of the `generate` pipeline.
#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub output: PathBuf,
    pub mode: OutputMode,
    /// Number of terms read (and cards written).
    pub term_count: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// Size of the written file.
    pub bytes: usize,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each term has a definition.
    fn term_fetched(&self, term: &str, current: usize, total: usize, hit: bool);
    /// Called when the pipeline completes.
    fn done(&self, result: &GenerateResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn term_fetched(&self, _term: &str, _current: usize, _total: usize, _hit: bool) {}
    fn done(&self, _result: &GenerateResult) {}
}

/// Run the full `generate` pipeline.
///
/// 1. Load terms
/// 2. Open the definition cache
/// 3. Fetch a definition per term (fail-fast)
/// 4. Close the fetch pipeline, flushing the cache
/// 5. Write the output selected by `config.mode`
///
/// The cache is flushed even when fetching fails, so definitions learned
/// before the failure are kept. A fetch failure writes no output.
#[instrument(skip_all, fields(input = %config.input.display(), mode = %config.mode))]
pub async fn generate<P: DefinitionProvider>(
    config: &GenerateConfig,
    provider: P,
    progress: &dyn ProgressReporter,
) -> Result<GenerateResult> {
    let start = Instant::now();

    // --- Phase 1: Input ---
    progress.phase("Reading terms");
    let terms = load_terms(&config.input)?;
    info!(terms = terms.len(), "starting generate pipeline");

    // --- Phase 2: Fetch ---
    progress.phase("Fetching definitions");
    let cache = FetchCache::open(&config.cache_path);
    let mut pipeline = FetchPipeline::new(cache, provider);
    let built = build_card_model(&terms, &mut pipeline, progress).await;

    let stats = pipeline.stats();
    if let Err(e) = pipeline.close() {
        warn!(error = %e, "failed to flush definition cache");
    }
    let model = built?;

    // --- Phase 3: Write ---
    progress.phase("Writing output");
    let writer = OutputWriter::for_mode(config.mode, &config.deck);
    let summary = writer.write(&model, &config.output).await?;

    let result = GenerateResult {
        output: summary.path,
        mode: config.mode,
        term_count: model.len(),
        cache_hits: stats.hits,
        cache_misses: stats.misses,
        bytes: summary.bytes,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        output = %result.output.display(),
        writer = writer.name(),
        terms = result.term_count,
        hits = result.cache_hits,
        misses = result.cache_misses,
        elapsed_ms = result.elapsed.as_millis(),
        "generate pipeline complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingProvider;
    use std::io::Read;
    use std::path::Path;
    use termdeck_shared::TermDeckError;

    fn config_in(dir: &Path, mode: OutputMode, output: &str) -> GenerateConfig {
        GenerateConfig {
            input: dir.join("terms.txt"),
            output: dir.join(output),
            mode,
            cache_path: dir.join("definition_cache.json"),
            deck: DeckConfig::default(),
        }
    }

    fn archive_entries(path: &Path) -> Vec<String> {
        let file = std::fs::File::open(path).unwrap();
        let archive = zip::ZipArchive::new(file).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn package_run_writes_archive_and_cache() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("terms.txt"), "MVP\nchurn\n\nMVP\n").unwrap();
        let config = config_in(dir.path(), OutputMode::Package, "terms.apkg");

        let provider = RecordingProvider::new();
        let calls = provider.calls();
        let result = generate(&config, provider, &SilentProgress).await.unwrap();

        assert_eq!(result.term_count, 3);
        assert_eq!((result.cache_hits, result.cache_misses), (1, 2));
        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(archive_entries(&config.output), vec!["collection.anki2", "media"]);

        let cache = FetchCache::load(&config.cache_path).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn second_run_is_all_hits() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("terms.txt"), "pivot\nrunway\n").unwrap();
        let config = config_in(dir.path(), OutputMode::Debug, "terms_debug.txt");

        generate(&config, RecordingProvider::new(), &SilentProgress)
            .await
            .unwrap();

        let provider = RecordingProvider::new();
        let calls = provider.calls();
        let result = generate(&config, provider, &SilentProgress).await.unwrap();

        assert_eq!((result.cache_hits, result.cache_misses), (2, 0));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn debug_run_lists_terms_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("terms.txt"), "b\na\n").unwrap();
        let config = config_in(dir.path(), OutputMode::Debug, "terms_debug.txt");

        let result = generate(&config, RecordingProvider::new(), &SilentProgress)
            .await
            .unwrap();

        let text = std::fs::read_to_string(&result.output).unwrap();
        assert_eq!(
            text,
            "Term: b\nDefinition: definition of b\n\nTerm: a\nDefinition: definition of a\n\n"
        );
    }

    #[tokio::test]
    async fn provider_failure_writes_nothing_but_keeps_learned_definitions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("terms.txt"), "a\nb\nc\nd\ne\n").unwrap();
        let config = config_in(dir.path(), OutputMode::Package, "terms.apkg");

        let provider = RecordingProvider::failing_on(["c"]);
        let closed = provider.closed_flag();
        let err = generate(&config, provider, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, TermDeckError::Provider { ref term, .. } if term == "c"));
        assert!(!config.output.exists());
        assert!(closed.load(std::sync::atomic::Ordering::SeqCst));

        let cache = FetchCache::load(&config.cache_path).unwrap();
        assert!(cache.lookup("a").is_some());
        assert!(cache.lookup("b").is_some());
        assert!(cache.lookup("c").is_none());
    }

    #[tokio::test]
    async fn empty_input_gives_empty_outputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("terms.txt"), "\n  \n").unwrap();

        let debug = config_in(dir.path(), OutputMode::Debug, "terms_debug.txt");
        let result = generate(&debug, RecordingProvider::new(), &SilentProgress)
            .await
            .unwrap();
        assert_eq!(result.term_count, 0);
        assert_eq!(std::fs::read_to_string(&debug.output).unwrap(), "");

        let package = config_in(dir.path(), OutputMode::Package, "terms.apkg");
        generate(&package, RecordingProvider::new(), &SilentProgress)
            .await
            .unwrap();

        let file = std::fs::File::open(&package.output).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut media = String::new();
        archive
            .by_name("media")
            .unwrap()
            .read_to_string(&mut media)
            .unwrap();
        assert_eq!(media, "{}");
        assert!(!debug.cache_path.exists());
    }

    #[tokio::test]
    async fn corrupt_cache_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("terms.txt"), "moat\n").unwrap();
        let config = config_in(dir.path(), OutputMode::Debug, "terms_debug.txt");
        std::fs::write(&config.cache_path, "{not json").unwrap();

        let result = generate(&config, RecordingProvider::new(), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(result.cache_misses, 1);
        let cache = FetchCache::load(&config.cache_path).unwrap();
        assert!(cache.lookup("moat").is_some());
    }

    #[tokio::test]
    async fn missing_input_fails_before_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), OutputMode::Package, "terms.apkg");

        let provider = RecordingProvider::new();
        let calls = provider.calls();
        let err = generate(&config, provider, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, TermDeckError::Io { .. }));
        assert!(calls.lock().unwrap().is_empty());
        assert!(!config.output.exists());
    }
}
