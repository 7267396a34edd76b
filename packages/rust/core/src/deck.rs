//! Term input and card model construction.

use std::path::Path;

use termdeck_shared::{CardEntry, CardModel, Result, Term, TermDeckError};
use tracing::{debug, info, instrument};

use crate::fetch::FetchPipeline;
use crate::pipeline::ProgressReporter;
use crate::provider::DefinitionProvider;

/// Read a UTF-8 term list, one term per line.
///
/// Lines are trimmed and blank lines dropped. Duplicates are kept in
/// input order.
pub fn load_terms(path: &Path) -> Result<Vec<Term>> {
    let content = std::fs::read_to_string(path).map_err(|e| TermDeckError::io(path, e))?;
    let terms = parse_terms(&content);
    debug!(?path, terms = terms.len(), "term list loaded");
    Ok(terms)
}

/// Split `content` into terms. Handles both `\n` and `\r\n` line endings.
pub fn parse_terms(content: &str) -> Vec<Term> {
    content.lines().filter_map(Term::parse).collect()
}

/// Fetch a definition for every term, in order, and collect the card model.
///
/// Fails fast: the first provider error aborts construction and no model
/// is returned.
#[instrument(skip_all, fields(terms = terms.len(), provider = pipeline.provider_name()))]
pub async fn build_card_model<P: DefinitionProvider>(
    terms: &[Term],
    pipeline: &mut FetchPipeline<P>,
    progress: &dyn ProgressReporter,
) -> Result<CardModel> {
    let total = terms.len();
    let mut entries = Vec::with_capacity(total);

    for (idx, term) in terms.iter().enumerate() {
        let fetched = pipeline.fetch(term.as_str()).await?;
        progress.term_fetched(term.as_str(), idx + 1, total, fetched.hit);
        entries.push(CardEntry::new(term.as_str(), fetched.definition));
    }

    info!(
        entries = entries.len(),
        hits = pipeline.hits(),
        misses = pipeline.misses(),
        "card model built"
    );

    Ok(CardModel::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SilentProgress;
    use crate::testing::RecordingProvider;
    use std::sync::Mutex;
    use termdeck_storage::FetchCache;

    /// Records every progress callback.
    #[derive(Default)]
    struct TraceProgress {
        events: Mutex<Vec<(String, usize, usize, bool)>>,
    }

    impl ProgressReporter for TraceProgress {
        fn phase(&self, _name: &str) {}
        fn term_fetched(&self, term: &str, current: usize, total: usize, hit: bool) {
            self.events
                .lock()
                .unwrap()
                .push((term.to_string(), current, total, hit));
        }
        fn done(&self, _result: &crate::pipeline::GenerateResult) {}
    }

    fn terms(raw: &[&str]) -> Vec<Term> {
        raw.iter().filter_map(|t| Term::parse(t)).collect()
    }

    #[test]
    fn parse_drops_blank_lines_and_trims() {
        let parsed = parse_terms("  MVP \n\n\t\nburn rate\r\nMVP\n");
        let names: Vec<&str> = parsed.iter().map(Term::as_str).collect();
        assert_eq!(names, vec!["MVP", "burn rate", "MVP"]);
    }

    #[test]
    fn parse_empty_input() {
        assert!(parse_terms("").is_empty());
        assert!(parse_terms("\n \n").is_empty());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_terms(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, TermDeckError::Io { .. }));
    }

    #[test]
    fn load_invalid_utf8_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.txt");
        std::fs::write(&path, [0x66, 0x6f, 0xff, 0x0a]).unwrap();
        let err = load_terms(&path).unwrap_err();
        match err {
            TermDeckError::Io { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::InvalidData);
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn load_reads_cyrillic_terms() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.txt");
        std::fs::write(&path, "Венчурный капитал\nСтартап\n").unwrap();
        let loaded = load_terms(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].as_str(), "Венчурный капитал");
    }

    #[tokio::test]
    async fn model_preserves_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FetchCache::open(&dir.path().join("cache.json"));
        let mut pipeline = FetchPipeline::new(cache, RecordingProvider::new());

        let input = terms(&["pivot", "churn", "runway"]);
        let model = build_card_model(&input, &mut pipeline, &SilentProgress)
            .await
            .unwrap();

        let fronts: Vec<&str> = model.entries().iter().map(|e| e.term.as_str()).collect();
        assert_eq!(fronts, vec!["pivot", "churn", "runway"]);
        assert_eq!(
            model.entries()[1].definition,
            RecordingProvider::definition_for("churn")
        );
    }

    #[tokio::test]
    async fn duplicates_become_separate_cards_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FetchCache::open(&dir.path().join("cache.json"));
        let provider = RecordingProvider::new();
        let calls = provider.calls();
        let mut pipeline = FetchPipeline::new(cache, provider);
        let progress = TraceProgress::default();

        let input = terms(&["MVP", "churn", "MVP"]);
        let model = build_card_model(&input, &mut pipeline, &progress)
            .await
            .unwrap();

        assert_eq!(model.len(), 3);
        assert_eq!(calls.lock().unwrap().len(), 2);
        let events = progress.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                ("MVP".to_string(), 1, 3, false),
                ("churn".to_string(), 2, 3, false),
                ("MVP".to_string(), 3, 3, true),
            ]
        );
    }

    #[tokio::test]
    async fn failure_aborts_and_stops_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FetchCache::open(&dir.path().join("cache.json"));
        let provider = RecordingProvider::failing_on(["c"]);
        let calls = provider.calls();
        let mut pipeline = FetchPipeline::new(cache, provider);

        let input = terms(&["a", "b", "c", "d", "e"]);
        let err = build_card_model(&input, &mut pipeline, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, TermDeckError::Provider { ref term, .. } if term == "c"));
        assert_eq!(*calls.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn empty_terms_build_empty_model() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FetchCache::open(&dir.path().join("cache.json"));
        let mut pipeline = FetchPipeline::new(cache, RecordingProvider::new());

        let model = build_card_model(&[], &mut pipeline, &SilentProgress)
            .await
            .unwrap();
        assert!(model.is_empty());
    }
}
