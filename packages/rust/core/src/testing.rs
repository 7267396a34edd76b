//! Test doubles shared by the core test modules.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use termdeck_shared::{Result, TermDeckError};

use crate::provider::DefinitionProvider;

/// Provider that records every term it is asked for and fails on a fixed set.
#[derive(Debug, Default)]
pub(crate) struct RecordingProvider {
    calls: Arc<Mutex<Vec<String>>>,
    failing: HashSet<String>,
    closed: Arc<AtomicBool>,
}

impl RecordingProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_on<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failing: terms.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    pub(crate) fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    pub(crate) fn definition_for(term: &str) -> String {
        format!("definition of {term}")
    }
}

impl DefinitionProvider for RecordingProvider {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn provide(&self, term: &str) -> Result<String> {
        self.calls.lock().unwrap().push(term.to_string());
        if self.failing.contains(term) {
            return Err(TermDeckError::provider(term, "HTTP 500: upstream unavailable"));
        }
        Ok(Self::definition_for(term))
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
