//! Test doubles for the panel's two collaborators: the host's analysis
//! worker and the related-post search.

use overflow_panel::{AnalysisWorker, Diagnostic, PostSearch, RelatedPost, SearchError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Shorthand for an error diagnostic.
pub fn diagnostic(start: usize, length: usize, message: &str) -> Diagnostic {
    Diagnostic::error(start, length, 2304, message)
}

/// Analysis worker with canned diagnostics.
#[derive(Debug, Default)]
pub struct FakeWorker {
    semantic: Vec<Diagnostic>,
    syntactic: Vec<Diagnostic>,
    failure: Option<String>,
    gate: Option<Arc<Notify>>,
    requests: AtomicUsize,
}

impl FakeWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn semantic(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.semantic = diagnostics;
        self
    }

    pub fn syntactic(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.syntactic = diagnostics;
        self
    }

    /// Make every request fail with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Hold semantic requests until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Number of diagnostic requests received, semantic and syntactic.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn answer(&self, diagnostics: &[Diagnostic]) -> anyhow::Result<Vec<Diagnostic>> {
        match &self.failure {
            Some(message) => Err(anyhow::anyhow!("{message}")),
            None => Ok(diagnostics.to_vec()),
        }
    }
}

impl AnalysisWorker for FakeWorker {
    async fn semantic_diagnostics(&self, _uri: &str) -> anyhow::Result<Vec<Diagnostic>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.answer(&self.semantic)
    }

    async fn syntactic_diagnostics(&self, _uri: &str) -> anyhow::Result<Vec<Diagnostic>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.answer(&self.syntactic)
    }
}

/// Search backend answering from a keyword table.
#[derive(Debug, Default)]
pub struct FakeSearch {
    posts: HashMap<String, Vec<RelatedPost>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `keyword` with `posts`.
    pub fn with_posts(mut self, keyword: &str, posts: Vec<RelatedPost>) -> Self {
        self.posts.insert(keyword.to_string(), posts);
        self
    }

    /// Fail searches for `keyword`.
    pub fn failing(mut self, keyword: &str) -> Self {
        self.failing.insert(keyword.to_string());
        self
    }

    /// Keywords searched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl PostSearch for FakeSearch {
    async fn search(&self, keyword: &str) -> Result<Vec<RelatedPost>, SearchError> {
        self.calls.lock().unwrap().push(keyword.to_string());
        if self.failing.contains(keyword) {
            return Err(SearchError::Api {
                error_id: 502,
                error_name: "throttle_violation".to_string(),
                message: format!("simulated failure for {keyword:?}"),
            });
        }
        Ok(self.posts.get(keyword).cloned().unwrap_or_default())
    }
}
