//! The editor side of the plugin contract.
//!
//! The host tells the panel when the document changed and hands over a
//! worker that can be asked for the document's diagnostics.

use crate::diagnostic::Diagnostic;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::future::Future;
use std::path::Path;

/// A debounced "model changed" notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChange {
    /// Identifier of the document, passed back to the worker.
    pub uri: String,
    /// Source text at the time of the change.
    pub text: String,
}

impl ModelChange {
    pub fn new(uri: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            text: text.into(),
        }
    }
}

/// The host's language analysis worker.
pub trait AnalysisWorker {
    fn semantic_diagnostics(
        &self,
        uri: &str,
    ) -> impl Future<Output = Result<Vec<Diagnostic>>> + Send;

    fn syntactic_diagnostics(
        &self,
        uri: &str,
    ) -> impl Future<Output = Result<Vec<Diagnostic>>> + Send;
}

/// Diagnostics recorded ahead of time, for hosts without a live worker.
///
/// ```json
/// { "semantic": [ ... ], "syntactic": [ ... ] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordedDiagnostics {
    #[serde(default)]
    pub semantic: Vec<Diagnostic>,
    #[serde(default)]
    pub syntactic: Vec<Diagnostic>,
}

impl RecordedDiagnostics {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read diagnostics from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse diagnostics from {}", path.display()))
    }
}

impl AnalysisWorker for RecordedDiagnostics {
    async fn semantic_diagnostics(&self, _uri: &str) -> Result<Vec<Diagnostic>> {
        Ok(self.semantic.clone())
    }

    async fn syntactic_diagnostics(&self, _uri: &str) -> Result<Vec<Diagnostic>> {
        Ok(self.syntactic.clone())
    }
}
