//! Drives the panel through one edit cycle per "model changed" notification.
//!
//! Cycles can overlap: a fast second edit may arrive while the first edit's
//! searches are still in flight. Each cycle takes a new generation number and
//! cancels the cycle before it. A cycle only writes to the panel while its
//! generation is still the newest, so a slow old cycle can never overwrite the
//! results of a newer one.

use crate::config::PanelConfig;
use crate::format::FormattedError;
use crate::host::{AnalysisWorker, ModelChange};
use crate::panel::{FETCHING, PENDING, Panel, PanelView, ResultBlock};
use crate::search::PostSearch;
use anyhow::{Context, Result};
use futures::future::try_join_all;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

/// How a call to [`PanelController::model_changed`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The panel was not mounted yet; nothing happened.
    Unmounted,
    /// Empty document or no diagnostics.
    NoErrors,
    /// Results rendered for this many diagnostics.
    Rendered { blocks: usize },
    /// The failure view was rendered.
    Failed,
    /// A newer cycle started before this one could render.
    Superseded,
}

/// Owns the panel and reacts to edits.
pub struct PanelController<S> {
    config: PanelConfig,
    search: S,
    panel: Mutex<Option<Panel>>,
    generation: AtomicU64,
    in_flight: Mutex<CancellationToken>,
}

impl<S: PostSearch> PanelController<S> {
    pub fn new(config: PanelConfig, search: S) -> Self {
        Self {
            config,
            search,
            panel: Mutex::new(None),
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(CancellationToken::new()),
        }
    }

    /// Create the panel. Notifications before this are ignored.
    pub fn did_mount(&self) {
        let mut panel = self.panel.lock().unwrap_or_else(|e| e.into_inner());
        if panel.is_none() {
            *panel = Some(Panel::new(self.config.heading.clone()));
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.panel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn search(&self) -> &S {
        &self.search
    }

    /// A copy of the panel as currently shown.
    pub fn panel(&self) -> Option<Panel> {
        self.panel.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Run one edit cycle for `change`, asking `worker` for diagnostics.
    pub async fn model_changed<W: AnalysisWorker>(
        &self,
        change: &ModelChange,
        worker: &W,
    ) -> CycleOutcome {
        if !self.is_mounted() {
            tracing::trace!("Ignoring change to {} before mount", change.uri);
            return CycleOutcome::Unmounted;
        }

        let (generation, token) = self.begin_cycle();
        tracing::debug!("Cycle {} started for {}", generation, change.uri);

        if change.text.is_empty() {
            return self.finish(generation, PanelView::NoErrors, CycleOutcome::NoErrors);
        }

        if !self.show(generation, PanelView::pending(PENDING)) {
            return CycleOutcome::Superseded;
        }

        let result = tokio::select! {
            _ = token.cancelled() => return CycleOutcome::Superseded,
            result = self.collect_results(generation, change, worker) => result,
        };

        match result {
            Ok(blocks) if blocks.is_empty() => {
                self.finish(generation, PanelView::NoErrors, CycleOutcome::NoErrors)
            }
            Ok(blocks) => {
                let outcome = CycleOutcome::Rendered {
                    blocks: blocks.len(),
                };
                self.finish(generation, PanelView::Results(blocks), outcome)
            }
            Err(err) => {
                tracing::warn!("Cycle {} failed: {:#}", generation, err);
                let trace = format!("{err:?}");
                self.finish(generation, PanelView::Failed { trace }, CycleOutcome::Failed)
            }
        }
    }

    /// Fetch diagnostics, then format each one and search its posts.
    ///
    /// All or nothing: the first failing search fails the whole cycle.
    async fn collect_results<W: AnalysisWorker>(
        &self,
        generation: u64,
        change: &ModelChange,
        worker: &W,
    ) -> Result<Vec<ResultBlock>> {
        let (semantic, syntactic) = tokio::try_join!(
            async {
                worker
                    .semantic_diagnostics(&change.uri)
                    .await
                    .context("Failed to get semantic diagnostics")
            },
            async {
                worker
                    .syntactic_diagnostics(&change.uri)
                    .await
                    .context("Failed to get syntactic diagnostics")
            },
        )?;

        let mut diagnostics = semantic;
        diagnostics.extend(syntactic);
        if diagnostics.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            "Cycle {}: {} diagnostics, fetching posts",
            generation,
            diagnostics.len()
        );
        self.show(generation, PanelView::pending(FETCHING));

        let text = change.text.as_str();
        try_join_all(diagnostics.iter().map(|diagnostic| async move {
            let error = FormattedError::new(text, diagnostic);
            let keyword = diagnostic.keyword();
            let posts = self
                .search
                .search(keyword)
                .await
                .with_context(|| format!("Failed to fetch posts related to {keyword:?}"))?;
            Ok::<_, anyhow::Error>(ResultBlock { error, posts })
        }))
        .await
    }

    /// Take the next generation and cancel whatever cycle was running.
    fn begin_cycle(&self) -> (u64, CancellationToken) {
        let token = CancellationToken::new();
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        std::mem::replace(&mut *in_flight, token.clone()).cancel();
        (generation, token)
    }

    /// Replace the view if `generation` is still current.
    fn show(&self, generation: u64, view: PanelView) -> bool {
        let mut panel = self.panel.lock().unwrap_or_else(|e| e.into_inner());
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding view from stale cycle {}", generation);
            return false;
        }
        match panel.as_mut() {
            Some(panel) => {
                panel.view = view;
                true
            }
            None => false,
        }
    }

    fn finish(&self, generation: u64, view: PanelView, outcome: CycleOutcome) -> CycleOutcome {
        if self.show(generation, view) {
            outcome
        } else {
            CycleOutcome::Superseded
        }
    }
}
