//! # overflow-panel
//!
//! An editor side panel that looks up Stack Overflow posts for the compiler
//! diagnostics in the current document.
//!
//! On every (debounced) edit the [`PanelController`] asks the host's
//! [`AnalysisWorker`] for diagnostics, formats each one against the source
//! with [`FormattedError`], searches related posts through a [`PostSearch`]
//! implementation such as [`StackExchangeClient`], and replaces the panel
//! contents with the results. Any failure replaces them with an alert view
//! instead.
//!
//! ```no_run
//! use overflow_panel::{ModelChange, PanelConfig, PanelController, RecordedDiagnostics, StackExchangeClient};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = PanelConfig::default();
//! let search = StackExchangeClient::new(config.search.clone())?;
//! let controller = PanelController::new(config, search);
//! controller.did_mount();
//!
//! let worker = RecordedDiagnostics::default();
//! controller
//!     .model_changed(&ModelChange::new("file:///input.tsx", "let x = 1;"), &worker)
//!     .await;
//! println!("{}", controller.panel().unwrap());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod diagnostic;
pub mod format;
pub mod host;
pub mod panel;
pub mod search;

pub use config::{PanelConfig, SearchConfig};
pub use controller::{CycleOutcome, PanelController};
pub use diagnostic::{Diagnostic, DiagnosticCategory, MessageChain, MessageText};
pub use format::{FormattedError, format_message};
pub use host::{AnalysisWorker, ModelChange, RecordedDiagnostics};
pub use panel::{Panel, PanelView, ResultBlock};
pub use search::{PostSearch, RelatedPost, SearchError, StackExchangeClient};
