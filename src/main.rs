//! overflow-panel
//!
//! Terminal host for the related-posts panel.
//!
//! ## Commands
//!
//! ### check
//! Runs one edit cycle over a source file with recorded diagnostics:
//! ```bash
//! overflow-panel check input.ts --diagnostics diagnostics.json
//! ```
//!
//! ### search
//! Looks up posts for a single message:
//! ```bash
//! overflow-panel search "Cannot find name 'foo'."
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use overflow_panel::{
    ModelChange, PanelConfig, PanelController, PostSearch, RecordedDiagnostics,
    StackExchangeClient,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "overflow-panel")]
#[command(about = "Stack Overflow posts related to compiler diagnostics")]
struct Cli {
    /// Panel configuration file (JSON). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable logging to stderr. Accepts a level (error, warn, info, debug, trace)
    /// or a RUST_LOG-style filter string (e.g., "overflow_panel=debug").
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the panel for a source file and its recorded diagnostics
    Check {
        /// Source file to check
        source: PathBuf,

        /// JSON file with `semantic` and `syntactic` diagnostic lists
        #[arg(long)]
        diagnostics: PathBuf,

        /// Print the panel as HTML instead of text
        #[arg(long)]
        html: bool,
    },

    /// Search related posts for one message
    Search {
        /// Message text to search for
        #[arg(required = true, num_args = 1..)]
        keyword: Vec<String>,
    },
}

impl Cli {
    fn setup_logging(&self) {
        if let Some(filter) = &self.log {
            use tracing_subscriber::EnvFilter;
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new(filter))
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.setup_logging();

    let config = PanelConfig::load_or_default(cli.config.as_deref())?;
    let search = StackExchangeClient::new(config.search.clone())
        .context("Failed to create search client")?;

    match cli.command {
        Command::Check {
            source,
            diagnostics,
            html,
        } => {
            let text = tokio::fs::read_to_string(&source)
                .await
                .with_context(|| format!("Failed to read source from {}", source.display()))?;
            let worker = RecordedDiagnostics::load(&diagnostics)?;

            let controller = PanelController::new(config, search);
            controller.did_mount();

            let change = ModelChange::new(source.display().to_string(), text);
            let outcome = controller.model_changed(&change, &worker).await;
            tracing::debug!("Cycle finished: {:?}", outcome);

            if let Some(panel) = controller.panel() {
                if html {
                    print!("{}", panel.to_html());
                } else {
                    print!("{panel}");
                }
            }
        }

        Command::Search { keyword } => {
            let keyword = keyword.join(" ");
            let posts = search.search(&keyword).await?;
            if posts.is_empty() {
                println!("No related posts for {keyword:?}");
            }
            for post in posts {
                println!("{} <{}>", post.title, post.link);
            }
        }
    }

    Ok(())
}
