//! What the panel shows.
//!
//! The panel always shows its heading and exactly one [`PanelView`]. A new
//! view replaces the previous one wholesale; nothing is patched in place.

use crate::format::FormattedError;
use crate::search::RelatedPost;
use std::fmt::{self, Write};

pub const NO_ERRORS: &str = "No errors!!";
pub const PENDING: &str = "Just minutes...";
pub const FETCHING: &str = "Fetching posts...";

/// Alert colors for the failure view.
pub const ALERT_BACKGROUND: &str = "oldlace";
pub const ALERT_FOREGROUND: &str = "crimson";

/// One diagnostic with the posts found for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultBlock {
    pub error: FormattedError,
    pub posts: Vec<RelatedPost>,
}

/// The mutually exclusive panel contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PanelView {
    /// Mounted, nothing rendered yet.
    #[default]
    Empty,
    NoErrors,
    /// Placeholder while diagnostics or posts are on their way.
    Pending { status: String },
    Results(Vec<ResultBlock>),
    /// Alert-styled failure with the full error trace.
    Failed { trace: String },
}

impl PanelView {
    pub fn pending(status: &str) -> Self {
        PanelView::Pending {
            status: status.to_string(),
        }
    }
}

/// A mounted panel: heading plus current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub heading: String,
    pub view: PanelView,
}

impl Panel {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            view: PanelView::Empty,
        }
    }

    /// Render the panel as an HTML fragment.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "<h4>{}</h4>", escape_html(&self.heading));
        out.push_str("<div>\n");
        match &self.view {
            PanelView::Empty => {}
            PanelView::NoErrors => {
                let _ = writeln!(out, "<pre>{}</pre>", escape_html(NO_ERRORS));
            }
            PanelView::Pending { status } => {
                let _ = writeln!(out, "<pre>{}</pre>", escape_html(status));
            }
            PanelView::Results(blocks) => {
                for block in blocks {
                    out.push_str("<div>\n");
                    let _ = writeln!(
                        out,
                        "<pre style=\"white-space: break-spaces\">{}</pre>",
                        escape_html(&block.error.to_string())
                    );
                    out.push_str("<ul>\n");
                    for post in &block.posts {
                        let _ = writeln!(
                            out,
                            "<li><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a></li>",
                            escape_html(&post.link),
                            escape_html(&post.title)
                        );
                    }
                    out.push_str("</ul>\n</div>\n");
                }
            }
            PanelView::Failed { trace } => {
                let _ = writeln!(
                    out,
                    "<pre style=\"background-color: {ALERT_BACKGROUND}; color: {ALERT_FOREGROUND}\">{}</pre>",
                    escape_html(trace)
                );
            }
        }
        out.push_str("</div>\n");
        out
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.heading)?;
        match &self.view {
            PanelView::Empty => Ok(()),
            PanelView::NoErrors => writeln!(f, "{NO_ERRORS}"),
            PanelView::Pending { status } => writeln!(f, "{status}"),
            PanelView::Results(blocks) => {
                for block in blocks {
                    writeln!(f)?;
                    writeln!(f, "{}", block.error)?;
                    for post in &block.posts {
                        writeln!(f, "  - {} <{}>", post.title, post.link)?;
                    }
                }
                Ok(())
            }
            PanelView::Failed { trace } => writeln!(f, "{trace}"),
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            ch => out.push(ch),
        }
    }
    out
}
