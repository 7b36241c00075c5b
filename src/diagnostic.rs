//! Compiler diagnostics as reported by the host's analysis worker.
//!
//! The worker serializes diagnostics in the compiler's own JSON shape:
//!
//! ```json
//! { "start": 6, "length": 1, "code": 2322, "category": 1,
//!   "messageText": "Type 'string' is not assignable to type 'number'." }
//! ```
//!
//! `messageText` may also be a chain of nested messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity reported by the compiler.
///
/// The panel does not filter on it: warnings get related posts just like errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

impl DiagnosticCategory {
    /// Lowercase name, as printed in front of the diagnostic code.
    pub fn label(self) -> &'static str {
        match self {
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        }
    }
}

impl TryFrom<u8> for DiagnosticCategory {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        match value {
            0 => Ok(DiagnosticCategory::Warning),
            1 => Ok(DiagnosticCategory::Error),
            2 => Ok(DiagnosticCategory::Suggestion),
            3 => Ok(DiagnosticCategory::Message),
            other => Err(format!("unknown diagnostic category {other}")),
        }
    }
}

impl From<DiagnosticCategory> for u8 {
    fn from(category: DiagnosticCategory) -> u8 {
        match category {
            DiagnosticCategory::Warning => 0,
            DiagnosticCategory::Error => 1,
            DiagnosticCategory::Suggestion => 2,
            DiagnosticCategory::Message => 3,
        }
    }
}

/// One link of a nested diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageChain {
    pub message_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next: Vec<MessageChain>,
}

/// Diagnostic message: either plain text or a chain of elaborations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageText {
    Plain(String),
    Chain(MessageChain),
}

impl MessageText {
    /// The top-level message, without any nested elaboration.
    pub fn headline(&self) -> &str {
        match self {
            MessageText::Plain(text) => text,
            MessageText::Chain(chain) => &chain.message_text,
        }
    }

    /// Render the full message. Each nested link goes on its own line,
    /// indented two spaces per level of depth.
    pub fn flatten(&self, newline: &str) -> String {
        match self {
            MessageText::Plain(text) => text.clone(),
            MessageText::Chain(chain) => {
                let mut out = String::new();
                flatten_chain(chain, newline, 0, &mut out);
                out
            }
        }
    }
}

fn flatten_chain(chain: &MessageChain, newline: &str, depth: usize, out: &mut String) {
    if depth > 0 {
        out.push_str(newline);
        out.push_str(&"  ".repeat(depth));
    }
    out.push_str(&chain.message_text);
    for next in &chain.next {
        flatten_chain(next, newline, depth + 1, out);
    }
}

impl fmt::Display for MessageText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flatten("\n"))
    }
}

impl From<&str> for MessageText {
    fn from(text: &str) -> Self {
        MessageText::Plain(text.to_string())
    }
}

/// A compiler-reported issue over a range of the source text.
///
/// `start` and `length` count UTF-16 code units, the unit the analysis
/// worker reports positions in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub start: usize,
    pub length: usize,
    pub message_text: MessageText,
    pub category: DiagnosticCategory,
    #[serde(default)]
    pub code: u32,
    /// Set when the worker knows which file the diagnostic belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl Diagnostic {
    /// An error-category diagnostic with a plain message.
    pub fn error(start: usize, length: usize, code: u32, message: impl Into<String>) -> Self {
        Self {
            start,
            length,
            message_text: MessageText::Plain(message.into()),
            category: DiagnosticCategory::Error,
            code,
            file_name: None,
        }
    }

    /// The text used to look up related posts.
    pub fn keyword(&self) -> &str {
        self.message_text.headline()
    }
}
