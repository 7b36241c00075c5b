//! Source excerpts for diagnostics.
//!
//! A diagnostic is shown as the line it starts on, prefixed with its line
//! number, and a caret underline beneath the reported range:
//!
//! ```text
//! 2: let x: number = "two";
//!    ^^^^^^^^^^^^^^^^^^^^^^
//! error TS2322: Type 'string' is not assignable to type 'number'.
//! ```

use crate::diagnostic::Diagnostic;
use std::fmt::{self, Write};

/// Line separator assumed in source text and used in formatted messages.
pub const NEWLINE: &str = "\n";

/// A diagnostic rendered against a snapshot of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedError {
    /// 1-based line the diagnostic starts on.
    pub line_number: usize,
    /// `"{line_number}: {line}"`
    pub excerpt: String,
    /// Spaces up to the diagnostic column, then one caret per unit of length.
    pub underline: String,
    /// Compiler-style message, see [`format_message`].
    pub message: String,
}

impl FormattedError {
    /// Format `diagnostic` against `source`.
    ///
    /// `diagnostic.start` must lie within `source`; positions past the end
    /// are read as the end of the text.
    pub fn new(source: &str, diagnostic: &Diagnostic) -> Self {
        let Location {
            start,
            line_number,
            line_start,
        } = Location::of(source, diagnostic.start);
        let line_end = source[start..]
            .find(NEWLINE)
            .map_or(source.len(), |i| start + i);
        let line = &source[line_start..line_end];
        let column = utf16_len(&source[line_start..start]);

        let label = line_number.to_string();
        let excerpt = format!("{label}: {line}");
        let underline = format!(
            "{}  {}{}",
            " ".repeat(label.len()),
            " ".repeat(column),
            "^".repeat(diagnostic.length)
        );

        Self {
            line_number,
            excerpt,
            underline,
            message: format_message(source, diagnostic),
        }
    }
}

impl fmt::Display for FormattedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}\n{}", self.excerpt, self.underline, self.message)
    }
}

/// Format a diagnostic the way the compiler prints a single diagnostic:
/// `"{file}({line},{col}): {category} TS{code}: {message}"`, where the file
/// prefix only appears when the diagnostic names its file.
pub fn format_message(source: &str, diagnostic: &Diagnostic) -> String {
    let mut out = String::new();
    if let Some(file_name) = &diagnostic.file_name {
        let location = Location::of(source, diagnostic.start);
        let column = utf16_len(&source[location.line_start..location.start]) + 1;
        let _ = write!(out, "{file_name}({},{column}): ", location.line_number);
    }
    let _ = write!(
        out,
        "{} TS{}: {}",
        diagnostic.category.label(),
        diagnostic.code,
        diagnostic.message_text.flatten(NEWLINE)
    );
    out
}

/// Where a diagnostic starts, in byte terms.
struct Location {
    start: usize,
    line_number: usize,
    line_start: usize,
}

impl Location {
    fn of(source: &str, utf16_offset: usize) -> Self {
        let start = byte_offset(source, utf16_offset);
        let before = &source[..start];
        Self {
            start,
            line_number: before.matches(NEWLINE).count() + 1,
            line_start: before.rfind(NEWLINE).map_or(0, |i| i + NEWLINE.len()),
        }
    }
}

/// Byte index of the character at `utf16_offset` code units into `text`.
fn byte_offset(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (index, ch) in text.char_indices() {
        if units >= utf16_offset {
            return index;
        }
        units += ch.len_utf16();
    }
    text.len()
}

fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{DiagnosticCategory, MessageChain, MessageText};
    use expect_test::expect;
    use indoc::indoc;

    const SOURCE: &str = indoc! {r#"
        const a = 1;
        let x: number = "two";
        a = 2;"#};

    #[test]
    fn test_second_line_excerpt() {
        let start = SOURCE.find("x:").unwrap();
        let diagnostic = Diagnostic::error(
            start,
            1,
            2322,
            "Type 'string' is not assignable to type 'number'.",
        );

        let formatted = FormattedError::new(SOURCE, &diagnostic);
        assert_eq!(formatted.line_number, 2);
        expect![[r#"
            2: let x: number = "two";
                   ^
            error TS2322: Type 'string' is not assignable to type 'number'."#]]
        .assert_eq(&formatted.to_string());
    }

    #[test]
    fn test_last_line_without_trailing_newline() {
        let start = SOURCE.rfind('a').unwrap();
        let diagnostic = Diagnostic::error(
            start,
            1,
            2588,
            "Cannot assign to 'a' because it is a constant.",
        );

        let formatted = FormattedError::new(SOURCE, &diagnostic);
        assert_eq!(formatted.line_number, 3);
        assert_eq!(formatted.excerpt, "3: a = 2;");
        assert_eq!(formatted.underline, "   ^");
    }

    #[test]
    fn test_first_line_at_offset_zero() {
        let diagnostic = Diagnostic::error(0, 5, 1000, "first");
        let formatted = FormattedError::new(SOURCE, &diagnostic);
        assert_eq!(formatted.line_number, 1);
        assert_eq!(formatted.excerpt, "1: const a = 1;");
        assert_eq!(formatted.underline, "   ^^^^^");
    }

    #[test]
    fn test_zero_length_has_no_carets() {
        let diagnostic = Diagnostic::error(4, 0, 1005, "';' expected.");
        let formatted = FormattedError::new(SOURCE, &diagnostic);
        assert_eq!(formatted.underline, "       ");
        assert!(!formatted.underline.contains('^'));
    }

    #[test]
    fn test_padding_grows_with_line_number_width() {
        let source = "x\n".repeat(11) + "let y = z;";
        let start = source.find('z').unwrap();
        let diagnostic = Diagnostic::error(start, 1, 2304, "Cannot find name 'z'.");

        let formatted = FormattedError::new(&source, &diagnostic);
        assert_eq!(formatted.line_number, 12);
        // two digits, ": ", then eight columns into the line
        assert_eq!(formatted.underline, format!("{}^", " ".repeat(2 + 2 + 8)));
    }

    #[test]
    fn test_offsets_count_utf16_units() {
        // '😀' is two UTF-16 code units, so `y` sits at offset 14, not 13.
        let source = "let s = '😀'; y;";
        let diagnostic = Diagnostic::error(14, 1, 2304, "Cannot find name 'y'.");

        let formatted = FormattedError::new(source, &diagnostic);
        assert_eq!(formatted.excerpt, "1: let s = '😀'; y;");
        assert_eq!(formatted.underline, format!("{}^", " ".repeat(3 + 14)));
    }

    #[test]
    fn test_message_with_file_prefix_and_chain() {
        let diagnostic = Diagnostic {
            start: SOURCE.find("x:").unwrap(),
            length: 1,
            message_text: MessageText::Chain(MessageChain {
                message_text: "Type 'string' is not assignable to type 'number'.".to_string(),
                next: vec![MessageChain {
                    message_text: "See declaration.".to_string(),
                    next: vec![],
                }],
            }),
            category: DiagnosticCategory::Warning,
            code: 2322,
            file_name: Some("input.tsx".to_string()),
        };

        expect![[r#"
            input.tsx(2,5): warning TS2322: Type 'string' is not assignable to type 'number'.
              See declaration."#]]
        .assert_eq(&format_message(SOURCE, &diagnostic));
    }
}
