//! CI annotation workflow commands (`::error file=...::message`).
//!
//! Messages are percent-escaped so a multi-line message survives a
//! line-oriented transport.

use std::fmt;

/// Annotation severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationLevel {
    Error,
    Warning,
    Notice,
}

impl AnnotationLevel {
    pub fn command(&self) -> &'static str {
        match self {
            AnnotationLevel::Error => "error",
            AnnotationLevel::Warning => "warning",
            AnnotationLevel::Notice => "notice",
        }
    }
}

/// A single annotation, attributed to an optional file location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub level: AnnotationLevel,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub col: Option<u32>,
    pub message: String,
}

impl Annotation {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: AnnotationLevel::Error,
            file: None,
            line: None,
            col: None,
            message: message.into(),
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_col(mut self, col: u32) -> Self {
        self.col = Some(col);
        self
    }

    /// Render as one line, without the trailing newline.
    pub fn render(&self) -> String {
        let mut properties = Vec::new();
        if let Some(file) = &self.file {
            properties.push(format!("file={}", escape_property(file)));
        }
        if let Some(line) = self.line {
            properties.push(format!("line={line}"));
        }
        if let Some(col) = self.col {
            properties.push(format!("col={col}"));
        }

        let command = self.level.command();
        let message = escape_data(&self.message);
        if properties.is_empty() {
            format!("::{command}::{message}")
        } else {
            format!("::{command} {}::{message}", properties.join(","))
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Escape a message: `%`, `\r` and `\n`, in that order.
pub fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a property value; also escapes the `:` and `,` delimiters.
pub fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

/// Inverse of [`escape_data`] and [`escape_property`].
///
/// Decodes left to right so `%250A` yields `%0A`, not a newline.
pub fn unescape_data(data: &str) -> String {
    let mut out = String::with_capacity(data.len());
    let mut rest = data;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = match tail.get(..3) {
            Some("%25") => Some('%'),
            Some("%0D") => Some('\r'),
            Some("%0A") => Some('\n'),
            Some("%3A") => Some(':'),
            Some("%2C") => Some(','),
            _ => None,
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[3..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_data_only_touches_three_characters() {
        assert_eq!(escape_data("100%\r\ndone"), "100%25%0D%0Adone");
        assert_eq!(escape_data("a:b,c=d"), "a:b,c=d");
    }

    #[test]
    fn test_escape_percent_first() {
        // A literal "%0A" must not turn into a newline on decode.
        let escaped = escape_data("%0A\n");
        assert_eq!(escaped, "%250A%0A");
        assert_eq!(unescape_data(&escaped), "%0A\n");
    }

    #[test]
    fn test_unescape_round_trip() {
        let message = "case07.err:\n    line 1\r\n    100% wrong\n";
        assert_eq!(unescape_data(&escape_data(message)), message);
    }

    #[test]
    fn test_unescape_leaves_unknown_sequences() {
        assert_eq!(unescape_data("50%ok%"), "50%ok%");
    }

    #[test]
    fn test_render_file_only() {
        let annotation = Annotation::error("Score isn't an integer!\nGot: 33.3")
            .with_file("problems/sumas/tests/solutions/wa.cpp");
        assert_eq!(
            annotation.render(),
            "::error file=problems/sumas/tests/solutions/wa.cpp::Score isn't an integer!%0AGot: 33.3"
        );
    }

    #[test]
    fn test_render_all_properties() {
        let annotation = Annotation::error("boom")
            .with_file("a.cpp")
            .with_line(3)
            .with_col(7);
        assert_eq!(annotation.render(), "::error file=a.cpp,line=3,col=7::boom");
    }

    #[test]
    fn test_render_without_properties() {
        assert_eq!(Annotation::error("boom").to_string(), "::error::boom");
    }

    #[test]
    fn test_property_delimiters_escaped() {
        let annotation = Annotation::error("x").with_file("dir,a:b.in");
        assert_eq!(annotation.render(), "::error file=dir%2Ca%3Ab.in::x");
    }
}
