//! Destinations for diagnostic lines

use std::fmt;

/// Append-only receiver of diagnostic text lines
pub trait DiagnosticSink {
    fn append_line(&mut self, line: &str);
}

impl DiagnosticSink for String {
    fn append_line(&mut self, line: &str) {
        self.push_str(line);
        self.push('\n');
    }
}

impl DiagnosticSink for Vec<String> {
    fn append_line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Ordered collection of diagnostic lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticBuffer {
    lines: Vec<String>,
}

impl DiagnosticBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

impl DiagnosticSink for DiagnosticBuffer {
    fn append_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

impl fmt::Display for DiagnosticBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
