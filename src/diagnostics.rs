//! Content warnings and errors.
//!
//! Each stage owns a [`Diagnostics`] value: the walker one per file, the
//! merger one for the whole site, the renderer one per page. Every entry is
//! also emitted as a single `tracing` event, so concurrent stages interleave
//! whole lines only.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Degraded to a visible fallback, does not affect the exit status
    Warning,
    /// Content error, fails the overall build status
    Error,
}

/// One reported content problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Source stem of the page, or empty for site-wide problems
    pub page: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        if self.page.is_empty() {
            write!(f, "{}: {}", level, self.message)
        } else {
            write!(f, "{}: {}: {}", level, self.page, self.message)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, page: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(page, "{}", message);
        self.items.push(Diagnostic {
            severity: Severity::Warning,
            page: page.to_string(),
            message,
        });
    }

    pub fn error(&mut self, page: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(page, "{}", message);
        self.items.push(Diagnostic {
            severity: Severity::Error,
            page: page.to_string(),
            message,
        });
    }

    /// Merge another stage's diagnostics without logging them again.
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
