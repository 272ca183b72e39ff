//! Math rendering backends.

mod katex;
mod mathml;

pub use self::katex::ScriptRenderer;
pub use self::mathml::MathMLRenderer;

use crate::error::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Math rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathBackend {
    /// Raw LaTeX typeset client-side by KaTeX.
    #[default]
    KaTeX,
    /// Converted to MathML at build time.
    MathML,
    /// Raw LaTeX typeset client-side by MathJax.
    MathJax,
}

impl FromStr for MathBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "katex" => Ok(MathBackend::KaTeX),
            "mathml" => Ok(MathBackend::MathML),
            "mathjax" => Ok(MathBackend::MathJax),
            other => Err(ConfigError::Value {
                name: "math".to_string(),
                message: format!("unknown math backend {:?}", other),
            }
            .into()),
        }
    }
}

impl fmt::Display for MathBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MathBackend::KaTeX => "katex",
            MathBackend::MathML => "mathml",
            MathBackend::MathJax => "mathjax",
        })
    }
}

/// Trait for math renderers.
pub trait MathRenderer: Send + Sync {
    /// Render inline math.
    fn render_inline(&self, latex: &str) -> Result<String>;

    /// Render display math.
    fn render_display(&self, latex: &str) -> Result<String>;

    /// Markup the page head needs (scripts, styles).
    fn head_content(&self) -> Option<String>;
}

/// Create a math renderer for the given backend.
pub fn create_renderer(backend: MathBackend) -> Box<dyn MathRenderer> {
    match backend {
        MathBackend::KaTeX => Box::new(ScriptRenderer::katex()),
        MathBackend::MathJax => Box::new(ScriptRenderer::mathjax()),
        MathBackend::MathML => Box::new(MathMLRenderer::new()),
    }
}
