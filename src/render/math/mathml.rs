//! Build-time MathML conversion (`mathml` feature).

use super::MathRenderer;
use crate::error::Result;
use crate::render::escape_html;

/// Renderer that converts LaTeX to MathML.
///
/// Without the `mathml` feature, or when conversion fails, the escaped LaTeX
/// is emitted in a `math-error` element instead.
#[derive(Debug, Clone, Default)]
pub struct MathMLRenderer;

impl MathMLRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "mathml")]
fn convert(latex: &str, display: bool) -> Option<String> {
    let style = if display {
        latex2mathml::DisplayStyle::Block
    } else {
        latex2mathml::DisplayStyle::Inline
    };
    match latex2mathml::latex_to_mathml(latex, style) {
        Ok(mathml) => Some(mathml),
        Err(e) => {
            tracing::warn!(latex = %latex, error = %e, "MathML conversion failed");
            None
        }
    }
}

#[cfg(not(feature = "mathml"))]
fn convert(_latex: &str, _display: bool) -> Option<String> {
    None
}

impl MathRenderer for MathMLRenderer {
    fn render_inline(&self, latex: &str) -> Result<String> {
        Ok(match convert(latex.trim(), false) {
            Some(mathml) => mathml,
            None => format!(
                r#"<span class="math inline math-error">{}</span>"#,
                escape_html(latex.trim())
            ),
        })
    }

    fn render_display(&self, latex: &str) -> Result<String> {
        Ok(match convert(latex.trim(), true) {
            Some(mathml) => format!(r#"<div class="math display">{}</div>"#, mathml),
            None => format!(
                r#"<div class="math display math-error">{}</div>"#,
                escape_html(latex.trim())
            ),
        })
    }

    fn head_content(&self) -> Option<String> {
        Some(MATHML_STYLES.to_string())
    }
}

const MATHML_STYLES: &str = r#"<style>
.math-error {
    color: #b00;
    font-family: monospace;
}
math {
    font-size: 1.1em;
}
</style>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mathml_inline() {
        let result = MathMLRenderer::new().render_inline("x^2").unwrap();
        assert!(!result.is_empty());
    }

    #[cfg(not(feature = "mathml"))]
    #[test]
    fn test_fallback_is_escaped() {
        let result = MathMLRenderer::new().render_display("a<b").unwrap();
        assert_eq!(result, r#"<div class="math display math-error">a&lt;b</div>"#);
    }
}
