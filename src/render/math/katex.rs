//! Client-side typesetting: the LaTeX is emitted escaped inside `\(..\)` and
//! `\[..\]` delimiters and a script in the page head does the rest.

use super::MathRenderer;
use crate::error::Result;
use crate::render::escape_html;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    KaTeX,
    MathJax,
}

/// Renderer that leaves math for a browser-side script.
#[derive(Debug, Clone)]
pub struct ScriptRenderer {
    script: Script,
}

impl ScriptRenderer {
    pub fn katex() -> Self {
        Self { script: Script::KaTeX }
    }

    pub fn mathjax() -> Self {
        Self { script: Script::MathJax }
    }
}

impl Default for ScriptRenderer {
    fn default() -> Self {
        Self::katex()
    }
}

impl MathRenderer for ScriptRenderer {
    fn render_inline(&self, latex: &str) -> Result<String> {
        Ok(format!(
            r#"<span class="math inline">\({}\)</span>"#,
            escape_html(latex.trim())
        ))
    }

    fn render_display(&self, latex: &str) -> Result<String> {
        Ok(format!(
            r#"<div class="math display">\[{}\]</div>"#,
            escape_html(latex.trim())
        ))
    }

    fn head_content(&self) -> Option<String> {
        Some(
            match self.script {
                Script::KaTeX => KATEX_HEAD,
                Script::MathJax => MATHJAX_HEAD,
            }
            .to_string(),
        )
    }
}

const KATEX_HEAD: &str = r#"<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.css" crossorigin="anonymous">
<script defer src="https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.js" crossorigin="anonymous"></script>
<script defer src="https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/contrib/auto-render.min.js" crossorigin="anonymous"
    onload="renderMathInElement(document.body, {
        delimiters: [
            {left: '\\[', right: '\\]', display: true},
            {left: '\\(', right: '\\)', display: false}
        ]
    });"></script>"#;

const MATHJAX_HEAD: &str = r#"<script>
MathJax = {
    tex: {
        inlineMath: [['\\(', '\\)']],
        displayMath: [['\\[', '\\]']]
    }
};
</script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>"#;
