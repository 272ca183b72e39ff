//! Page templates with `{{name}}` placeholders.

use crate::error::{Error, RenderError, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_]+)\s*\}\}").unwrap());

/// Placeholders a page fills in.
pub const PLACEHOLDERS: &[&str] = &[
    "title",
    "description",
    "keywords",
    "css",
    "math_head",
    "toc",
    "body",
    "bibliography",
    "lastmod",
    "page",
];

/// An HTML page template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Read a template file. A template without a `{{body}}` placeholder
    /// would drop every page's content, so it is rejected.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let template = Self::new(source);
        if !template.has_placeholder("body") {
            return Err(RenderError::Template(format!(
                "{} has no {{{{body}}}} placeholder",
                path.display()
            ))
            .into());
        }
        tracing::debug!(path = %path.display(), "loaded page template");
        Ok(template)
    }

    pub fn has_placeholder(&self, name: &str) -> bool {
        PLACEHOLDER.captures_iter(&self.source).any(|c| &c[1] == name)
    }

    /// Substitute the given values; placeholders without a value stay as
    /// they are.
    pub fn fill(&self, values: &HashMap<&str, String>) -> String {
        PLACEHOLDER
            .replace_all(&self.source, |caps: &Captures<'_>| match values.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{{title}}</title>
<meta name="description" content="{{description}}">
<meta name="keywords" content="{{keywords}}">
{{math_head}}
<style>
body { max-width: 50em; margin: 0 auto; padding: 1em; font-family: Georgia, serif; line-height: 1.5; }
.toc ul { list-style: none; padding-left: 0; }
.env { margin: 1em 0; padding: 0.5em 1em; border-left: 3px solid #8aa; }
.citation .missing, .citation.missing { color: #b00; }
.unparsed { color: #b00; }
.latextable td { border: 1px solid #999; min-width: 1.5em; text-align: center; }
.latextable td.none { border: none; }
.topic-card-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(12em, 1fr)); gap: 1em; }
.polynomial-table { border-collapse: collapse; }
.polynomial-table th, .polynomial-table td { padding: 0.2em 0.6em; border-bottom: 1px solid #ddd; }
</style>
{{css}}
</head>
<body>
<nav class="toc">{{toc}}</nav>
<main>
{{body}}
{{bibliography}}
</main>
<footer>Last modified {{lastmod}} &middot; <a href="{{page}}">{{page}}</a></footer>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fill_leaves_unknown_placeholders() {
        let template = Template::new("<h1>{{ title }}</h1>{{body}}{{sidebar}}");
        let values = HashMap::from([("title", "Schur".to_string()), ("body", "<p>x</p>".to_string())]);
        assert_eq!(template.fill(&values), "<h1>Schur</h1><p>x</p>{{sidebar}}");
    }

    #[test]
    fn test_default_has_every_placeholder() {
        let template = Template::default();
        for name in PLACEHOLDERS {
            assert!(template.has_placeholder(name), "missing {}", name);
        }
    }

    #[test]
    fn test_load_requires_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<title>{{title}}</title>").unwrap();
        assert!(matches!(Template::load(&path), Err(Error::Render(RenderError::Template(_)))));

        std::fs::write(&path, "{{title}} {{body}}").unwrap();
        assert!(Template::load(&path).unwrap().has_placeholder("title"));
    }
}
