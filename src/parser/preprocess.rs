//! Source preprocessing applied before parsing.

use once_cell::sync::Lazy;
use regex::Regex;

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)(^|[^\\])%.*$").unwrap());
static DOCUMENT_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\begin\{document\}(.*)\\end\{document\}").unwrap());
static FIGURE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(begin|end)\{figure\*?\}").unwrap());
static TABULAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(begin|end)\{tabular\}").unwrap());

/// Prepare LaTeX source for the parser.
///
/// Strips comments, keeps only the document body when a preamble is
/// present, and renames `figure` and `tabular` so the parser passes them
/// through untouched instead of floating or flattening them.
pub fn preprocess(source: &str) -> String {
    let body = DOCUMENT_BODY
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(source);

    let text = COMMENT.replace_all(body, "$1");
    let text = FIGURE.replace_all(&text, "\\$1{figurefreeze}");
    let text = TABULAR.replace_all(&text, "\\$1{rtabular}");
    text.into_owned()
}
