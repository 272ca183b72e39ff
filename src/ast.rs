//! Abstract Syntax Tree definitions for catalog documents.
//!
//! The node kinds follow pandoc's JSON AST (`{"t": Kind, "c": contents}`), so a
//! `pandoc -t json` dump deserializes straight into [`Document`] and the per-file
//! artifacts written by the walker use the same shape.

use serde::{Deserialize, Serialize};

/// A complete parsed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document content as a sequence of blocks
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}

/// Identifier, classes and key-value pairs attached to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AttrRepr", into = "AttrRepr")]
pub struct Attr {
    pub id: String,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
}

type AttrRepr = (String, Vec<String>, Vec<(String, String)>);

impl From<AttrRepr> for Attr {
    fn from((id, classes, attributes): AttrRepr) -> Self {
        Self { id, classes, attributes }
    }
}

impl From<Attr> for AttrRepr {
    fn from(attr: Attr) -> Self {
        (attr.id, attr.classes, attr.attributes)
    }
}

impl Attr {
    /// Attributes carrying only an identifier.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Attributes carrying only classes.
    pub fn with_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Add a class, keeping insertion order and skipping duplicates.
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    /// Builder form of [`Attr::set`].
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a key-value pair, replacing an existing one.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Link or image destination: URL and title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Target {
    pub url: String,
    pub title: String,
}

impl Target {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

impl From<(String, String)> for Target {
    fn from((url, title): (String, String)) -> Self {
        Self { url, title }
    }
}

impl From<Target> for (String, String) {
    fn from(target: Target) -> Self {
        (target.url, target.title)
    }
}

/// Format tag of a raw passthrough node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Format(pub String);

impl Format {
    /// LaTeX the upstream parser did not model.
    pub const TEX: &'static str = "tex";
    /// A table shorthand left for the table layout stage.
    pub const LATEX_TABLE: &'static str = "latextable";

    pub fn tex() -> Self {
        Self(Self::TEX.to_string())
    }

    pub fn latex_table() -> Self {
        Self(Self::LATEX_TABLE.to_string())
    }

    /// pandoc tags raw LaTeX as `latex`, the preprocessor as `tex`.
    pub fn is_tex(&self) -> bool {
        self.0 == Self::TEX || self.0 == "latex"
    }

    pub fn is_table(&self) -> bool {
        self.0 == Self::LATEX_TABLE
    }
}

/// Block-level elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "c")]
pub enum Block {
    /// Inline content without paragraph semantics
    Plain(Vec<Inline>),

    /// A paragraph of inline content
    #[serde(rename = "Para")]
    Paragraph(Vec<Inline>),

    /// A heading with level, attributes and content
    Header(u8, Attr, Vec<Inline>),

    CodeBlock(Attr, String),

    /// Raw passthrough the parser did not understand
    RawBlock(Format, String),

    BlockQuote(Vec<Block>),

    BulletList(Vec<Vec<Block>>),

    OrderedList(ListAttributes, Vec<Vec<Block>>),

    HorizontalRule,

    /// Generic container
    Div(Attr, Vec<Block>),
}

/// Start number, numbering style and delimiter of an ordered list.
pub type ListAttributes = (i32, ListNumberStyle, ListNumberDelim);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum ListNumberStyle {
    #[default]
    DefaultStyle,
    Example,
    Decimal,
    LowerRoman,
    UpperRoman,
    LowerAlpha,
    UpperAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum ListNumberDelim {
    #[default]
    DefaultDelim,
    Period,
    OneParen,
    TwoParens,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum MathType {
    DisplayMath,
    InlineMath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum QuoteType {
    SingleQuote,
    DoubleQuote,
}

/// Inline-level elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "c")]
pub enum Inline {
    /// Plain text
    #[serde(rename = "Str")]
    Text(String),

    /// Emphasized text (italic)
    #[serde(rename = "Emph")]
    Emphasis(Vec<Inline>),

    /// Strong text (bold)
    Strong(Vec<Inline>),

    Underline(Vec<Inline>),

    Strikeout(Vec<Inline>),

    Superscript(Vec<Inline>),

    Subscript(Vec<Inline>),

    SmallCaps(Vec<Inline>),

    Quoted(QuoteType, Vec<Inline>),

    Code(Attr, String),

    Space,

    SoftBreak,

    LineBreak,

    Math(MathType, String),

    /// Raw passthrough the parser did not understand
    RawInline(Format, String),

    Link(Attr, Vec<Inline>, Target),

    Image(Attr, Vec<Inline>, Target),

    Note(Vec<Block>),

    Span(Attr, Vec<Inline>),

    /// Internal cross-reference to a label, resolved against the site-wide
    /// label index at render time
    CrossRef(Attr, Vec<Inline>, String),
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }

    pub fn span(attr: Attr, content: Vec<Inline>) -> Self {
        Inline::Span(attr, content)
    }
}

/// Split plain text into `Str`/`Space` runs the way a parser would.
pub fn text_inlines(text: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    for (i, word) in text.split_whitespace().enumerate() {
        if i > 0 {
            inlines.push(Inline::Space);
        }
        inlines.push(Inline::Text(word.to_string()));
    }
    inlines
}

/// Convert inline elements to plain text.
pub fn stringify(inlines: &[Inline]) -> String {
    let mut result = String::new();
    stringify_into(inlines, &mut result);
    result
}

fn stringify_into(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(t) | Inline::Code(_, t) | Inline::Math(_, t) => out.push_str(t),
            Inline::Emphasis(inner)
            | Inline::Strong(inner)
            | Inline::Underline(inner)
            | Inline::Strikeout(inner)
            | Inline::Superscript(inner)
            | Inline::Subscript(inner)
            | Inline::SmallCaps(inner)
            | Inline::Span(_, inner)
            | Inline::Link(_, inner, _)
            | Inline::Image(_, inner, _)
            | Inline::CrossRef(_, inner, _) => stringify_into(inner, out),
            Inline::Quoted(kind, inner) => {
                let (open, close) = match kind {
                    QuoteType::SingleQuote => ('\u{2018}', '\u{2019}'),
                    QuoteType::DoubleQuote => ('\u{201c}', '\u{201d}'),
                };
                out.push(open);
                stringify_into(inner, out);
                out.push(close);
            }
            Inline::Space | Inline::SoftBreak | Inline::LineBreak => out.push(' '),
            Inline::RawInline(..) | Inline::Note(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pandoc_shape() {
        let para = Block::Paragraph(vec![
            Inline::text("Hello"),
            Inline::Space,
            Inline::Math(MathType::InlineMath, "x".into()),
        ]);
        let json = serde_json::to_string(&para).unwrap();
        assert_eq!(
            json,
            r#"{"t":"Para","c":[{"t":"Str","c":"Hello"},{"t":"Space"},{"t":"Math","c":[{"t":"InlineMath"},"x"]}]}"#
        );
    }

    #[test]
    fn test_read_pandoc_header() {
        let json = r#"{"pandoc-api-version":[1,23],"meta":{},"blocks":[
            {"t":"Header","c":[2,["schurS",["family"],[["k","v"]]],[{"t":"Str","c":"Schur"}]]},
            {"t":"RawBlock","c":["latex","\\family[x]{X}"]}
        ]}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        match &doc.blocks[0] {
            Block::Header(level, attr, content) => {
                assert_eq!(*level, 2);
                assert_eq!(attr.id, "schurS");
                assert!(attr.has_class("family"));
                assert_eq!(attr.get("k"), Some("v"));
                assert_eq!(stringify(content), "Schur");
            }
            other => panic!("unexpected block {:?}", other),
        }
        match &doc.blocks[1] {
            Block::RawBlock(format, _) => assert!(format.is_tex()),
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[test]
    fn test_stringify() {
        let inlines = vec![
            Inline::Emphasis(text_inlines("Boolean product")),
            Inline::Space,
            Inline::Quoted(QuoteType::DoubleQuote, vec![Inline::text("polynomials")]),
        ];
        assert_eq!(stringify(&inlines), "Boolean product \u{201c}polynomials\u{201d}");
    }

    #[test]
    fn test_attr_set_replaces() {
        let mut attr = Attr::with_classes(["a"]).with("width", "auto");
        attr.set("width", "80%");
        attr.add_class("a");
        assert_eq!(attr.classes, vec!["a"]);
        assert_eq!(attr.get("width"), Some("80%"));
    }
}
