//! The per-file tree walk: raw LaTeX nodes are matched against the macro
//! vocabulary and rewritten into typed nodes, while labels, citations,
//! links and structured records are collected into the page's metadata.

mod block;
mod inline;
pub mod patterns;

pub use patterns::{Invocation, Optional, Pattern};

use crate::ast::{Attr, Block, Document, Format, Inline};
use crate::bibliography::Bibliography;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::meta::{Artifact, DocumentMeta};
use crate::parser::TexReader;

/// Output of a finished walk.
#[derive(Debug, Clone)]
pub struct Walked {
    pub document: Document,
    pub meta: DocumentMeta,
    pub diagnostics: Diagnostics,
}

impl Walked {
    pub fn into_artifact(self) -> (Artifact, Diagnostics) {
        (
            Artifact {
                meta: self.meta,
                blocks: self.document.blocks,
            },
            self.diagnostics,
        )
    }
}

/// Walks one page. A walker is built fresh for every file and consumed by
/// [`Walker::walk`], so nothing accumulated here can leak into another page.
pub struct Walker<'a> {
    reader: &'a dyn TexReader,
    bibliography: &'a Bibliography,
    meta: DocumentMeta,
    diagnostics: Diagnostics,
}

impl<'a> Walker<'a> {
    pub fn new(
        source_stem: &str,
        reader: &'a dyn TexReader,
        bibliography: &'a Bibliography,
    ) -> Self {
        Self {
            reader,
            bibliography,
            meta: DocumentMeta::new(source_stem),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn walk(mut self, document: Document) -> Result<Walked> {
        let blocks = self.walk_blocks(document.blocks)?;
        tracing::debug!(
            page = %self.meta.source_stem,
            labels = self.meta.labels.len(),
            citations = self.meta.citations.len(),
            "walked page"
        );
        Ok(Walked {
            document: Document::new(blocks),
            meta: self.meta,
            diagnostics: self.diagnostics,
        })
    }

    fn page(&self) -> &str {
        &self.meta.source_stem
    }

    fn warn(&mut self, message: impl Into<String>) {
        let page = self.meta.source_stem.clone();
        self.diagnostics.warn(&page, message);
    }

    fn error(&mut self, message: impl Into<String>) {
        let page = self.meta.source_stem.clone();
        self.diagnostics.error(&page, message);
    }

    /// Parse a fragment with the page's reader and walk the result.
    pub(crate) fn reparse_blocks(&mut self, text: &str) -> Result<Vec<Block>> {
        let document = self.reader.read(text)?;
        self.walk_blocks(document.blocks)
    }

    /// Parse a fragment as inline content and walk the result.
    pub(crate) fn reparse_inlines(&mut self, text: &str) -> Result<Vec<Inline>> {
        let document = self.reader.read(text)?;
        let mut inlines = Vec::new();
        flatten_blocks(document.blocks, &mut inlines);
        self.walk_inlines(inlines)
    }

    /// Plain text of a fragment, without walking it.
    pub(crate) fn plain_text(&self, text: &str) -> Result<String> {
        let document = self.reader.read(text)?;
        let mut inlines = Vec::new();
        flatten_blocks(document.blocks, &mut inlines);
        Ok(crate::ast::stringify(&inlines).trim().to_string())
    }

    fn walk_blocks(&mut self, blocks: Vec<Block>) -> Result<Vec<Block>> {
        let mut out = Vec::with_capacity(blocks.len());
        for block in blocks {
            out.extend(self.walk_block(block)?);
        }
        Ok(out)
    }

    fn walk_block(&mut self, block: Block) -> Result<Vec<Block>> {
        let block = match block {
            Block::RawBlock(format, text) if format.is_tex() => return self.rewrite_block(&text),
            Block::Paragraph(inlines) => match lone_raw_inline(&inlines) {
                Some(text) => {
                    let text = text.to_string();
                    return self.rewrite_block(&text);
                }
                None => Block::Paragraph(self.walk_inlines(inlines)?),
            },
            Block::Plain(inlines) => Block::Plain(self.walk_inlines(inlines)?),
            Block::Header(level, attr, inlines) => {
                self.note_label(&attr);
                Block::Header(level, attr, self.walk_inlines(inlines)?)
            }
            Block::Div(attr, blocks) => {
                self.note_label(&attr);
                Block::Div(attr, self.walk_blocks(blocks)?)
            }
            Block::BlockQuote(blocks) => Block::BlockQuote(self.walk_blocks(blocks)?),
            Block::BulletList(items) => Block::BulletList(self.walk_items(items)?),
            Block::OrderedList(attrs, items) => Block::OrderedList(attrs, self.walk_items(items)?),
            other => other,
        };
        Ok(vec![block])
    }

    fn walk_items(&mut self, items: Vec<Vec<Block>>) -> Result<Vec<Vec<Block>>> {
        items.into_iter().map(|item| self.walk_blocks(item)).collect()
    }

    /// Block forms first; then inline forms, wrapped in a paragraph.
    fn rewrite_block(&mut self, text: &str) -> Result<Vec<Block>> {
        if let Some(blocks) = block::rewrite(self, text)? {
            self.observe_blocks(&blocks);
            return Ok(blocks);
        }
        if let Some(inlines) = inline::rewrite(self, text)? {
            self.observe_inlines(&inlines);
            if inlines.is_empty() {
                return Ok(Vec::new());
            }
            return Ok(vec![Block::Paragraph(inlines)]);
        }
        self.warn(format!("unrecognized block macro: {}", excerpt(text)));
        Ok(vec![Block::RawBlock(Format::tex(), text.to_string())])
    }

    fn walk_inlines(&mut self, inlines: Vec<Inline>) -> Result<Vec<Inline>> {
        let mut out = Vec::with_capacity(inlines.len());
        for inline in inlines {
            out.extend(self.walk_inline(inline)?);
        }
        Ok(out)
    }

    fn walk_inline(&mut self, inline: Inline) -> Result<Vec<Inline>> {
        let inline = match inline {
            Inline::RawInline(format, text) if format.is_tex() => {
                if let Some(inlines) = inline::rewrite(self, &text)? {
                    self.observe_inlines(&inlines);
                    return Ok(inlines);
                }
                self.warn(format!("unrecognized inline macro: {}", excerpt(&text)));
                Inline::RawInline(format, text)
            }
            Inline::Link(attr, content, target) => {
                let content = self.walk_inlines(content)?;
                self.note_link(&target.url, &content);
                match target.url.strip_prefix('#') {
                    Some(label) if !label.is_empty() && attr.get("data-cite").is_none() => {
                        let mut attr = attr;
                        if !target.title.is_empty() {
                            attr.set("title", target.title.clone());
                        }
                        Inline::CrossRef(attr, content, label.to_string())
                    }
                    _ => Inline::Link(attr, content, target),
                }
            }
            Inline::Span(attr, content) => {
                self.note_label(&attr);
                Inline::Span(attr, self.walk_inlines(content)?)
            }
            Inline::Emphasis(c) => Inline::Emphasis(self.walk_inlines(c)?),
            Inline::Strong(c) => Inline::Strong(self.walk_inlines(c)?),
            Inline::Underline(c) => Inline::Underline(self.walk_inlines(c)?),
            Inline::Strikeout(c) => Inline::Strikeout(self.walk_inlines(c)?),
            Inline::Superscript(c) => Inline::Superscript(self.walk_inlines(c)?),
            Inline::Subscript(c) => Inline::Subscript(self.walk_inlines(c)?),
            Inline::SmallCaps(c) => Inline::SmallCaps(self.walk_inlines(c)?),
            Inline::Quoted(kind, c) => Inline::Quoted(kind, self.walk_inlines(c)?),
            Inline::Image(attr, c, target) => Inline::Image(attr, self.walk_inlines(c)?, target),
            Inline::CrossRef(attr, c, label) => Inline::CrossRef(attr, self.walk_inlines(c)?, label),
            Inline::Note(blocks) => Inline::Note(self.walk_blocks(blocks)?),
            other => other,
        };
        Ok(vec![inline])
    }

    fn note_label(&mut self, attr: &Attr) {
        if !attr.id.is_empty() {
            self.meta.labels.insert(attr.id.clone());
        }
    }

    fn note_link(&mut self, url: &str, content: &[Inline]) {
        let text = crate::ast::stringify(content);
        self.meta.urls.insert(format!("{} {}", url, text.trim()));
    }

    /// Record labels, citations and links found in freshly built nodes.
    fn observe_blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            match block {
                Block::Header(_, attr, inlines) => {
                    self.note_label(attr);
                    self.observe_inlines(inlines);
                }
                Block::Div(attr, blocks) => {
                    self.note_label(attr);
                    self.observe_blocks(blocks);
                }
                Block::Paragraph(inlines) | Block::Plain(inlines) => self.observe_inlines(inlines),
                Block::BlockQuote(blocks) => self.observe_blocks(blocks),
                Block::BulletList(items) | Block::OrderedList(_, items) => {
                    for item in items {
                        self.observe_blocks(item);
                    }
                }
                _ => {}
            }
        }
    }

    fn observe_inlines(&mut self, inlines: &[Inline]) {
        for inline in inlines {
            match inline {
                Inline::Link(attr, content, target) => {
                    if let Some(key) = attr.get("data-cite") {
                        self.meta.citations.insert(key.to_string());
                    }
                    self.note_link(&target.url, content);
                    self.observe_inlines(content);
                }
                Inline::Span(attr, content) => {
                    self.note_label(attr);
                    self.observe_inlines(content);
                }
                Inline::Emphasis(c)
                | Inline::Strong(c)
                | Inline::Underline(c)
                | Inline::Strikeout(c)
                | Inline::Superscript(c)
                | Inline::Subscript(c)
                | Inline::SmallCaps(c)
                | Inline::Quoted(_, c)
                | Inline::Image(_, c, _)
                | Inline::CrossRef(_, c, _) => self.observe_inlines(c),
                Inline::Note(blocks) => self.observe_blocks(blocks),
                _ => {}
            }
        }
    }
}

/// The text of a paragraph made of one raw LaTeX inline and whitespace.
fn lone_raw_inline(inlines: &[Inline]) -> Option<&str> {
    let mut found = None;
    for inline in inlines {
        match inline {
            Inline::Space | Inline::SoftBreak => {}
            Inline::RawInline(format, text) if format.is_tex() && found.is_none() => {
                found = Some(text.as_str());
            }
            _ => return None,
        }
    }
    found
}

/// Inline view of re-parsed blocks: paragraphs contribute their content,
/// raw blocks become raw inlines.
fn flatten_blocks(blocks: Vec<Block>, out: &mut Vec<Inline>) {
    for block in blocks {
        let before = out.len();
        match block {
            Block::Paragraph(inlines) | Block::Plain(inlines) | Block::Header(_, _, inlines) => {
                if before > 0 {
                    out.push(Inline::Space);
                }
                out.extend(inlines);
            }
            Block::RawBlock(format, text) => {
                if before > 0 {
                    out.push(Inline::Space);
                }
                out.push(Inline::RawInline(format, text));
            }
            Block::Div(_, blocks) | Block::BlockQuote(blocks) => flatten_blocks(blocks, out),
            Block::BulletList(items) | Block::OrderedList(_, items) => {
                for item in items {
                    flatten_blocks(item, out);
                }
            }
            Block::CodeBlock(attr, text) => {
                if before > 0 {
                    out.push(Inline::Space);
                }
                out.push(Inline::Code(attr, text));
            }
            Block::HorizontalRule => {}
        }
    }
}

fn excerpt(text: &str) -> String {
    const MAX: usize = 60;
    let text = text.trim();
    match text.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{stringify, QuoteType, Target};
    use crate::parser::{parse, LatexReader};
    use pretty_assertions::assert_eq;

    fn bibliography() -> Bibliography {
        Bibliography::from_json(
            r#"[{"id": "Ale14", "author": [{"family": "Aleksandrov"}], "issued": {"date-parts": [[2014]]}}]"#,
        )
        .unwrap()
    }

    fn walk(source: &str) -> Walked {
        let bib = bibliography();
        Walker::new("page", &LatexReader, &bib)
            .walk(parse(source).unwrap())
            .unwrap()
    }

    fn first_para(walked: &Walked) -> &[Inline] {
        match &walked.document.blocks[0] {
            Block::Paragraph(inlines) => inlines,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_label_definition() {
        let walked = walk("Text \\label{fooBar} more.");
        let span = first_para(&walked)
            .iter()
            .find(|i| matches!(i, Inline::Span(..)))
            .unwrap();
        match span {
            Inline::Span(attr, content) => {
                assert_eq!(attr.id, "fooBar");
                assert!(attr.has_class("label"));
                assert!(content.is_empty());
            }
            _ => unreachable!(),
        }
        assert!(walked.meta.labels.contains("fooBar"));
    }

    #[test]
    fn test_citation_with_missing_key() {
        let walked = walk("See \\cite[p.~3]{Ale14, Smith99}.");
        let (attr, content) = match &first_para(&walked)[2] {
            Inline::Span(attr, content) => (attr, content),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(attr.classes, vec!["citation", "missing"]);
        assert_eq!(stringify(content), "[p.\u{a0}3, Ale14, UNDEF:Smith99]");

        let keys: Vec<_> = walked.meta.citations.iter().cloned().collect();
        assert_eq!(keys, vec!["Ale14", "Smith99"]);
        assert_eq!(walked.diagnostics.error_count(), 1);
    }

    #[test]
    fn test_known_citation_is_not_missing() {
        let walked = walk("\\cite{Ale14}");
        match &first_para(&walked)[0] {
            Inline::Span(attr, content) => {
                assert_eq!(attr.classes, vec!["citation"]);
                assert_eq!(
                    content[1],
                    Inline::Link(
                        Attr::with_classes(["cite"]).with("data-cite", "Ale14"),
                        vec![Inline::text("Ale14")],
                        Target::new("#Ale14", ""),
                    )
                );
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(walked.diagnostics.is_empty());
    }

    #[test]
    fn test_defin_span() {
        let walked = walk("A \\defin{Schur} b");
        assert_eq!(
            first_para(&walked)[2],
            Inline::Span(Attr::with_classes(["defin"]), vec![Inline::text("Schur")])
        );
    }

    #[test]
    fn test_icon_span() {
        let walked = walk("A \\icon{star} b");
        assert_eq!(
            first_para(&walked)[2],
            Inline::Span(Attr::with_classes(["icon"]).with("data-icon", "star"), Vec::new())
        );
    }

    #[test]
    fn test_oeis_link() {
        let walked = walk("See \\oeis{A000001} here");
        assert_eq!(
            first_para(&walked)[2],
            Inline::Link(
                Attr::default(),
                vec![Inline::text("A000001")],
                Target::new(
                    "https://oeis.org/A000001",
                    "The On-Line Encyclopedia of Integer Sequences"
                ),
            )
        );
        assert!(walked.meta.urls.contains("https://oeis.org/A000001 A000001"));
    }

    #[test]
    fn test_file_link() {
        let walked = walk("See \\filelink{data/schur.csv}{table} here");
        assert_eq!(
            first_para(&walked)[2],
            Inline::Link(
                Attr::default(),
                vec![Inline::text("table")],
                Target::new("data/schur.csv", ""),
            )
        );
    }

    #[test]
    fn test_enquote() {
        let walked = walk("A \\enquote{hook} b");
        assert_eq!(
            first_para(&walked)[2],
            Inline::Quoted(QuoteType::DoubleQuote, vec![Inline::text("hook")])
        );
    }

    #[test]
    fn test_quote_environment() {
        let walked = walk("\\begin{quote}\nWisdom\n\\end{quote}");
        assert_eq!(
            walked.document.blocks,
            vec![Block::BlockQuote(vec![Block::Paragraph(vec![Inline::text("Wisdom")])])]
        );
    }

    #[test]
    fn test_block_vspace() {
        let walked = walk("Before.\n\n\\bigskip\n\nAfter.");
        assert_eq!(
            walked.document.blocks[1],
            Block::Div(Attr::with_classes(["vspace", "bigskip"]), Vec::new())
        );
        assert!(walked.diagnostics.is_empty());
    }

    #[test]
    fn test_array_and_rtabular_are_retagged() {
        let array = "\\begin{array}{cc}\n1 & 2\n\\end{array}";
        let rtabular = "\\begin{rtabular}{ll}\na & b\n\\end{rtabular}";
        let walked = walk(&format!("{}\n\n{}", array, rtabular));
        assert_eq!(
            walked.document.blocks,
            vec![
                Block::RawBlock(Format::latex_table(), array.into()),
                Block::RawBlock(Format::latex_table(), rtabular.into()),
            ]
        );
    }

    #[test]
    fn test_meta_description() {
        let walked = walk("\\metadescription{Families of polynomials}");
        assert!(walked.document.blocks.is_empty());
        assert_eq!(walked.meta.description.as_deref(), Some("Families of polynomials"));
    }

    #[test]
    fn test_record_line_without_break() {
        let walked = walk("\\begin{polydata}{x}\nName & A\nYear & 2018 \\\\\n\\end{polydata}");
        let record = &walked.meta.records["x"];
        assert_eq!(record.len(), 2);
        assert_eq!(record["Name"], "A");
        assert_eq!(record["Year"], "2018");
    }

    #[test]
    fn test_unclosed_theorem_title_is_unrecognized() {
        let source = "\\begin{theorem}[Schur\nBody.\n\\end{theorem}";
        let walked = walk(source);
        assert_eq!(
            walked.document.blocks,
            vec![Block::RawBlock(Format::tex(), source.into())]
        );
        assert_eq!(walked.diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_theorem_environment() {
        let walked = walk("\\begin{theorem*}[Schur \\cite{Ale14}]\nBody with \\label{thm}.\n\\end{theorem*}");
        match &walked.document.blocks[0] {
            Block::Div(attr, content) => {
                assert_eq!(attr.classes, vec!["env", "theorem", "collapsible"]);
                match &content[0] {
                    Block::Paragraph(heading) => {
                        assert_eq!(heading[0], Inline::Strong(vec![Inline::text("Theorem")]));
                        assert_eq!(stringify(heading), "Theorem (Schur [Ale14])");
                    }
                    other => panic!("unexpected {:?}", other),
                }
                assert_eq!(content.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(walked.meta.citations.contains("Ale14"));
        assert!(walked.meta.labels.contains("thm"));
    }

    #[test]
    fn test_family_and_structured_record() {
        let source = "\\metatitle{Schur}\n\n\\metatitle{Schur functions}\n\n\
                      \\family[schurS]{Schur \\emph{polynomials}}\n\n\
                      \\begin{polydata}{schurS}\nName & Schur polynomials \\\\\nYear & 1901 \\\\\n\\end{polydata}\n";
        let walked = walk(source);

        assert_eq!(walked.document.blocks.len(), 1);
        match &walked.document.blocks[0] {
            Block::Header(level, attr, _) => {
                assert_eq!(*level, 2);
                assert_eq!(attr.id, "schurS");
                assert!(attr.has_class("family"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(walked.meta.title.as_deref(), Some("Schur functions"));
        assert_eq!(walked.meta.sections[0].title, "Schur polynomials");
        assert!(walked.meta.labels.contains("schurS"));

        let record = &walked.meta.records["schurS"];
        assert_eq!(record.len(), 2);
        assert_eq!(record["Name"], "Schur polynomials");
        assert_eq!(record["Year"], "1901");
    }

    #[test]
    fn test_figure_with_image() {
        let walked = walk("\\begin{figure}\n\\includeimage[0.5\\linewidth]{lie.svg}\n\\end{figure}");
        match &walked.document.blocks[0] {
            Block::Div(attr, content) => {
                assert!(attr.has_class("figure"));
                assert_eq!(
                    content[0],
                    Block::Paragraph(vec![Inline::Image(
                        Attr::default().with("width", "50%"),
                        Vec::new(),
                        Target::new("lie.svg", ""),
                    )])
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cross_references() {
        let walked = walk("See \\hyperref[heisenbergAlgebra]{the algebra} and \\ref{abelian}.");
        let refs: Vec<_> = first_para(&walked)
            .iter()
            .filter_map(|i| match i {
                Inline::CrossRef(_, content, label) => Some((label.as_str(), stringify(content))),
                _ => None,
            })
            .collect();
        assert_eq!(
            refs,
            vec![("heisenbergAlgebra", "the algebra".to_string()), ("abelian", String::new())]
        );
    }

    #[test]
    fn test_internal_link_becomes_cross_reference() {
        let bib = bibliography();
        let document = Document::new(vec![Block::Paragraph(vec![Inline::Link(
            Attr::default(),
            vec![Inline::text("Heisenberg")],
            Target::new("#heisenbergAlgebra", ""),
        )])]);
        let walked = Walker::new("page", &LatexReader, &bib).walk(document).unwrap();

        assert_eq!(
            first_para(&walked)[0],
            Inline::CrossRef(Attr::default(), vec![Inline::text("Heisenberg")], "heisenbergAlgebra".into())
        );
        assert!(walked.meta.urls.contains("#heisenbergAlgebra Heisenberg"));
    }

    #[test]
    fn test_removed_and_warned_forms() {
        let walked = walk("\\todo{ fix the table }\n\n\\begin{cssvariables}--accent: red;\\end{cssvariables}\n\nA \\medskip b.\n\n\\unknownmacro{x}");
        assert_eq!(walked.meta.todos, vec!["fix the table"]);
        assert_eq!(walked.meta.custom_css.as_deref(), Some("--accent: red;"));
        assert_eq!(walked.document.blocks.len(), 2);
        assert_eq!(
            walked.document.blocks[1],
            Block::RawBlock(Format::tex(), "\\unknownmacro{x}".into())
        );
        assert_eq!(walked.diagnostics.warning_count(), 2);
        assert_eq!(walked.diagnostics.error_count(), 0);
    }

    #[test]
    fn test_topic_cards() {
        let walked = walk("\\begin{topicsection}{Lie theory}\n\\topiccard{lie}{Lie \\emph{algebras}}{Classical families}\n\\end{topicsection}");
        assert_eq!(walked.document.blocks.len(), 2);
        match &walked.document.blocks[1] {
            Block::Div(attr, cards) => {
                assert!(attr.has_class("topic-card-grid"));
                match &cards[0] {
                    Block::Paragraph(inlines) => match &inlines[0] {
                        Inline::CrossRef(attr, content, label) => {
                            assert_eq!(label, "lie");
                            assert_eq!(attr.get("title"), Some("Classical families"));
                            assert!(matches!(&content[0], Inline::Image(_, _, t) if t.url == "thumbnails/lie.svg"));
                        }
                        other => panic!("unexpected {:?}", other),
                    },
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tables_are_retagged() {
        let walked = walk("\\begin{ytableau}\n1 & 2 \\\\ 3\n\\end{ytableau}\n\nInline \\ytab{1 & 2} here.");
        assert_eq!(
            walked.document.blocks[0],
            Block::RawBlock(Format::latex_table(), "\\begin{ytableau}\n1 & 2 \\\\ 3\n\\end{ytableau}".into())
        );
        assert!(matches!(
            &first_para_at(&walked, 1)[2],
            Inline::Span(attr, _) if attr.has_class("inline-table")
        ));
        assert_eq!(walked.diagnostics.warning_count(), 1);
    }

    fn first_para_at(walked: &Walked, index: usize) -> &[Inline] {
        match &walked.document.blocks[index] {
            Block::Paragraph(inlines) => inlines,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_walk_is_idempotent() {
        let source = "\\family[a]{A}\n\nSee \\cite{Ale14} and \\ref{b}.\n\n\\begin{proof}x\\end{proof}";
        let first = walk(source);
        let second = walk(source);
        assert_eq!(first.document, second.document);
        assert_eq!(first.meta, second.meta);
        assert_eq!(
            serde_json::to_string(&first.document).unwrap(),
            serde_json::to_string(&second.document).unwrap()
        );
    }
}
