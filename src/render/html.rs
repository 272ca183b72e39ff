//! HTML renderer for rewritten page trees.

use crate::ast::{stringify, Attr, Block, Inline, MathType, QuoteType};
use crate::bibliography::Bibliography;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::merge::{LabelIndex, RecordIndex, RefTarget};
use crate::meta::{Artifact, DocumentMeta};
use crate::render::math::{create_renderer, MathBackend, MathRenderer};
use crate::render::{escape_html, layout_table, Template};
use std::collections::{HashMap, HashSet};

/// Attribute keys emitted under their own name; all others get a `data-`
/// prefix.
const HTML_ATTRIBUTES: &[&str] = &["title", "style", "lang", "dir"];

/// Columns of the family index table.
const RECORD_COLUMNS: [&str; 4] = ["Name", "Category", "Year", "Rating"];

/// Site-wide inputs shared by every page render.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub labels: &'a LabelIndex,
    pub records: &'a RecordIndex,
    pub bibliography: &'a Bibliography,
    pub template: &'a Template,
    pub math: MathBackend,
    /// Date stamped into `{{lastmod}}`
    pub lastmod: &'a str,
}

/// A finished page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Output file name, `<stem>.htm`
    pub path: String,
    pub html: String,
    pub diagnostics: Diagnostics,
}

/// Render one page artifact to a complete HTML document.
pub fn render_page(artifact: &Artifact, ctx: &RenderContext<'_>) -> Result<RenderedPage> {
    HtmlRenderer::new(&artifact.meta, ctx).render(&artifact.blocks)
}

struct HtmlRenderer<'a> {
    meta: &'a DocumentMeta,
    ctx: &'a RenderContext<'a>,
    math: Box<dyn MathRenderer>,
    output: String,
    footnotes: Vec<String>,
    diagnostics: Diagnostics,
}

impl<'a> HtmlRenderer<'a> {
    fn new(meta: &'a DocumentMeta, ctx: &'a RenderContext<'a>) -> Self {
        Self {
            meta,
            ctx,
            math: create_renderer(ctx.math),
            output: String::new(),
            footnotes: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    fn render(mut self, blocks: &[Block]) -> Result<RenderedPage> {
        for block in blocks {
            self.render_block(block)?;
        }
        self.render_footnotes_section();
        let body = std::mem::take(&mut self.output);

        let order = self.citation_order(blocks);
        let bibliography = self.render_bibliography(&order);
        let toc = render_toc(blocks, !order.is_empty());

        let css = match &self.meta.custom_css {
            Some(css) => format!("<style>\n{}\n</style>", css.trim()),
            None => String::new(),
        };

        let values = HashMap::from([
            ("title", escape_html(&self.meta.display_title())),
            ("description", escape_html(&self.meta.display_description())),
            ("keywords", escape_html(self.meta.keywords.as_deref().unwrap_or_default())),
            ("css", css),
            ("math_head", self.math.head_content().unwrap_or_default()),
            ("toc", toc),
            ("body", body),
            ("bibliography", bibliography),
            ("lastmod", escape_html(self.ctx.lastmod)),
            ("page", escape_html(&self.meta.output_path())),
        ]);

        tracing::debug!(
            page = %self.meta.source_stem,
            citations = order.len(),
            footnotes = self.footnotes.len(),
            "rendered page"
        );

        Ok(RenderedPage {
            path: self.meta.output_path(),
            html: self.ctx.template.fill(&values),
            diagnostics: self.diagnostics,
        })
    }

    fn error(&mut self, message: String) {
        self.diagnostics.error(&self.meta.source_stem, message);
    }

    fn render_blocks(&mut self, blocks: &[Block]) -> Result<()> {
        for block in blocks {
            self.render_block(block)?;
        }
        Ok(())
    }

    fn render_block(&mut self, block: &Block) -> Result<()> {
        match block {
            Block::Plain(inlines) => {
                self.render_inlines(inlines)?;
                self.output.push('\n');
            }
            Block::Paragraph(inlines) => {
                self.output.push_str("<p>");
                self.render_inlines(inlines)?;
                self.output.push_str("</p>\n");
            }
            Block::Header(level, attr, content) => {
                let level = (*level).clamp(1, 6);
                self.output.push_str(&format!("<h{}{}>", level, attr_html(attr, &[])));
                self.render_inlines(content)?;
                self.output.push_str(&format!("</h{}>\n", level));
            }
            Block::CodeBlock(attr, content) => {
                self.output.push_str("<pre><code");
                if let Some(lang) = attr.classes.first() {
                    self.output.push_str(&format!(r#" class="language-{}""#, escape_html(lang)));
                }
                self.output.push('>');
                self.output.push_str(&escape_html(content));
                self.output.push_str("</code></pre>\n");
            }
            Block::RawBlock(format, text) => {
                if format.is_table() {
                    self.render_table(text);
                    self.output.push('\n');
                } else if format.is_tex() {
                    self.output.push_str("<p>");
                    self.render_unparsed(text);
                    self.output.push_str("</p>\n");
                } else if format.0 == "html" {
                    self.output.push_str(text);
                    self.output.push('\n');
                }
            }
            Block::BlockQuote(blocks) => {
                self.output.push_str("<blockquote>\n");
                self.render_blocks(blocks)?;
                self.output.push_str("</blockquote>\n");
            }
            Block::BulletList(items) => {
                self.output.push_str("<ul>\n");
                self.render_list_items(items)?;
                self.output.push_str("</ul>\n");
            }
            Block::OrderedList((start, _, _), items) => {
                self.output.push_str("<ol");
                if *start != 1 {
                    self.output.push_str(&format!(r#" start="{}""#, start));
                }
                self.output.push_str(">\n");
                self.render_list_items(items)?;
                self.output.push_str("</ol>\n");
            }
            Block::HorizontalRule => {
                self.output.push_str("<hr>\n");
            }
            Block::Div(attr, blocks) => self.render_div(attr, blocks)?,
        }

        Ok(())
    }

    fn render_list_items(&mut self, items: &[Vec<Block>]) -> Result<()> {
        for item in items {
            self.output.push_str("<li>");
            // Inline single paragraphs in list items
            match item.as_slice() {
                [Block::Paragraph(inlines)] | [Block::Plain(inlines)] => self.render_inlines(inlines)?,
                blocks => self.render_blocks(blocks)?,
            }
            self.output.push_str("</li>\n");
        }
        Ok(())
    }

    fn render_div(&mut self, attr: &Attr, blocks: &[Block]) -> Result<()> {
        if attr.has_class("special-block") {
            match attr.get("block") {
                Some("polynomialtable") => self.render_record_table(),
                other => {
                    let kind = other.unwrap_or_default().to_string();
                    self.error(format!("unknown special block {:?}", kind));
                }
            }
            return Ok(());
        }

        if attr.has_class("collapsible") {
            // The heading paragraph becomes the summary line
            self.output.push_str(&format!("<details{}>\n<summary>", attr_html(attr, &[])));
            let body = match blocks.split_first() {
                Some((Block::Paragraph(heading), rest)) => {
                    self.render_inlines(heading)?;
                    rest
                }
                _ => blocks,
            };
            self.output.push_str("</summary>\n");
            self.render_blocks(body)?;
            self.output.push_str("</details>\n");
            return Ok(());
        }

        let tag = if attr.has_class("figure") { "figure" } else { "div" };
        self.output.push_str(&format!("<{}{}>", tag, attr_html(attr, &[])));
        if !blocks.is_empty() {
            self.output.push('\n');
            self.render_blocks(blocks)?;
        }
        self.output.push_str(&format!("</{}>\n", tag));
        Ok(())
    }

    /// Every structured record on the site, ordered by id.
    fn render_record_table(&mut self) {
        let ctx = self.ctx;
        self.output.push_str("<table class=\"polynomial-table\">\n<thead><tr>");
        for column in RECORD_COLUMNS {
            self.output.push_str(&format!("<th>{}</th>", column));
        }
        self.output.push_str("</tr></thead>\n<tbody>\n");

        for (id, record) in ctx.records.iter() {
            let field = |name: &str| {
                record
                    .get(name)
                    .map(|v| escape_html(v.trim()))
                    .unwrap_or_default()
            };
            let name = match ctx.labels.get(id) {
                Some(entry) => format!(r#"<a href="{}">{}</a>"#, escape_html(&entry.href), field("Name")),
                None => field("Name"),
            };
            self.output.push_str(&format!(
                "<tr data-record=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(id),
                name,
                field("Category"),
                field("Year"),
                field("Rating")
            ));
        }

        self.output.push_str("</tbody>\n</table>\n");
    }

    fn render_table(&mut self, source: &str) {
        match layout_table(source) {
            Some(table) => self.output.push_str(&table),
            None => self.render_unparsed(source),
        }
    }

    /// Raw LaTeX that survived the walk.
    fn render_unparsed(&mut self, text: &str) {
        self.error(format!("unparsed LaTeX at render time: {}", text.trim()));
        self.output.push_str(&format!(
            r#"<code class="unparsed">{}</code>"#,
            escape_html(text.trim())
        ));
    }

    fn render_inlines(&mut self, inlines: &[Inline]) -> Result<()> {
        for inline in inlines {
            self.render_inline(inline)?;
        }
        Ok(())
    }

    fn render_inline(&mut self, inline: &Inline) -> Result<()> {
        match inline {
            Inline::Text(text) => {
                self.output.push_str(&escape_html(text));
            }
            Inline::Emphasis(inlines) => self.wrap("em", inlines)?,
            Inline::Strong(inlines) => self.wrap("strong", inlines)?,
            Inline::Underline(inlines) => self.wrap("u", inlines)?,
            Inline::Strikeout(inlines) => self.wrap("del", inlines)?,
            Inline::Superscript(inlines) => self.wrap("sup", inlines)?,
            Inline::Subscript(inlines) => self.wrap("sub", inlines)?,
            Inline::SmallCaps(inlines) => {
                self.output.push_str(r#"<span style="font-variant: small-caps;">"#);
                self.render_inlines(inlines)?;
                self.output.push_str("</span>");
            }
            Inline::Quoted(kind, inlines) => {
                let (open, close) = match kind {
                    QuoteType::SingleQuote => ('\u{2018}', '\u{2019}'),
                    QuoteType::DoubleQuote => ('\u{201c}', '\u{201d}'),
                };
                self.output.push(open);
                self.render_inlines(inlines)?;
                self.output.push(close);
            }
            Inline::Code(_, code) => {
                self.output.push_str("<code>");
                self.output.push_str(&escape_html(code));
                self.output.push_str("</code>");
            }
            Inline::Space => self.output.push(' '),
            Inline::SoftBreak => self.output.push('\n'),
            Inline::LineBreak => self.output.push_str("<br>\n"),
            Inline::Math(MathType::InlineMath, latex) => {
                let rendered = self.math.render_inline(latex)?;
                self.output.push_str(&rendered);
            }
            Inline::Math(MathType::DisplayMath, latex) => {
                let rendered = self.math.render_display(latex)?;
                self.output.push_str(&rendered);
            }
            Inline::RawInline(format, text) => {
                if format.is_table() {
                    self.render_table(text);
                } else if format.is_tex() {
                    self.render_unparsed(text);
                } else if format.0 == "html" {
                    self.output.push_str(text);
                }
            }
            Inline::Link(attr, content, target) => {
                self.output.push_str(&format!(r#"<a href="{}""#, escape_html(&target.url)));
                if !target.title.is_empty() {
                    self.output.push_str(&format!(r#" title="{}""#, escape_html(&target.title)));
                }
                self.output.push_str(&attr_html(attr, &[]));
                self.output.push('>');
                self.render_inlines(content)?;
                self.output.push_str("</a>");
            }
            Inline::Image(attr, alt, target) => {
                self.output.push_str(&format!(
                    r#"<img src="{}" alt="{}""#,
                    escape_html(&target.url),
                    escape_html(&stringify(alt))
                ));
                if !target.title.is_empty() {
                    self.output.push_str(&format!(r#" title="{}""#, escape_html(&target.title)));
                }
                if let Some(width) = attr.get("width").filter(|w| *w != "auto") {
                    self.output.push_str(&format!(r#" style="width: {};""#, escape_html(width)));
                }
                self.output.push_str(&attr_html(attr, &["width"]));
                self.output.push('>');
            }
            Inline::Note(blocks) => self.render_footnote(blocks)?,
            Inline::Span(attr, content) => {
                if let Some(icon) = attr.get("data-icon").filter(|_| attr.has_class("icon")) {
                    self.output.push_str(&format!(
                        r#"<span class="icon icon-{}" aria-hidden="true"></span>"#,
                        escape_html(icon)
                    ));
                } else {
                    self.output.push_str(&format!("<span{}>", attr_html(attr, &[])));
                    self.render_inlines(content)?;
                    self.output.push_str("</span>");
                }
            }
            Inline::CrossRef(attr, content, label) => self.render_cross_ref(attr, content, label)?,
        }

        Ok(())
    }

    fn wrap(&mut self, tag: &str, inlines: &[Inline]) -> Result<()> {
        self.output.push_str(&format!("<{}>", tag));
        self.render_inlines(inlines)?;
        self.output.push_str(&format!("</{}>", tag));
        Ok(())
    }

    /// Resolve a deferred reference against the label index. Unknown labels
    /// are reported and left as an anchor on the current page.
    fn render_cross_ref(&mut self, attr: &Attr, content: &[Inline], label: &str) -> Result<()> {
        let href = match self.ctx.labels.resolve(label) {
            RefTarget::Resolved(url) => url,
            RefTarget::Deferred(label) => {
                self.error(format!(
                    "unresolved label {} (link text {:?})",
                    label,
                    stringify(content).trim()
                ));
                format!("#{}", label)
            }
        };

        let mut attr = attr.clone();
        attr.add_class("crossref");
        self.output.push_str(&format!(r#"<a href="{}"{}>"#, escape_html(&href), attr_html(&attr, &[])));
        if content.is_empty() {
            let text = self
                .ctx
                .labels
                .get(label)
                .map_or(label, |entry| entry.title.as_str());
            self.output.push_str(&escape_html(text));
        } else {
            self.render_inlines(content)?;
        }
        self.output.push_str("</a>");
        Ok(())
    }

    fn render_footnote(&mut self, blocks: &[Block]) -> Result<()> {
        let outer = std::mem::take(&mut self.output);
        self.render_blocks(blocks)?;
        let note = std::mem::replace(&mut self.output, outer);
        self.footnotes.push(note);

        let num = self.footnotes.len();
        self.output.push_str(&format!(
            "<sup id=\"fnref-{num}\" class=\"footnote-ref\"><a href=\"#fn-{num}\">[{num}]</a></sup>"
        ));
        Ok(())
    }

    fn render_footnotes_section(&mut self) {
        if self.footnotes.is_empty() {
            return;
        }
        self.output.push_str("<section class=\"footnotes\">\n<hr>\n<ol>\n");
        for (i, note) in self.footnotes.iter().enumerate() {
            let num = i + 1;
            self.output.push_str(&format!(
                "<li id=\"fn-{num}\">{} <a href=\"#fnref-{num}\" class=\"footnote-back\">\u{21a9}</a></li>\n",
                note.trim_end()
            ));
        }
        self.output.push_str("</ol>\n</section>\n");
    }

    /// Cited keys in order of first appearance, then any recorded key the
    /// tree no longer mentions.
    fn citation_order(&self, blocks: &[Block]) -> Vec<String> {
        let mut order = Vec::new();
        collect_block_citations(blocks, &mut order);

        let mut seen: HashSet<String> = order.iter().cloned().collect();
        for key in &self.meta.citations {
            if seen.insert(key.clone()) {
                order.push(key.clone());
            }
        }
        order
    }

    fn render_bibliography(&self, order: &[String]) -> String {
        if order.is_empty() {
            return String::new();
        }

        let mut html =
            String::from("<section id=\"references\" class=\"bibliography\">\n<h2>References</h2>\n<ol>\n");
        for key in order {
            let id = escape_html(key);
            // Undefined keys were already reported by the walk
            match (self.ctx.bibliography.label(key), self.ctx.bibliography.format(key)) {
                (Some(label), Some(entry)) => html.push_str(&format!(
                    "<li id=\"{}\"><span class=\"bib-label\">[{}]</span> {}</li>\n",
                    id,
                    escape_html(&label),
                    entry
                )),
                _ => html.push_str(&format!("<li id=\"{}\" class=\"missing\">UNDEF:{}</li>\n", id, id)),
            }
        }
        html.push_str("</ol>\n</section>\n");
        html
    }
}

/// Level-2 headers with an identifier, plus the references section.
fn render_toc(blocks: &[Block], has_bibliography: bool) -> String {
    let mut entries = Vec::new();
    collect_toc_entries(blocks, &mut entries);
    if has_bibliography {
        entries.push("<li><a href=\"#references\">References</a></li>".to_string());
    }
    if entries.is_empty() {
        return String::new();
    }
    format!("<ul>\n{}\n</ul>", entries.join("\n"))
}

fn collect_toc_entries(blocks: &[Block], entries: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Header(2, attr, content) if !attr.id.is_empty() => entries.push(format!(
                "<li><a href=\"#{}\">{}</a></li>",
                escape_html(&attr.id),
                escape_html(stringify(content).trim())
            )),
            Block::Div(_, inner) => collect_toc_entries(inner, entries),
            _ => {}
        }
    }
}

fn collect_block_citations(blocks: &[Block], order: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Plain(inlines) | Block::Paragraph(inlines) | Block::Header(_, _, inlines) => {
                collect_inline_citations(inlines, order)
            }
            Block::BlockQuote(inner) | Block::Div(_, inner) => collect_block_citations(inner, order),
            Block::BulletList(items) | Block::OrderedList(_, items) => {
                for item in items {
                    collect_block_citations(item, order);
                }
            }
            Block::CodeBlock(..) | Block::RawBlock(..) | Block::HorizontalRule => {}
        }
    }
}

fn collect_inline_citations(inlines: &[Inline], order: &mut Vec<String>) {
    for inline in inlines {
        match inline {
            Inline::Link(attr, content, _) => {
                if let Some(key) = attr.get("data-cite") {
                    if !order.iter().any(|k| k == key) {
                        order.push(key.to_string());
                    }
                }
                collect_inline_citations(content, order);
            }
            Inline::Emphasis(inner)
            | Inline::Strong(inner)
            | Inline::Underline(inner)
            | Inline::Strikeout(inner)
            | Inline::Superscript(inner)
            | Inline::Subscript(inner)
            | Inline::SmallCaps(inner)
            | Inline::Quoted(_, inner)
            | Inline::Image(_, inner, _)
            | Inline::Span(_, inner)
            | Inline::CrossRef(_, inner, _) => collect_inline_citations(inner, order),
            Inline::Note(blocks) => collect_block_citations(blocks, order),
            _ => {}
        }
    }
}

/// ` id=".." class=".." key=".."`, skipping the given keys.
fn attr_html(attr: &Attr, skip: &[&str]) -> String {
    let mut out = String::new();
    if !attr.id.is_empty() {
        out.push_str(&format!(r#" id="{}""#, escape_html(&attr.id)));
    }
    if !attr.classes.is_empty() {
        out.push_str(&format!(r#" class="{}""#, escape_html(&attr.classes.join(" "))));
    }
    for (key, value) in attr.attributes.iter().filter(|(k, _)| !skip.contains(&k.as_str())) {
        let name = if key.starts_with("data-") || HTML_ATTRIBUTES.contains(&key.as_str()) {
            key.clone()
        } else {
            format!("data-{}", key)
        };
        out.push_str(&format!(r#" {}="{}""#, escape_html(&name), escape_html(value)));
    }
    out
}
