//! Block macro forms, tried in order; the first matching rule wins.

use super::patterns::{Invocation, Optional, Pattern};
use super::Walker;
use crate::ast::{stringify, Attr, Block, Format, Inline};
use crate::error::Result;
use crate::meta::{PageSection, Record};
use crate::parser::split_top_level;

type Handler = fn(&mut Walker<'_>, &Invocation<'_>) -> Result<Option<Vec<Block>>>;

struct Rule {
    pattern: Pattern,
    handler: Handler,
}

/// Theorem-like environments, rendered as titled boxes.
pub const THEOREM_ENVIRONMENTS: &[&str] = &[
    "definition",
    "proposition",
    "theorem",
    "problem",
    "example",
    "lemma",
    "conjecture",
    "remark",
    "proof",
    "question",
    "solution",
];

/// Special blocks filled in at render time.
pub const SPECIAL_BLOCKS: &[&str] = &["polynomialtable"];

static RULES: &[Rule] = &[
    Rule { pattern: Pattern::command(&["smallskip", "medskip", "bigskip"]), handler: vspace },
    Rule {
        pattern: Pattern::command(&["metatitle", "metadescription", "metakeywords"]).args(1),
        handler: page_meta,
    },
    Rule { pattern: Pattern::environment(&["cssvariables"]), handler: css_variables },
    Rule { pattern: Pattern::command(&["specialblock"]).args(1), handler: special_block },
    Rule { pattern: Pattern::environment(&["quote", "blockquote"]), handler: block_quote },
    Rule {
        pattern: Pattern::environment(THEOREM_ENVIRONMENTS)
            .starred()
            .optional(Optional::Allowed),
        handler: theorem,
    },
    Rule {
        pattern: Pattern::command(&["family"]).optional(Optional::Required).args(1),
        handler: family,
    },
    Rule { pattern: Pattern::environment(&["polydata"]).args(1), handler: polydata },
    Rule { pattern: Pattern::environment(&["figurefreeze"]), handler: figure },
    Rule { pattern: Pattern::environment(&["topicsection"]).args(1), handler: topic_section },
    Rule { pattern: Pattern::environment(&["ytableau"]).optional(Optional::Allowed), handler: table },
    Rule { pattern: Pattern::environment(&["array", "rtabular"]).args(1), handler: table },
    Rule { pattern: Pattern::command(&["ytab"]).args(1), handler: table },
];

/// Rewrite raw block text. `None` means no form matched; an empty vector
/// means the node is removed.
pub(super) fn rewrite(walker: &mut Walker<'_>, text: &str) -> Result<Option<Vec<Block>>> {
    for rule in RULES {
        if let Some(invocation) = rule.pattern.match_text(text) {
            if let Some(blocks) = (rule.handler)(walker, &invocation)? {
                return Ok(Some(blocks));
            }
        }
    }
    Ok(None)
}

fn vspace(_: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Block>>> {
    Ok(Some(vec![Block::Div(
        Attr::with_classes(["vspace", inv.name]),
        Vec::new(),
    )]))
}

/// Later definitions in the same file overwrite earlier ones.
fn page_meta(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Block>>> {
    let value = w.plain_text(inv.arg(0))?;
    match inv.name {
        "metatitle" => w.meta.title = Some(value),
        "metadescription" => w.meta.description = Some(value),
        _ => w.meta.keywords = Some(value),
    }
    Ok(Some(Vec::new()))
}

fn css_variables(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Block>>> {
    w.meta.append_css(inv.body);
    Ok(Some(Vec::new()))
}

fn special_block(_: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Block>>> {
    let kind = inv.arg(0);
    if !SPECIAL_BLOCKS.contains(&kind) {
        return Ok(None);
    }
    let attr = Attr::with_classes(["special-block"]).with("block", kind);
    Ok(Some(vec![Block::Div(attr, Vec::new())]))
}

fn block_quote(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Block>>> {
    Ok(Some(vec![Block::BlockQuote(w.reparse_blocks(inv.body)?)]))
}

fn theorem(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Block>>> {
    let mut attr = Attr::with_classes(["env", inv.name]);
    if inv.starred {
        attr.add_class("collapsible");
    }

    let mut heading = vec![Inline::Strong(vec![Inline::text(capitalize(inv.name))])];
    if let Some(title) = inv.optional.map(str::trim).filter(|t| !t.is_empty()) {
        heading.push(Inline::text(" ("));
        heading.extend(w.reparse_inlines(title)?);
        heading.push(Inline::text(")"));
    }

    let mut content = vec![Block::Paragraph(heading)];
    content.extend(w.reparse_blocks(inv.body)?);
    Ok(Some(vec![Block::Div(attr, content)]))
}

fn family(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Block>>> {
    let id = inv.optional.unwrap_or_default().trim();
    if id.is_empty() {
        return Ok(None);
    }
    let title = w.reparse_inlines(inv.arg(0))?;

    w.meta.sections.push(PageSection {
        id: id.to_string(),
        title: stringify(&title).trim().to_string(),
        level: 2,
    });
    w.meta.labels.insert(id.to_string());

    let mut attr = Attr::with_id(id);
    attr.add_class("family");
    Ok(Some(vec![Block::Header(2, attr, title)]))
}

fn polydata(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Block>>> {
    let id = inv.arg(0);
    if id.is_empty() {
        return Ok(None);
    }
    w.meta.records.insert(id.to_string(), parse_record(inv.body));
    Ok(Some(Vec::new()))
}

/// Parse `Key & Value \\` lines into a field map.
///
/// The trailing `\\` of a line is optional. Each line splits on its first
/// top-level `&`; blank lines and lines without a key are skipped.
pub fn parse_record(body: &str) -> Record {
    let mut record = Record::new();
    for line in body.lines() {
        let line = line.trim();
        let line = line.strip_suffix("\\\\").unwrap_or(line).trim();
        if line.is_empty() {
            continue;
        }
        let key = match split_top_level(line, "&").first() {
            Some(key) if key.len() < line.len() => *key,
            _ => continue,
        };
        let value = &line[key.len() + 1..];
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        record.insert(key.to_string(), value.trim().to_string());
    }
    record
}

fn figure(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Block>>> {
    Ok(Some(vec![Block::Div(
        Attr::with_classes(["figure"]),
        w.reparse_blocks(inv.body)?,
    )]))
}

fn topic_section(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Block>>> {
    let title = w.reparse_inlines(inv.arg(0))?;
    let cards = w.reparse_blocks(inv.body)?;
    Ok(Some(vec![
        Block::Header(2, Attr::with_classes(["topic-section"]), title),
        Block::Div(Attr::with_classes(["topic-card-grid"]), cards),
    ]))
}

fn table(_: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Block>>> {
    Ok(Some(vec![Block::RawBlock(
        Format::latex_table(),
        inv.source.to_string(),
    )]))
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_record() {
        let record = parse_record("Name & Boolean product polynomials \\\\\nYear & 2018 \\\\");
        assert_eq!(record.len(), 2);
        assert_eq!(record["Name"], "Boolean product polynomials");
        assert_eq!(record["Year"], "2018");
    }

    #[test]
    fn test_parse_record_line_without_break() {
        let record = parse_record("Name & A\nYear & 2018 \\\\\nCategory & {x \\\\ y}");
        assert_eq!(record.len(), 3);
        assert_eq!(record["Name"], "A");
        assert_eq!(record["Year"], "2018");
        assert_eq!(record["Category"], "{x \\\\ y}");
    }

    #[test]
    fn test_parse_record_skips_malformed() {
        let body = "\n  \\\\\nno separator here \\\\\n & orphan value \\\\\nCategory & {A & B} \\\\\nRating & \\\\";
        let record = parse_record(body);
        assert_eq!(record.len(), 2);
        assert_eq!(record["Category"], "{A & B}");
        assert_eq!(record["Rating"], "");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("theorem"), "Theorem");
        assert_eq!(capitalize(""), "");
    }
}
