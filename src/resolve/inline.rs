//! Inline macro forms, tried in order; the first matching rule wins.

use super::patterns::{Invocation, Optional, Pattern};
use super::Walker;
use crate::ast::{stringify, Attr, Format, Inline, QuoteType, Target};
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d*\.?\d+)").unwrap());

const OEIS_TITLE: &str = "The On-Line Encyclopedia of Integer Sequences";

type Handler = fn(&mut Walker<'_>, &Invocation<'_>) -> Result<Option<Vec<Inline>>>;

struct Rule {
    pattern: Pattern,
    handler: Handler,
}

const VSPACE: &[&str] = &["smallskip", "medskip", "bigskip"];

static RULES: &[Rule] = &[
    Rule { pattern: Pattern::command(&["defin"]).args(1), handler: defin },
    Rule { pattern: Pattern::command(&["icon"]).args(1), handler: icon },
    Rule {
        pattern: Pattern::command(&["includeimage"]).optional(Optional::Allowed).args(1),
        handler: include_image,
    },
    Rule { pattern: Pattern::command(&["oeis"]).args(1), handler: oeis },
    Rule { pattern: Pattern::command(&["filelink"]).args(2), handler: file_link },
    Rule {
        pattern: Pattern::command(&["hyperref"]).optional(Optional::Required).args(1),
        handler: hyperref,
    },
    Rule { pattern: Pattern::command(&["ref", "cref", "Cref"]).args(1), handler: reference },
    Rule { pattern: Pattern::command(&["label"]).args(1), handler: label },
    Rule { pattern: Pattern::command(&["enquote"]).args(1), handler: enquote },
    Rule {
        pattern: Pattern::command(&["cite"]).optional(Optional::Allowed).args(1),
        handler: cite,
    },
    Rule { pattern: Pattern::command(VSPACE), handler: vspace },
    Rule { pattern: Pattern::command(&["ytab"]).args(1), handler: inline_table },
    Rule { pattern: Pattern::command(&["topiccard"]).args(3), handler: topic_card },
    Rule { pattern: Pattern::command(&["todo"]).args(1), handler: todo },
];

/// Rewrite raw inline text. `None` means no form matched; an empty vector
/// means the node is removed.
pub(super) fn rewrite(walker: &mut Walker<'_>, text: &str) -> Result<Option<Vec<Inline>>> {
    for rule in RULES {
        if let Some(invocation) = rule.pattern.match_text(text) {
            if let Some(inlines) = (rule.handler)(walker, &invocation)? {
                return Ok(Some(inlines));
            }
        }
    }
    Ok(None)
}

fn defin(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Inline>>> {
    let content = w.reparse_inlines(inv.arg(0))?;
    Ok(Some(vec![Inline::span(Attr::with_classes(["defin"]), content)]))
}

fn icon(_: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Inline>>> {
    let attr = Attr::with_classes(["icon"]).with("data-icon", inv.arg(0));
    Ok(Some(vec![Inline::span(attr, Vec::new())]))
}

fn include_image(_: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Inline>>> {
    let path = inv.arg(0);
    if path.is_empty() {
        return Ok(None);
    }
    let attr = Attr::default().with("width", image_width(inv.optional));
    Ok(Some(vec![Inline::Image(attr, Vec::new(), Target::new(path, ""))]))
}

/// `0.8\linewidth` becomes `80%`; anything without a number is `auto`.
pub(crate) fn image_width(scale: Option<&str>) -> String {
    scale
        .and_then(|s| LEADING_DECIMAL.captures(s))
        .and_then(|c| c[1].parse::<f64>().ok())
        .map(|factor| format!("{}%", (factor * 100.0).round() as i64))
        .unwrap_or_else(|| "auto".to_string())
}

fn oeis(_: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Inline>>> {
    let id = inv.arg(0);
    let target = Target::new(format!("https://oeis.org/{}", id), OEIS_TITLE);
    Ok(Some(vec![Inline::Link(Attr::default(), vec![Inline::text(id)], target)]))
}

fn file_link(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Inline>>> {
    let content = w.reparse_inlines(inv.arg(1))?;
    Ok(Some(vec![Inline::Link(
        Attr::default(),
        content,
        Target::new(inv.arg(0), ""),
    )]))
}

fn hyperref(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Inline>>> {
    let label = inv.optional.unwrap_or_default().trim();
    if label.is_empty() {
        return Ok(None);
    }
    let content = w.reparse_inlines(inv.arg(0))?;
    Ok(Some(vec![Inline::CrossRef(Attr::default(), content, label.to_string())]))
}

/// `\ref` and `\cref` carry no text; the renderer shows the target's title.
fn reference(_: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Inline>>> {
    let label = inv.arg(0);
    if label.is_empty() {
        return Ok(None);
    }
    Ok(Some(vec![Inline::CrossRef(Attr::default(), Vec::new(), label.to_string())]))
}

fn label(_: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Inline>>> {
    let id = inv.arg(0);
    if id.is_empty() {
        return Ok(None);
    }
    let mut attr = Attr::with_id(id);
    attr.add_class("label");
    Ok(Some(vec![Inline::span(attr, Vec::new())]))
}

fn enquote(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Inline>>> {
    let content = w.reparse_inlines(inv.arg(0))?;
    Ok(Some(vec![Inline::Quoted(QuoteType::DoubleQuote, content)]))
}

fn cite(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Inline>>> {
    let keys: Vec<&str> = inv
        .arg(0)
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect();
    if keys.is_empty() {
        return Ok(None);
    }

    let mut attr = Attr::with_classes(["citation"]);
    let mut content = vec![Inline::text("[")];

    if let Some(note) = inv.optional.map(str::trim).filter(|n| !n.is_empty()) {
        content.extend(w.reparse_inlines(note)?);
        content.push(Inline::text(", "));
    }

    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            content.push(Inline::text(", "));
        }
        let text = match w.bibliography.label(key) {
            Some(label) => label,
            None => {
                w.error(format!("undefined citation key {}", key));
                attr.add_class("missing");
                format!("UNDEF:{}", key)
            }
        };
        w.meta.citations.insert(key.to_string());
        let link_attr = Attr::with_classes(["cite"]).with("data-cite", *key);
        content.push(Inline::Link(
            link_attr,
            vec![Inline::text(text)],
            Target::new(format!("#{}", key), ""),
        ));
    }

    content.push(Inline::text("]"));
    Ok(Some(vec![Inline::span(attr, content)]))
}

fn vspace(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Inline>>> {
    w.warn(format!("\\{} used inline, expected on its own line", inv.name));
    let attr = Attr::with_classes(["vspace", inv.name]);
    Ok(Some(vec![Inline::span(attr, Vec::new())]))
}

fn inline_table(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Inline>>> {
    w.warn("\\ytab used inline, expected on its own line");
    let table = Inline::RawInline(Format::latex_table(), inv.source.to_string());
    Ok(Some(vec![Inline::span(Attr::with_classes(["inline-table"]), vec![table])]))
}

fn topic_card(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Inline>>> {
    let id = inv.arg(0);
    if id.is_empty() {
        return Ok(None);
    }
    let title = w.reparse_inlines(inv.arg(1))?;
    let description = stringify(&w.reparse_inlines(inv.arg(2))?);

    let thumbnail = Inline::Image(
        Attr::with_classes(["topic-card-image"]),
        Vec::new(),
        Target::new(format!("thumbnails/{}.svg", id), ""),
    );
    let caption = Inline::span(Attr::with_classes(["topic-card-title"]), title);
    let attr = Attr::with_classes(["topic-card"]).with("title", description.trim());

    Ok(Some(vec![Inline::CrossRef(attr, vec![thumbnail, caption], id.to_string())]))
}

fn todo(w: &mut Walker<'_>, inv: &Invocation<'_>) -> Result<Option<Vec<Inline>>> {
    let note = inv.arg(0).to_string();
    tracing::info!(page = %w.page(), todo = %note, "todo");
    w.meta.todos.push(note);
    Ok(Some(Vec::new()))
}
