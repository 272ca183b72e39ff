//! Block-level parsing for the LaTeX subset.

use crate::ast::{Attr, Block, Format, Inline, ListNumberDelim, ListNumberStyle, MathType};
use crate::error::Result;
use crate::parser::inline::parse_inlines;
use crate::parser::lexer::{
    bracketed, command_name, environment, raw_command, spaced_braced, star, Environment,
};
use nom::{bytes::complete::tag, character::complete::multispace0, sequence::preceded};

const SECTIONS: [(&str, u8); 3] = [("section", 1), ("subsection", 2), ("subsubsection", 3)];

/// Commands the inline parser understands natively; a paragraph made of one of
/// these is ordinary text rather than a raw block.
const NATIVE_INLINE: [&str; 11] = [
    "emph", "textit", "textsl", "textbf", "textsc", "underline", "sout", "textsuperscript",
    "textsubscript", "texttt", "href",
];

/// Parse a sequence of blocks from a string.
pub fn parse_blocks(input: &str) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();
    let mut remaining = input;

    loop {
        remaining = remaining.trim_start();
        if remaining.is_empty() {
            break;
        }

        if remaining.starts_with('%') {
            let end = remaining.find('\n').unwrap_or(remaining.len());
            remaining = &remaining[end..];
            continue;
        }

        if remaining.starts_with("\\begin") {
            if let Ok((rest, env)) = environment(remaining) {
                blocks.push(parse_environment(env)?);
                remaining = rest;
                continue;
            }
        }

        if let Some((block, rest)) = try_parse_section(remaining)? {
            blocks.push(block);
            remaining = rest;
            continue;
        }

        let end = paragraph_end(remaining);
        let text = &remaining[..end];
        remaining = &remaining[end..];
        blocks.push(parse_paragraph(text)?);
    }

    Ok(blocks)
}

fn parse_environment(env: Environment<'_>) -> Result<Block> {
    let block = match env.name {
        "itemize" => Block::BulletList(parse_items(env.body)?),
        "enumerate" => Block::OrderedList(
            (1, ListNumberStyle::Decimal, ListNumberDelim::Period),
            parse_items(env.body)?,
        ),
        "equation" | "equation*" | "displaymath" => Block::Paragraph(vec![Inline::Math(
            MathType::DisplayMath,
            env.body.trim().to_string(),
        )]),
        "align" | "align*" | "gather" | "gather*" | "multline" | "multline*" => {
            Block::Paragraph(vec![Inline::Math(
                MathType::DisplayMath,
                env.source.trim().to_string(),
            )])
        }
        "verbatim" => Block::CodeBlock(Attr::default(), env.body.trim_matches('\n').to_string()),
        _ => Block::RawBlock(Format::tex(), env.source.to_string()),
    };
    Ok(block)
}

/// Split a list body on top-level `\item` markers.
fn parse_items(body: &str) -> Result<Vec<Vec<Block>>> {
    let mut starts = Vec::new();
    let mut pos = 0usize;

    while pos < body.len() {
        let rest = &body[pos..];
        if rest.starts_with("\\begin") {
            if let Ok((after, _)) = environment(rest) {
                pos = body.len() - after.len();
                continue;
            }
        }
        if rest.starts_with("\\item") && !rest[5..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            starts.push(pos);
        }
        pos += rest.chars().next().map_or(1, char::len_utf8);
    }

    let mut items = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(body.len());
        let mut item = body[start + 5..end].trim_start();
        if let Ok((rest, _)) = bracketed(item) {
            item = rest;
        }
        items.push(parse_blocks(item)?);
    }
    Ok(items)
}

fn try_parse_section(input: &str) -> Result<Option<(Block, &str)>> {
    let (rest, name) = match command_name(input) {
        Ok(parsed) => parsed,
        Err(_) => return Ok(None),
    };
    let level = match SECTIONS.iter().find(|(n, _)| *n == name) {
        Some((_, level)) => *level,
        None => return Ok(None),
    };
    let (rest, _) = star(rest).unwrap_or((rest, false));
    let (rest, title) = match spaced_braced(rest) {
        Ok(parsed) => parsed,
        Err(_) => return Ok(None),
    };

    let mut attr = Attr::default();
    let mut rest = rest;
    let label: nom::IResult<&str, &str> = preceded(multispace0, preceded(tag("\\label"), spaced_braced))(rest);
    if let Ok((after, id)) = label {
        attr.id = id.trim().to_string();
        rest = after;
    }

    Ok(Some((Block::Header(level, attr, parse_inlines(title)?), rest)))
}

/// Paragraphs end at a blank line or at a line opening a block construct.
fn paragraph_end(input: &str) -> usize {
    let mut offset = 0usize;
    let mut first = true;

    for line in input.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if !first && (trimmed.trim().is_empty() || starts_block(trimmed)) {
            return offset;
        }
        first = false;
        offset += line.len();
    }

    input.len()
}

fn starts_block(line: &str) -> bool {
    if line.starts_with("\\begin") {
        return true;
    }
    match command_name(line) {
        Ok((_, name)) => SECTIONS.iter().any(|(n, _)| *n == name),
        Err(_) => false,
    }
}

fn parse_paragraph(text: &str) -> Result<Block> {
    let trimmed = text.trim();

    // A paragraph holding exactly one unknown command is a raw block
    if let Ok((rest, raw)) = raw_command(trimmed) {
        let native = command_name(raw)
            .map(|(_, name)| NATIVE_INLINE.contains(&name) || name == "url")
            .unwrap_or(false);
        if rest.trim().is_empty() && !native {
            return Ok(Block::RawBlock(Format::tex(), raw.to_string()));
        }
    }

    Ok(Block::Paragraph(parse_inlines(trimmed)?))
}
