//! Inline-level parsing for the LaTeX subset.

use crate::ast::{Attr, Format, Inline, MathType, Target};
use crate::error::Result;
use crate::parser::lexer::{
    braced, command_name, environment, find_unescaped, raw_command, spaced_braced, star,
};

/// Parse inline content from a string.
pub fn parse_inlines(input: &str) -> Result<Vec<Inline>> {
    let mut inlines = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() {
        if let Some((inline, rest)) = try_parse_inline(remaining)? {
            inlines.extend(inline);
            remaining = rest;
        } else {
            let (text, rest) = consume_text(remaining);
            if text.is_empty() {
                // No progress made - consume one character to avoid infinite loop
                let c = remaining.chars().next().unwrap_or_default();
                inlines.push(Inline::Text(c.to_string()));
                remaining = &remaining[c.len_utf8()..];
            } else {
                inlines.push(Inline::Text(text.to_string()));
                remaining = rest;
            }
        }
    }

    Ok(normalize(inlines))
}

fn try_parse_inline(input: &str) -> Result<Option<(Vec<Inline>, &str)>> {
    // Order matters - try more specific patterns first
    let first = match input.chars().next() {
        Some(c) => c,
        None => return Ok(None),
    };

    if first.is_whitespace() {
        let end = input
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(input.len());
        let ws = &input[..end];
        let inline = if ws.contains('\n') {
            Inline::SoftBreak
        } else {
            Inline::Space
        };
        return Ok(Some((vec![inline], &input[end..])));
    }

    match first {
        '%' => {
            let end = input.find('\n').unwrap_or(input.len());
            return Ok(Some((Vec::new(), &input[end..])));
        }
        '$' => {
            if let Some(rest) = input.strip_prefix("$$") {
                if let Some(end) = find_unescaped(rest, "$$") {
                    let math = Inline::Math(MathType::DisplayMath, rest[..end].trim().to_string());
                    return Ok(Some((vec![math], &rest[end + 2..])));
                }
            } else if let Some(end) = find_unescaped(&input[1..], "$") {
                let math = Inline::Math(MathType::InlineMath, input[1..1 + end].to_string());
                return Ok(Some((vec![math], &input[end + 2..])));
            }
        }
        '{' => {
            if let Ok((rest, inner)) = braced(input) {
                return Ok(Some((parse_inlines(inner)?, rest)));
            }
        }
        '~' => return Ok(Some((vec![Inline::text("\u{a0}")], &input[1..]))),
        '-' if input.starts_with("---") => {
            return Ok(Some((vec![Inline::text("\u{2014}")], &input[3..])));
        }
        '-' if input.starts_with("--") => {
            return Ok(Some((vec![Inline::text("\u{2013}")], &input[2..])));
        }
        '`' if input.starts_with("``") => {
            return Ok(Some((vec![Inline::text("\u{201c}")], &input[2..])));
        }
        '\'' if input.starts_with("''") => {
            return Ok(Some((vec![Inline::text("\u{201d}")], &input[2..])));
        }
        '\\' => return try_parse_backslash(input),
        _ => {}
    }

    Ok(None)
}

fn try_parse_backslash(input: &str) -> Result<Option<(Vec<Inline>, &str)>> {
    let after = &input[1..];

    // Math delimiters
    for (open, close, kind) in [
        ("(", "\\)", MathType::InlineMath),
        ("[", "\\]", MathType::DisplayMath),
    ] {
        if let Some(body) = after.strip_prefix(open) {
            if let Some(end) = body.find(close) {
                let math = Inline::Math(kind, body[..end].trim().to_string());
                return Ok(Some((vec![math], &body[end + close.len()..])));
            }
        }
    }

    // Line break
    if let Some(rest) = after.strip_prefix('\\') {
        return Ok(Some((vec![Inline::LineBreak], rest)));
    }

    // Escaped specials
    if let Some(c) = after.chars().next() {
        if "%&_#${}".contains(c) {
            return Ok(Some((vec![Inline::Text(c.to_string())], &after[c.len_utf8()..])));
        }
        if c == ' ' || c == ',' {
            return Ok(Some((vec![Inline::Space], &after[1..])));
        }
    }

    // Environments inside running text stay raw
    if input.starts_with("\\begin") {
        if let Ok((rest, env)) = environment(input) {
            let inline = match env.name {
                "math" => Inline::Math(MathType::InlineMath, env.body.trim().to_string()),
                "equation" | "equation*" | "displaymath" => {
                    Inline::Math(MathType::DisplayMath, env.body.trim().to_string())
                }
                _ => Inline::RawInline(Format::tex(), env.source.to_string()),
            };
            return Ok(Some((vec![inline], rest)));
        }
    }

    if let Some(parsed) = try_parse_native_command(input)? {
        return Ok(Some(parsed));
    }

    // Anything else is passed through for the rewriter
    if let Ok((rest, raw)) = raw_command(input) {
        let inline = Inline::RawInline(Format::tex(), raw.to_string());
        return Ok(Some((vec![inline], rest)));
    }

    Ok(None)
}

/// Commands with a direct AST counterpart.
fn try_parse_native_command(input: &str) -> Result<Option<(Vec<Inline>, &str)>> {
    let (rest, name) = match command_name(input) {
        Ok(parsed) => parsed,
        Err(_) => return Ok(None),
    };
    let (rest, starred) = star(rest).unwrap_or((rest, false));
    if starred {
        return Ok(None);
    }

    match name {
        "emph" | "textit" | "textsl" => wrap_argument(rest, Inline::Emphasis),
        "textbf" => wrap_argument(rest, Inline::Strong),
        "textsc" => wrap_argument(rest, Inline::SmallCaps),
        "underline" => wrap_argument(rest, Inline::Underline),
        "sout" => wrap_argument(rest, Inline::Strikeout),
        "textsuperscript" => wrap_argument(rest, Inline::Superscript),
        "textsubscript" => wrap_argument(rest, Inline::Subscript),
        "texttt" => match spaced_braced(rest) {
            Ok((rest, arg)) => Ok(Some((vec![Inline::Code(Attr::default(), arg.to_string())], rest))),
            Err(_) => Ok(None),
        },
        "url" => match spaced_braced(rest) {
            Ok((rest, url)) => {
                let link = Inline::Link(
                    Attr::with_classes(["uri"]),
                    vec![Inline::text(url)],
                    Target::new(url, ""),
                );
                Ok(Some((vec![link], rest)))
            }
            Err(_) => Ok(None),
        },
        "href" => {
            let parsed = spaced_braced(rest).and_then(|(rest, url)| {
                spaced_braced(rest).map(|(rest, text)| (rest, url, text))
            });
            match parsed {
                Ok((rest, url, text)) => {
                    let link = Inline::Link(Attr::default(), parse_inlines(text)?, Target::new(url, ""));
                    Ok(Some((vec![link], rest)))
                }
                Err(_) => Ok(None),
            }
        }
        _ => Ok(None),
    }
}

fn wrap_argument(
    input: &str,
    wrap: fn(Vec<Inline>) -> Inline,
) -> Result<Option<(Vec<Inline>, &str)>> {
    match spaced_braced(input) {
        Ok((rest, arg)) => Ok(Some((vec![wrap(parse_inlines(arg)?)], rest))),
        Err(_) => Ok(None),
    }
}

fn consume_text(input: &str) -> (&str, &str) {
    let end = input
        .char_indices()
        .skip(1)
        .find(|&(i, c)| is_special(c) || starts_special(&input[i..]))
        .map(|(i, _)| i)
        .unwrap_or(input.len());

    // The first character is never special here, `try_parse_inline` declined it
    (&input[..end], &input[end..])
}

fn is_special(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\\' | '$' | '{' | '}' | '~' | '%')
}

fn starts_special(s: &str) -> bool {
    s.starts_with("--") || s.starts_with("``") || s.starts_with("''")
}

/// Merge adjacent text runs.
fn normalize(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut result: Vec<Inline> = Vec::with_capacity(inlines.len());

    for inline in inlines {
        match (result.last_mut(), inline) {
            (Some(Inline::Text(prev)), Inline::Text(next)) => prev.push_str(&next),
            (Some(Inline::Space), Inline::Space) => {}
            (_, inline) => result.push(inline),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_words_and_spaces() {
        let inlines = parse_inlines("Schur  polynomials\nare nice").unwrap();
        assert_eq!(
            inlines,
            vec![
                Inline::text("Schur"),
                Inline::Space,
                Inline::text("polynomials"),
                Inline::SoftBreak,
                Inline::text("are"),
                Inline::Space,
                Inline::text("nice"),
            ]
        );
    }

    #[test]
    fn test_math() {
        let inlines = parse_inlines("Let $s_\\lambda$ and \\[x\\]").unwrap();
        assert_eq!(inlines[2], Inline::Math(MathType::InlineMath, "s_\\lambda".into()));
        assert_eq!(inlines[6], Inline::Math(MathType::DisplayMath, "x".into()));
    }

    #[test]
    fn test_native_commands() {
        let inlines = parse_inlines("\\emph{very} \\textbf{bold} \\href{https://a.b}{site}").unwrap();
        assert_eq!(inlines[0], Inline::Emphasis(vec![Inline::text("very")]));
        assert_eq!(inlines[2], Inline::Strong(vec![Inline::text("bold")]));
        assert_eq!(
            inlines[4],
            Inline::Link(Attr::default(), vec![Inline::text("site")], Target::new("https://a.b", ""))
        );
    }

    #[test]
    fn test_unknown_command_is_raw() {
        let inlines = parse_inlines("see \\cite[p. 2]{Ale14}.").unwrap();
        assert_eq!(
            inlines,
            vec![
                Inline::text("see"),
                Inline::Space,
                Inline::RawInline(Format::tex(), "\\cite[p. 2]{Ale14}".into()),
                Inline::text("."),
            ]
        );
    }

    #[test]
    fn test_dashes_and_escapes() {
        let inlines = parse_inlines("1--2 \\& 50\\% well-known").unwrap();
        assert_eq!(inlines[0], Inline::text("1\u{2013}2"));
        assert_eq!(inlines[2], Inline::text("&"));
        assert_eq!(inlines[4], Inline::text("50%"));
        assert_eq!(inlines[6], Inline::text("well-known"));
    }

    #[test]
    fn test_unbalanced_group_is_text() {
        let inlines = parse_inlines("\\cite{abc").unwrap();
        assert_eq!(
            inlines,
            vec![
                Inline::RawInline(Format::tex(), "\\cite".into()),
                Inline::text("{abc"),
            ]
        );
    }
}
