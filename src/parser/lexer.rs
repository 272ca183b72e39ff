//! nom combinators for the pieces of LaTeX syntax both the reader and the
//! macro pattern matcher need: command names, balanced argument groups and
//! environments.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt, recognize},
    error::{Error, ErrorKind},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
};

fn fail<T>(input: &str, kind: ErrorKind) -> IResult<&str, T> {
    Err(nom::Err::Error(Error::new(input, kind)))
}

/// Parse a control word (`\name`) and return the name without the backslash.
pub fn command_name(input: &str) -> IResult<&str, &str> {
    preceded(char('\\'), take_while1(|c: char| c.is_ascii_alphabetic()))(input)
}

/// Parse an optional star after a command or environment name.
pub fn star(input: &str) -> IResult<&str, bool> {
    map(opt(char('*')), |s| s.is_some())(input)
}

/// Parse a `{...}` group with balanced braces and return its contents.
///
/// Escaped braces (`\{`, `\}`) do not count towards the nesting depth.
pub fn braced(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('{') {
        return fail(input, ErrorKind::Char);
    }

    let mut depth = 0usize;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[i + 1..], &input[1..i]));
                }
            }
            _ => {}
        }
    }

    // Unmatched brace
    fail(input, ErrorKind::TakeUntil)
}

/// Parse a `[...]` optional argument and return its contents.
///
/// Brackets inside a braced group do not close the argument.
pub fn bracketed(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('[') {
        return fail(input, ErrorKind::Char);
    }

    let mut brackets = 0usize;
    let mut braces = 0usize;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => braces += 1,
            '}' => braces = braces.saturating_sub(1),
            '[' if braces == 0 => brackets += 1,
            ']' if braces == 0 => {
                brackets -= 1;
                if brackets == 0 {
                    return Ok((&input[i + 1..], &input[1..i]));
                }
            }
            _ => {}
        }
    }

    fail(input, ErrorKind::TakeUntil)
}

/// A braced argument, possibly preceded by whitespace.
pub fn spaced_braced(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, braced)(input)
}

/// An optional argument, possibly preceded by whitespace.
pub fn spaced_bracketed(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, bracketed)(input)
}

/// Recognize a command together with every argument group directly
/// following it, e.g. `\cite[p. 3]{Ale14}`.
pub fn raw_command(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        pair(command_name, star),
        many0(alt((
            recognize(bracketed),
            recognize(braced),
        ))),
    ))(input)
}

/// Parse `\begin{name}` and return the name (including a trailing `*`).
pub fn begin_environment(input: &str) -> IResult<&str, &str> {
    preceded(
        tag("\\begin"),
        delimited(
            pair(multispace0, char('{')),
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '*'),
            char('}'),
        ),
    )(input)
}

/// A complete `\begin{name} ... \end{name}` environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment<'a> {
    /// Environment name, including a trailing `*` for starred variants
    pub name: &'a str,
    /// Everything between `\begin{name}` and the matching `\end{name}`
    pub body: &'a str,
    /// The environment's full source text
    pub source: &'a str,
}

/// Parse an environment, matching nested environments of the same name.
pub fn environment(input: &str) -> IResult<&str, Environment<'_>> {
    let (rest, name) = begin_environment(input)?;
    let begin = format!("\\begin{{{}}}", name);
    let end = format!("\\end{{{}}}", name);

    let mut depth = 1usize;
    let mut pos = 0usize;

    loop {
        let next_end = match rest[pos..].find(&end) {
            Some(e) => e,
            None => return fail(input, ErrorKind::TakeUntil),
        };

        match rest[pos..].find(&begin) {
            Some(b) if b < next_end => {
                depth += 1;
                pos += b + begin.len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    let body = &rest[..pos + next_end];
                    let after = &rest[pos + next_end + end.len()..];
                    let source = &input[..input.len() - after.len()];
                    return Ok((after, Environment { name, body, source }));
                }
                pos += next_end + end.len();
            }
        }
    }
}

/// Find `delimiter` in `input`, skipping escaped occurrences.
pub fn find_unescaped(input: &str, delimiter: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' && !delimiter.starts_with('\\') {
            escaped = true;
            continue;
        }
        if input[i..].starts_with(delimiter) {
            return Some(i);
        }
    }
    None
}

/// Split `input` on `separator` at brace depth zero.
pub fn split_top_level<'a>(input: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut escaped = false;
    let mut start = 0usize;

    let mut iter = input.char_indices();
    while let Some((i, c)) = iter.next() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ if depth == 0 && input[i..].starts_with(separator) => {
                parts.push(&input[start..i]);
                start = i + separator.len();
                // Skip the rest of a multi-char separator
                for _ in 1..separator.chars().count() {
                    iter.next();
                }
                continue;
            }
            '\\' => escaped = true,
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}
