//! BibTeX reader producing bibliography entries.

use super::{parse_month, Author, BibEntry};
use crate::error::{ParseError, Result};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    IResult,
};
use std::collections::{BTreeMap, HashMap};

/// Parse a BibTeX file and return a map of citation keys to entries.
///
/// Malformed entries are skipped; parsing resumes at the next `@`.
pub fn parse_bibtex(input: &str) -> Result<BTreeMap<String, BibEntry>> {
    let mut entries = BTreeMap::new();
    let mut remaining = input;
    let mut skipped = 0usize;

    while !remaining.is_empty() {
        remaining = skip_whitespace_and_comments(remaining);
        if remaining.is_empty() {
            break;
        }

        if remaining.starts_with('@') {
            match parse_entry(remaining) {
                Ok((rest, Some(entry))) => {
                    entries.insert(entry.id.clone(), entry);
                    remaining = rest;
                }
                Ok((rest, None)) => remaining = rest,
                Err(_) => {
                    skipped += 1;
                    match remaining[1..].find('@') {
                        Some(pos) => remaining = &remaining[pos + 1..],
                        None => break,
                    }
                }
            }
        } else {
            match remaining.find('@') {
                Some(pos) => remaining = &remaining[pos..],
                None => break,
            }
        }
    }

    if entries.is_empty() && skipped > 0 {
        return Err(ParseError::BibTeX(format!("{} malformed entries, none readable", skipped)).into());
    }
    if skipped > 0 {
        tracing::warn!(skipped, "skipped malformed BibTeX entries");
    }

    Ok(entries)
}

fn skip_whitespace_and_comments(input: &str) -> &str {
    let mut s = input;
    loop {
        s = s.trim_start();
        if !s.starts_with('%') {
            return s;
        }
        match s.find('\n') {
            Some(end) => s = &s[end + 1..],
            None => return "",
        }
    }
}

fn parse_entry(input: &str) -> IResult<&str, Option<BibEntry>> {
    let (input, _) = char('@')(input)?;
    let (input, entry_type) = take_while1(|c: char| c.is_alphanumeric())(input)?;
    let (input, _) = multispace0(input)?;

    let entry_type = entry_type.to_lowercase();
    if matches!(entry_type.as_str(), "comment" | "preamble" | "string") {
        let (input, _) = skip_braced_content(input)?;
        return Ok((input, None));
    }

    let (input, _) = char('{')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, key) = take_while1(|c: char| {
        c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.' | '+' | '/')
    })(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(',')(input)?;

    let (input, fields) = parse_fields(input)?;

    let (input, _) = multispace0(input)?;
    let (input, _) = char('}')(input)?;

    Ok((input, Some(build_entry(key, &entry_type, fields))))
}

fn skip_braced_content(input: &str) -> IResult<&str, ()> {
    let (input, _) = char('{')(input)?;
    let mut depth = 1;
    for (idx, c) in input.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[idx + 1..], ()));
                }
            }
            _ => {}
        }
    }
    Ok(("", ()))
}

/// Field values are kept raw; braces are only stripped once the field's
/// meaning is known, since author lists need them to spot literal names.
fn parse_fields(input: &str) -> IResult<&str, HashMap<String, String>> {
    let mut fields = HashMap::new();
    let mut remaining = input;

    loop {
        remaining = remaining.trim_start();
        if remaining.starts_with('}') || remaining.is_empty() {
            break;
        }

        match parse_field(remaining) {
            Ok((rest, (name, value))) => {
                fields.insert(name.to_lowercase(), value);
                remaining = rest.trim_start();
                if let Some(rest) = remaining.strip_prefix(',') {
                    remaining = rest;
                }
            }
            Err(_) => break,
        }
    }

    Ok((remaining, fields))
}

fn parse_field(input: &str) -> IResult<&str, (String, String)> {
    let (input, _) = multispace0(input)?;
    let (input, name) = take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char('=')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, value) = alt((parse_braced_value, parse_quoted_value, parse_bare_value))(input)?;

    Ok((input, (name.to_string(), value.to_string())))
}

fn parse_braced_value(input: &str) -> IResult<&str, &str> {
    let (input, _) = char('{')(input)?;
    let mut depth = 1;
    for (i, c) in input.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[i + 1..], &input[..i]));
                }
            }
            _ => {}
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

fn parse_quoted_value(input: &str) -> IResult<&str, &str> {
    let (input, _) = char('"')(input)?;
    let mut escape = false;
    for (i, c) in input.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' => escape = true,
            '"' => return Ok((&input[i + 1..], &input[..i])),
            _ => {}
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

/// Numbers and macro names such as `mar`.
fn parse_bare_value(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric())(input)
}

fn clean_bibtex_value(value: &str) -> String {
    // Remove braces used for capitalization, keep command groups like {\"o}
    let mut result = String::with_capacity(value.len());
    let mut depth = 0;
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'\\') {
                    result.push(c);
                    depth += 1;
                }
            }
            '}' => {
                if depth > 0 {
                    result.push(c);
                    depth -= 1;
                }
            }
            _ => result.push(c),
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn build_entry(key: &str, entry_type: &str, mut fields: HashMap<String, String>) -> BibEntry {
    let authors = fields
        .remove("author")
        .map(|v| parse_authors(&v))
        .unwrap_or_default();

    let mut take = |name: &str| {
        fields
            .remove(name)
            .map(|v| clean_bibtex_value(&v))
            .filter(|v| !v.is_empty())
    };

    let arxiv = match take("eprint") {
        Some(eprint) => Some(eprint),
        None => take("arxiv"),
    };

    BibEntry {
        id: key.to_string(),
        entry_type: entry_type.to_string(),
        authors,
        title: take("title"),
        year: take("year"),
        month: take("month").as_deref().and_then(parse_month),
        container_title: take("journal").or_else(|| take("journaltitle")),
        collection: take("booktitle"),
        event: take("eventtitle"),
        series: take("series"),
        volume: take("volume"),
        issue: take("number").or_else(|| take("issue")),
        pages: take("pages"),
        publisher: take("publisher").or_else(|| take("institution")),
        edition: take("edition"),
        doi: take("doi"),
        url: take("url"),
        arxiv,
        note: take("note"),
    }
}

/// Split a raw author field on top-level ` and `.
///
/// A name wholly wrapped in braces is a literal; `Family, Given` and
/// `Given Family` forms become structured names.
fn parse_authors(input: &str) -> Vec<Author> {
    let mut names = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    let bytes = input.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ if depth == 0 && input[i..].starts_with(" and ") => {
                names.push(&input[start..i]);
                i += 5;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    names.push(&input[start..]);

    names
        .into_iter()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(parse_author)
        .collect()
}

fn parse_author(name: &str) -> Author {
    if name.starts_with('{') && name.ends_with('}') && braces_wrap_whole(name) {
        return Author::literal(&clean_bibtex_value(name));
    }

    let name = clean_bibtex_value(name);
    if let Some((family, given)) = name.split_once(',') {
        return Author::structured(family.trim(), given.trim());
    }

    match name.rsplit_once(' ') {
        Some((given, family)) => Author::structured(family, given),
        None => Author::structured(&name, ""),
    }
}

fn braces_wrap_whole(name: &str) -> bool {
    let mut depth = 0;
    for (i, c) in name.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 && i + 1 < name.len() {
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_entry() {
        let input = r#"
@article{knuth1984,
    author = {Donald E. Knuth},
    title = {Literate Programming},
    journal = {The Computer Journal},
    year = {1984},
    month = mar,
    volume = {27},
    number = {2},
    pages = {97--111}
}
"#;

        let entries = parse_bibtex(input).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = entries.get("knuth1984").unwrap();
        assert_eq!(entry.entry_type, "article");
        assert_eq!(entry.title.as_deref(), Some("Literate Programming"));
        assert_eq!(entry.authors, vec![Author::structured("Knuth", "Donald E.")]);
        assert_eq!(entry.year.as_deref(), Some("1984"));
        assert_eq!(entry.month, Some(3));
        assert_eq!(entry.issue.as_deref(), Some("2"));
        assert_eq!(entry.container_title.as_deref(), Some("The Computer Journal"));
    }

    #[test]
    fn test_parse_author_forms() {
        let input = r#"
@book{dragon2006,
    author = {Aho, Alfred V. and Monica S. Lam and {Sage Developers} and Ullman},
    title = {Compilers},
    year = {2006}
}
"#;

        let entries = parse_bibtex(input).unwrap();
        let authors = &entries.get("dragon2006").unwrap().authors;
        assert_eq!(authors.len(), 4);
        assert_eq!(authors[0], Author::structured("Aho", "Alfred V."));
        assert_eq!(authors[1], Author::structured("Lam", "Monica S."));
        assert_eq!(authors[2], Author::literal("Sage Developers"));
        assert_eq!(authors[3].surname(), Some("Ullman"));
    }

    #[test]
    fn test_parse_with_comments_and_recovery() {
        let input = r#"
% This is a comment
@article{broken title = }
@article{test,
    title = {Test}
}
@comment{ignored}
"#;

        let entries = parse_bibtex(input).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("test"));
    }

    #[test]
    fn test_nothing_readable_is_an_error() {
        assert!(parse_bibtex("@article{broken").is_err());
        assert!(parse_bibtex("").unwrap().is_empty());
    }

    #[test]
    fn test_clean_bibtex_value() {
        assert_eq!(clean_bibtex_value("{DNA} Sequencing"), "DNA Sequencing");
        assert_eq!(clean_bibtex_value("The {Art} of\n  Programming"), "The Art of Programming");
    }
}
