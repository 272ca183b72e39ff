//! Reference-list formatting of bibliography entries.

use super::{Author, BibEntry};
use crate::render::escape_html;
use once_cell::sync::Lazy;
use regex::Regex;

static ARXIV_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"arxiv\.org/(?:abs|pdf)/([^\s?#]+?)(?:\.pdf)?(?:[?#]|$)").unwrap());
static ARXIV_NOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)arxiv:\s*([\w.\-/]+\w)").unwrap());

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// arXiv identifier from the explicit field, an arXiv URL or an
/// `arXiv:` mention in the note.
pub fn arxiv_id(entry: &BibEntry) -> Option<String> {
    if let Some(id) = &entry.arxiv {
        return Some(id.trim().to_string());
    }
    let from_url = entry
        .url
        .as_deref()
        .and_then(|url| ARXIV_URL.captures(url))
        .map(|c| c[1].to_string());
    from_url.or_else(|| {
        entry
            .note
            .as_deref()
            .and_then(|note| ARXIV_NOTE.captures(note))
            .map(|c| c[1].to_string())
    })
}

/// Link for the entry title: DOI, then arXiv, then the plain URL.
pub fn link_target(entry: &BibEntry) -> Option<String> {
    if let Some(doi) = &entry.doi {
        let doi = doi.trim();
        if doi.starts_with("http") {
            return Some(doi.to_string());
        }
        return Some(format!("https://doi.org/{}", doi));
    }
    if let Some(id) = arxiv_id(entry) {
        return Some(format!("https://arxiv.org/abs/{}", id));
    }
    entry.url.clone()
}

/// Full HTML for one reference-list entry.
pub fn format_entry(entry: &BibEntry) -> String {
    let mut out = String::new();

    let authors = format_authors(&entry.authors);
    if !authors.is_empty() {
        out.push_str(&escape_html(&authors));
        out.push_str(". ");
    }

    let title = escape_html(entry.title.as_deref().unwrap_or(&entry.id));
    match link_target(entry) {
        Some(href) => out.push_str(&format!("<a href=\"{}\">{}</a>. ", escape_html(&href), title)),
        None => out.push_str(&format!("{}. ", title)),
    }

    let venue = arxiv_id(entry)
        .map(|id| format!("arXiv:{}", id))
        .or_else(|| entry.container_title.clone());
    let collection = entry.collection.as_ref().or(entry.event.as_ref());

    if let Some(venue) = venue {
        out.push_str(&format!("<em>{}</em>", escape_html(&venue)));
        if let Some(volume) = &entry.volume {
            out.push_str(&format!(", {}", escape_html(volume)));
        }
        if let Some(issue) = &entry.issue {
            out.push_str(&format!("({})", escape_html(issue)));
        }
        if let Some(pages) = &entry.pages {
            out.push_str(&format!(":{}", escape_html(&page_range(pages))));
        }
        if let Some(date) = date(entry) {
            out.push_str(&format!(", {}", date));
        }
        out.push('.');
    } else if let Some(collection) = collection {
        out.push_str(&format!("In <em>{}</em>", escape_html(collection)));
        if let Some(publisher) = &entry.publisher {
            out.push_str(&format!(", {}", escape_html(publisher)));
        }
        if let Some(year) = &entry.year {
            out.push_str(&format!(", {}", escape_html(year)));
        }
        out.push('.');
    } else {
        let parts: Vec<String> = [
            entry.series.clone(),
            entry.publisher.clone(),
            entry.edition.as_ref().map(|e| format!("{} edition", e)),
            entry.year.clone(),
        ]
        .into_iter()
        .flatten()
        .map(|p| escape_html(&p))
        .collect();
        if !parts.is_empty() {
            out.push_str(&parts.join(", "));
            out.push('.');
        }
    }

    if let Some(note) = &entry.note {
        out.push(' ');
        out.push_str(&escape_html(note));
    }

    out.trim_end().to_string()
}

fn format_authors(authors: &[Author]) -> String {
    let names: Vec<String> = authors
        .iter()
        .map(Author::full_name)
        .filter(|n| !n.is_empty())
        .collect();
    match names.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{} and {}", a, b),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

fn page_range(pages: &str) -> String {
    pages.replace("--", "\u{2013}").replace('-', "\u{2013}")
}

fn date(entry: &BibEntry) -> Option<String> {
    let year = entry.year.as_deref()?;
    let month = entry
        .month
        .and_then(|m| MONTHS.get(m.checked_sub(1)? as usize).copied());
    Some(match month {
        Some(month) => format!("{} {}", month, escape_html(year)),
        None => escape_html(year),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn journal_entry() -> BibEntry {
        BibEntry {
            id: "Ale14".into(),
            authors: vec![Author::structured("Aleksandrov", "Per")],
            title: Some("Symmetric functions".into()),
            year: Some("2014".into()),
            month: Some(3),
            container_title: Some("J. Comb.".into()),
            volume: Some("12".into()),
            issue: Some("2".into()),
            pages: Some("1--20".into()),
            doi: Some("10.1000/xyz".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_journal_entry() {
        assert_eq!(
            format_entry(&journal_entry()),
            "Per Aleksandrov. <a href=\"https://doi.org/10.1000/xyz\">Symmetric functions</a>. \
             <em>J. Comb.</em>, 12(2):1\u{2013}20, March 2014."
        );
    }

    #[test]
    fn test_arxiv_replaces_venue() {
        let entry = BibEntry {
            id: "YS23".into(),
            authors: vec![Author::structured("Yang", "A"), Author::structured("Shi", "B")],
            title: Some("Flagged tableaux".into()),
            year: Some("2023".into()),
            url: Some("https://arxiv.org/abs/2301.01234".into()),
            container_title: Some("Preprint".into()),
            ..Default::default()
        };
        assert_eq!(arxiv_id(&entry).as_deref(), Some("2301.01234"));
        assert_eq!(
            format_entry(&entry),
            "A Yang and B Shi. <a href=\"https://arxiv.org/abs/2301.01234\">Flagged tableaux</a>. \
             <em>arXiv:2301.01234</em>, 2023."
        );
    }

    #[test]
    fn test_arxiv_from_note() {
        let entry = BibEntry {
            note: Some("Preprint, arXiv:1905.00001.".into()),
            ..Default::default()
        };
        assert_eq!(arxiv_id(&entry).as_deref(), Some("1905.00001"));
        assert_eq!(link_target(&entry).as_deref(), Some("https://arxiv.org/abs/1905.00001"));
    }

    #[test]
    fn test_proceedings_entry() {
        let entry = BibEntry {
            id: "p".into(),
            authors: vec![
                Author::structured("A", "X"),
                Author::structured("B", "Y"),
                Author::literal("C Z"),
            ],
            title: Some("Crystals".into()),
            collection: Some("FPSAC".into()),
            publisher: Some("DMTCS".into()),
            year: Some("2010".into()),
            note: Some("Extended <abstract>".into()),
            ..Default::default()
        };
        assert_eq!(
            format_entry(&entry),
            "X A, Y B, and C Z. Crystals. In <em>FPSAC</em>, DMTCS, 2010. Extended &lt;abstract&gt;"
        );
    }

    #[test]
    fn test_book_entry() {
        let entry = BibEntry {
            id: "mac".into(),
            authors: vec![Author::structured("Macdonald", "I. G.")],
            title: Some("Symmetric functions and Hall polynomials".into()),
            series: Some("Oxford Mathematical Monographs".into()),
            publisher: Some("Oxford University Press".into()),
            edition: Some("2nd".into()),
            year: Some("1995".into()),
            url: Some("https://example.org/mac".into()),
            ..Default::default()
        };
        assert_eq!(
            format_entry(&entry),
            "I. G. Macdonald. <a href=\"https://example.org/mac\">Symmetric functions and Hall polynomials</a>. \
             Oxford Mathematical Monographs, Oxford University Press, 2nd edition, 1995."
        );
    }
}
