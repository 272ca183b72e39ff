//! Bibliography database, display labels and formatted entries.
//!
//! The database is loaded once per process and only read afterwards, so a
//! shared reference can be handed to every worker thread.

mod bibtex;
mod format;
mod label;

pub use bibtex::parse_bibtex;
pub use format::{arxiv_id, format_entry, link_target};
pub use label::{display_label, fold_ascii};

use crate::error::{ResolutionError, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// One author: either a structured name or a literal one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Author {
    #[serde(default, deserialize_with = "lenient_string")]
    pub family: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub given: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub literal: Option<String>,
}

impl Author {
    pub fn structured(family: &str, given: &str) -> Self {
        Self {
            family: Some(family.to_string()),
            given: Some(given.to_string()).filter(|g| !g.is_empty()),
            literal: None,
        }
    }

    pub fn literal(name: &str) -> Self {
        Self {
            literal: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// Family name, or the last word of a literal name.
    pub fn surname(&self) -> Option<&str> {
        match (&self.family, &self.literal) {
            (Some(family), _) => Some(family.as_str()),
            (None, Some(literal)) => literal.split_whitespace().last(),
            (None, None) => None,
        }
    }

    /// Name as printed in a reference list.
    pub fn full_name(&self) -> String {
        match (&self.given, &self.family, &self.literal) {
            (Some(given), Some(family), _) => format!("{} {}", given, family),
            (None, Some(family), _) => family.clone(),
            (_, None, Some(literal)) => literal.clone(),
            _ => String::new(),
        }
    }
}

/// A bibliography entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BibEntry {
    pub id: String,
    pub entry_type: String,
    pub authors: Vec<Author>,
    pub title: Option<String>,
    pub year: Option<String>,
    pub month: Option<u32>,
    /// Journal or venue
    pub container_title: Option<String>,
    /// Proceedings or collection title
    pub collection: Option<String>,
    pub event: Option<String>,
    pub series: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub publisher: Option<String>,
    pub edition: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub arxiv: Option<String>,
    pub note: Option<String>,
}

/// All entries of a citation database, keyed by citation id.
#[derive(Debug, Clone, Default)]
pub struct Bibliography {
    entries: BTreeMap<String, BibEntry>,
}

impl Bibliography {
    pub fn new(entries: impl IntoIterator<Item = BibEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    /// Load a database file: BibTeX for `.bib`, CSL-JSON otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ResolutionError::BibliographyRead(format!("{}: {}", path.display(), e))
        })?;

        let bibliography = if path.extension().is_some_and(|ext| ext == "bib") {
            Self {
                entries: parse_bibtex(&content).map_err(|e| {
                    ResolutionError::BibliographyFormat(format!("{}: {}", path.display(), e))
                })?,
            }
        } else {
            Self::from_json(&content).map_err(|e| {
                ResolutionError::BibliographyFormat(format!("{}: {}", path.display(), e))
            })?
        };

        tracing::info!(path = %path.display(), entries = bibliography.len(), "loaded bibliography");
        Ok(bibliography)
    }

    /// Parse a CSL-JSON array, or an object keyed by citation id.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let raw: RawDatabase = serde_json::from_str(json)?;
        let entries = match raw {
            RawDatabase::List(list) => list.into_iter().map(RawEntry::into_entry).collect(),
            RawDatabase::Map(map) => map
                .into_iter()
                .map(|(id, mut raw)| {
                    if raw.id.is_none() {
                        raw.id = Some(id);
                    }
                    raw.into_entry()
                })
                .collect(),
        };
        Ok(Self { entries })
    }

    pub fn get(&self, id: &str) -> Option<&BibEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Short bracket label for a citation id, if the id is known.
    pub fn label(&self, id: &str) -> Option<String> {
        self.get(id).map(display_label)
    }

    /// Full reference-list HTML for a citation id, if the id is known.
    pub fn format(&self, id: &str) -> Option<String> {
        self.get(id).map(format_entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDatabase {
    List(Vec<RawEntry>),
    Map(BTreeMap<String, RawEntry>),
}

/// CSL-JSON entry as found on disk.
#[derive(Deserialize, Default)]
struct RawEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    entry_type: Option<String>,
    #[serde(default)]
    author: Vec<Author>,
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default)]
    issued: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    year: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    month: Option<String>,
    #[serde(default, rename = "container-title", deserialize_with = "lenient_string")]
    container_title: Option<String>,
    #[serde(default, rename = "collection-title", alias = "booktitle", deserialize_with = "lenient_string")]
    collection: Option<String>,
    #[serde(default, alias = "event-title", deserialize_with = "lenient_string")]
    event: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    series: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    volume: Option<String>,
    #[serde(default, alias = "number", deserialize_with = "lenient_string")]
    issue: Option<String>,
    #[serde(default, alias = "pages", deserialize_with = "lenient_string")]
    page: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    publisher: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    edition: Option<String>,
    #[serde(default, rename = "DOI", alias = "doi", deserialize_with = "lenient_string")]
    doi: Option<String>,
    #[serde(default, rename = "URL", alias = "url", deserialize_with = "lenient_string")]
    url: Option<String>,
    #[serde(default, alias = "eprint", deserialize_with = "lenient_string")]
    arxiv: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    note: Option<String>,
}

impl RawEntry {
    fn into_entry(self) -> (String, BibEntry) {
        let (issued_year, issued_month) = self.issued.as_ref().map(parse_issued).unwrap_or_default();
        let id = self.id.unwrap_or_default();
        let entry = BibEntry {
            id: id.clone(),
            entry_type: self.entry_type.unwrap_or_default(),
            authors: self.author,
            title: self.title,
            year: issued_year.or(self.year),
            month: issued_month.or_else(|| self.month.as_deref().and_then(parse_month)),
            container_title: self.container_title,
            collection: self.collection,
            event: self.event,
            series: self.series,
            volume: self.volume,
            issue: self.issue,
            pages: self.page,
            publisher: self.publisher,
            edition: self.edition,
            doi: self.doi,
            url: self.url,
            arxiv: self.arxiv,
            note: self.note,
        };
        (id, entry)
    }
}

/// Year and month from a CSL `issued` value (`date-parts`, `raw` or `literal`).
fn parse_issued(issued: &Value) -> (Option<String>, Option<u32>) {
    if let Some(parts) = issued
        .get("date-parts")
        .and_then(|p| p.get(0))
        .and_then(Value::as_array)
    {
        let year = parts.first().and_then(scalar_to_string);
        let month = parts
            .get(1)
            .and_then(scalar_to_string)
            .and_then(|m| m.parse().ok());
        return (year, month);
    }

    let text = issued
        .get("raw")
        .or_else(|| issued.get("literal"))
        .and_then(Value::as_str)
        .or_else(|| issued.as_str());
    (text.map(|t| t.trim().to_string()), None)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Month number from `3`, `mar` or `March`.
pub(crate) fn parse_month(month: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let month = month.trim();
    if let Ok(n) = month.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let lower = month.to_lowercase();
    MONTHS
        .iter()
        .position(|m| lower.starts_with(m))
        .map(|i| i as u32 + 1)
}

/// Accept strings and numbers, treat blanks as absent.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(scalar_to_string)
        .filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CSL: &str = r#"[
        {
            "id": "Ale14",
            "type": "article-journal",
            "author": [{"family": "Aleksandrov", "given": "Per"}],
            "title": "Some title",
            "issued": {"date-parts": [[2014, 3]]},
            "container-title": "J. Comb.",
            "volume": 12,
            "page": "1-20"
        },
        {
            "id": "consortium",
            "author": [{"literal": "The Sage Developers"}],
            "year": "2020"
        }
    ]"#;

    #[test]
    fn test_load_csl_array() {
        let bib = Bibliography::from_json(CSL).unwrap();
        assert_eq!(bib.len(), 2);

        let entry = bib.get("Ale14").unwrap();
        assert_eq!(entry.year.as_deref(), Some("2014"));
        assert_eq!(entry.month, Some(3));
        assert_eq!(entry.volume.as_deref(), Some("12"));
        assert_eq!(entry.pages.as_deref(), Some("1-20"));
        assert_eq!(entry.authors[0].surname(), Some("Aleksandrov"));

        let literal = bib.get("consortium").unwrap();
        assert_eq!(literal.authors[0].surname(), Some("Developers"));
        assert_eq!(literal.year.as_deref(), Some("2020"));
    }

    #[test]
    fn test_load_csl_map() {
        let json = r#"{"YS23": {"author": [{"family": "Yang"}, {"family": "Shi"}], "issued": {"raw": "2023"}}}"#;
        let bib = Bibliography::from_json(json).unwrap();
        assert_eq!(bib.get("YS23").unwrap().id, "YS23");
        assert_eq!(bib.label("YS23").as_deref(), Some("YS23"));
        assert_eq!(bib.label("missing"), None);
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("refs.json");
        std::fs::write(&json, CSL).unwrap();
        assert_eq!(Bibliography::load(&json).unwrap().len(), 2);

        let bib = dir.path().join("refs.bib");
        std::fs::write(&bib, "@article{knuth1984, author = {Knuth, Donald E.}, year = {1984}}").unwrap();
        assert_eq!(Bibliography::load(&bib).unwrap().label("knuth1984").as_deref(), Some("Knu84"));

        assert!(Bibliography::load(dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("3"), Some(3));
        assert_eq!(parse_month("March"), Some(3));
        assert_eq!(parse_month("dec"), Some(12));
        assert_eq!(parse_month("13"), None);
    }
}
