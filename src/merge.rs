//! Site-wide merge of the per-page metadata records.
//!
//! [`merge`] takes the complete collection of page records at once, so it
//! cannot run before every page has been walked. Its outputs are the label
//! index and the structured-record index the renderer resolves against.

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::meta::{DocumentMeta, Record};
use crate::render::escape_html;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Fields every structured record must carry.
pub const REQUIRED_FIELDS: [&str; 4] = ["Name", "Category", "Year", "Rating"];

/// Field injected into every record naming its owning page.
pub const PAGE_FIELD: &str = "page";

/// Where a label lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub page: String,
    pub href: String,
    pub title: String,
}

/// A cross-reference target after lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    Resolved(String),
    Deferred(String),
}

/// Label id to owning page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelIndex(BTreeMap<String, LabelEntry>);

impl LabelIndex {
    pub fn get(&self, label: &str) -> Option<&LabelEntry> {
        self.0.get(label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains_key(label)
    }

    /// Look a label up; unknown labels stay deferred.
    pub fn resolve(&self, label: &str) -> RefTarget {
        match self.0.get(label) {
            Some(entry) => RefTarget::Resolved(entry.href.clone()),
            None => RefTarget::Deferred(label.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self> {
        load_json(path)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }
}

/// Record id to fields, each stamped with its page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordIndex(BTreeMap<String, Record>);

impl RecordIndex {
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.0.get(id)
    }

    /// Records ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Record)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self> {
        load_json(path)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }
}

/// Result of the merge.
#[derive(Debug, Clone, Default)]
pub struct Merged {
    pub labels: LabelIndex,
    pub records: RecordIndex,
    /// Output path of every page, sorted
    pub pages: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// Build the site indexes from all page records.
///
/// Pages are visited in source-stem order, so the first definition of a
/// duplicated label is the one from the lexicographically first page.
pub fn merge<'a>(metas: impl IntoIterator<Item = &'a DocumentMeta>) -> Merged {
    let mut metas: Vec<&DocumentMeta> = metas.into_iter().collect();
    metas.sort_by(|a, b| a.source_stem.cmp(&b.source_stem));

    let mut labels = BTreeMap::new();
    let mut owners: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut records = BTreeMap::new();

    for meta in &metas {
        let page = meta.source_stem.as_str();

        for label in &meta.labels {
            owners.entry(label.as_str()).or_default().push(page);
            labels.entry(label.clone()).or_insert_with(|| LabelEntry {
                page: page.to_string(),
                href: meta.href(label),
                title: meta
                    .section_title(label)
                    .map(str::to_string)
                    .unwrap_or_else(|| meta.display_title()),
            });
        }

        for (id, fields) in &meta.records {
            let mut record = fields.clone();
            record.insert(PAGE_FIELD.to_string(), page.to_string());
            records.insert(id.clone(), record);
        }
    }

    let mut diagnostics = Diagnostics::new();
    for (label, pages) in owners.iter().filter(|(_, pages)| pages.len() > 1) {
        diagnostics.error(
            "",
            format!("duplicate label {} defined on pages {}", label, pages.join(", ")),
        );
    }

    let labels = LabelIndex(labels);
    let records = RecordIndex(records);
    validate(&labels, &records, &mut diagnostics);

    let mut pages: Vec<String> = metas.iter().map(|m| m.output_path()).collect();
    pages.sort();
    pages.dedup();

    tracing::info!(
        pages = pages.len(),
        labels = labels.len(),
        records = records.len(),
        errors = diagnostics.error_count(),
        "merged site indexes"
    );

    Merged {
        labels,
        records,
        pages,
        diagnostics,
    }
}

/// Every record needs a label of the same id and all required fields.
fn validate(labels: &LabelIndex, records: &RecordIndex, diagnostics: &mut Diagnostics) {
    for (id, record) in records.iter() {
        let page = record.get(PAGE_FIELD).map(String::as_str).unwrap_or_default();

        if !labels.contains(id) {
            diagnostics.error(page, format!("record {} has no corresponding label", id));
        }

        for field in REQUIRED_FIELDS {
            let present = record.get(field).is_some_and(|v| !v.trim().is_empty());
            if !present {
                diagnostics.error(
                    page,
                    format!("record {} on page {} is missing required field {}", id, page, field),
                );
            }
        }
    }
}

/// XML sitemap listing every page under `base_url`, stamped with `date`.
pub fn sitemap(pages: &[String], base_url: &str, date: &str) -> String {
    let mut sorted: Vec<&String> = pages.iter().collect();
    sorted.sort();

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for page in sorted {
        xml.push_str(&format!(
            "  <url><loc>{}{}</loc><lastmod>{}</lastmod></url>\n",
            escape_html(base_url),
            escape_html(page),
            escape_html(date)
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|e| Error::io(path, e))
}
