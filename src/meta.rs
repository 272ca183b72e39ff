//! Per-page metadata record and the intermediate artifact written after the
//! tree walk.

use crate::ast::Block;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Field map of one structured record.
pub type Record = BTreeMap<String, String>;

/// A family or topic section defined on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSection {
    pub id: String,
    pub title: String,
    #[serde(default = "default_level")]
    pub level: u8,
}

fn default_level() -> u8 {
    2
}

/// Everything the walker learns about one page besides its rewritten tree.
///
/// Sets and maps are ordered so the serialized artifact is stable between
/// runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(rename = "sourcestem")]
    pub source_stem: String,
    #[serde(rename = "metatitle", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "metadescription", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "metakeywords", default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub citations: BTreeSet<String>,
    #[serde(default)]
    pub todos: Vec<String>,
    #[serde(rename = "families", default)]
    pub sections: Vec<PageSection>,
    #[serde(rename = "polydata", default)]
    pub records: BTreeMap<String, Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_css: Option<String>,
    /// `"<url> <visible text>"` for every link on the page
    #[serde(default)]
    pub urls: BTreeSet<String>,
}

impl DocumentMeta {
    pub fn new(source_stem: impl Into<String>) -> Self {
        Self {
            source_stem: source_stem.into(),
            ..Default::default()
        }
    }

    /// Output file name of the page.
    pub fn output_path(&self) -> String {
        format!("{}.htm", self.source_stem)
    }

    /// Link to an anchor on this page.
    pub fn href(&self, label: &str) -> String {
        format!("{}#{}", self.output_path(), label)
    }

    /// Explicit title, or the section titles joined together.
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => self.section_titles(),
        }
    }

    /// Explicit description, or one listing the page's sections.
    pub fn display_description(&self) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None if self.sections.is_empty() => String::new(),
            None => format!("Families: {}", self.section_titles()),
        }
    }

    fn section_titles(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Title of the section a label introduces, if it introduces one.
    pub fn section_title(&self, label: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.id == label)
            .map(|s| s.title.as_str())
    }

    pub fn append_css(&mut self, css: &str) {
        let rules = self.custom_css.get_or_insert_with(String::new);
        if !rules.is_empty() && !rules.ends_with('\n') {
            rules.push('\n');
        }
        rules.push_str(css);
    }
}

/// The walk result for one page as stored between stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub meta: DocumentMeta,
    pub blocks: Vec<Block>,
}

impl Artifact {
    /// Location of the artifact for a page stem.
    pub fn path_in(dir: &Path, stem: &str) -> PathBuf {
        dir.join(format!("{}.json", stem))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write `<dir>/<stem>.json`.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        let path = Self::path_in(dir, &self.meta.source_stem);
        std::fs::write(&path, self.to_json()?).map_err(|e| Error::io(&path, e))?;
        tracing::debug!(path = %path.display(), "wrote artifact");
        Ok(path)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read every `*.json` artifact in a directory, ordered by file name.
    pub fn read_dir(dir: &Path) -> Result<Vec<Self>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| Error::io(dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();
        paths.iter().map(|p| Self::read(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Attr, Inline};
    use pretty_assertions::assert_eq;

    fn sample() -> DocumentMeta {
        let mut meta = DocumentMeta::new("lie");
        meta.labels.insert("heisenbergAlgebra".into());
        meta.labels.insert("abelian".into());
        meta.sections.push(PageSection {
            id: "heisenbergAlgebra".into(),
            title: "Heisenberg algebra".into(),
            level: 2,
        });
        meta.sections.push(PageSection {
            id: "abelian".into(),
            title: "Abelian Lie algebras".into(),
            level: 2,
        });
        meta
    }

    #[test]
    fn test_synthesized_title_and_description() {
        let meta = sample();
        assert_eq!(meta.display_title(), "Heisenberg algebra, Abelian Lie algebras");
        assert_eq!(
            meta.display_description(),
            "Families: Heisenberg algebra, Abelian Lie algebras"
        );
        assert_eq!(meta.href("abelian"), "lie.htm#abelian");

        let mut titled = sample();
        titled.title = Some("Lie algebras".into());
        assert_eq!(titled.display_title(), "Lie algebras");
    }

    #[test]
    fn test_serialized_field_names() {
        let mut meta = sample();
        meta.append_css("--a: 1;");
        meta.append_css("--b: 2;");
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["sourcestem"], "lie");
        assert_eq!(json["labels"], serde_json::json!(["abelian", "heisenbergAlgebra"]));
        assert_eq!(json["custom_css"], "--a: 1;\n--b: 2;");
        assert!(json.get("metatitle").is_none());
        assert!(json["polydata"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_artifact_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact {
            meta: sample(),
            blocks: vec![Block::Header(
                2,
                Attr::with_id("abelian"),
                vec![Inline::text("Abelian")],
            )],
        };

        let path = artifact.write(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("lie.json"));
        assert_eq!(Artifact::read(&path).unwrap(), artifact);
        assert_eq!(Artifact::read_dir(dir.path()).unwrap().len(), 1);
    }
}
