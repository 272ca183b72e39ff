//! Site configuration.
//!
//! Values come from an optional `symcat.toml` and are then overridden by
//! `SYMCAT_*` environment variables. Relative paths are taken as given, so
//! they resolve against the working directory of the build.

use crate::error::{ConfigError, Error, Result};
use crate::parser::{LatexReader, PandocReader, TexReader};
use crate::render::MathBackend;
use chrono::{DateTime, Local, NaiveDate};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "symcat.toml";

/// Which parser turns LaTeX into the document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderKind {
    #[default]
    Builtin,
    Pandoc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    /// Directory scanned for `.tex` sources
    pub source_dir: PathBuf,
    /// Per-page artifacts between the walk and render stages
    pub intermediate_dir: PathBuf,
    pub bibliography: Option<PathBuf>,
    pub label_index: PathBuf,
    pub record_index: PathBuf,
    /// Page template; the built-in one when unset
    pub template: Option<PathBuf>,
    pub site_dir: PathBuf,
    /// Fixed date for `lastmod` stamps instead of today
    pub source_timestamp: Option<String>,
    /// Prefix for sitemap locations
    pub base_url: String,
    pub math: MathBackend,
    pub reader: ReaderKind,
    pub pandoc: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("tex"),
            intermediate_dir: PathBuf::from("build/intermediate"),
            bibliography: None,
            label_index: PathBuf::from("build/labels.json"),
            record_index: PathBuf::from("build/polydata.json"),
            template: None,
            site_dir: PathBuf::from("site"),
            source_timestamp: None,
            base_url: String::new(),
            math: MathBackend::default(),
            reader: ReaderKind::default(),
            pandoc: PathBuf::from("pandoc"),
        }
    }
}

/// `symcat.toml` as written; every key is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    source_dir: Option<PathBuf>,
    intermediate_dir: Option<PathBuf>,
    bibliography: Option<PathBuf>,
    label_index: Option<PathBuf>,
    record_index: Option<PathBuf>,
    template: Option<PathBuf>,
    site_dir: Option<PathBuf>,
    source_timestamp: Option<String>,
    base_url: Option<String>,
    math: Option<MathBackend>,
    reader: Option<ReaderKind>,
    pandoc: Option<PathBuf>,
}

impl SiteConfig {
    /// Load `path`, or `symcat.toml` when present, then apply the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let default_path = Path::new(CONFIG_FILE);
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if default_path.is_file() => Self::from_file(default_path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            Error::Config(ConfigError::File { message, .. }) => ConfigError::File {
                path: path.display().to_string(),
                message,
            }
            .into(),
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| ConfigError::File {
            path: CONFIG_FILE.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            source_dir: raw.source_dir.unwrap_or(defaults.source_dir),
            intermediate_dir: raw.intermediate_dir.unwrap_or(defaults.intermediate_dir),
            bibliography: raw.bibliography,
            label_index: raw.label_index.unwrap_or(defaults.label_index),
            record_index: raw.record_index.unwrap_or(defaults.record_index),
            template: raw.template,
            site_dir: raw.site_dir.unwrap_or(defaults.site_dir),
            source_timestamp: raw.source_timestamp,
            base_url: raw.base_url.unwrap_or(defaults.base_url),
            math: raw.math.unwrap_or(defaults.math),
            reader: raw.reader.unwrap_or(defaults.reader),
            pandoc: raw.pandoc.unwrap_or(defaults.pandoc),
        }
    }

    /// Override values from `SYMCAT_*` variables found by `lookup`. Empty
    /// values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("SYMCAT_INTERMEDIATE_DIR") {
            self.intermediate_dir = v.into();
        }
        if let Some(v) = var("SYMCAT_BIBLIOGRAPHY") {
            self.bibliography = Some(v.into());
        }
        if let Some(v) = var("SYMCAT_LABEL_INDEX") {
            self.label_index = v.into();
        }
        if let Some(v) = var("SYMCAT_RECORD_INDEX") {
            self.record_index = v.into();
        }
        if let Some(v) = var("SYMCAT_TEMPLATE") {
            self.template = Some(v.into());
        }
        if let Some(v) = var("SYMCAT_SITE_DIR") {
            self.site_dir = v.into();
        }
        if let Some(v) = var("SYMCAT_SOURCE_TIMESTAMP") {
            self.source_timestamp = Some(v);
        }
        if let Some(v) = var("SYMCAT_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = var("SYMCAT_MATH") {
            self.math = v.parse()?;
        }
        Ok(())
    }

    /// The parser selected by the configuration.
    pub fn reader(&self) -> Box<dyn TexReader> {
        match self.reader {
            ReaderKind::Builtin => Box::new(LatexReader),
            ReaderKind::Pandoc => Box::new(PandocReader::new(&self.pandoc)),
        }
    }

    /// Date stamped on pages and sitemap entries, as `YYYY-MM-DD`.
    ///
    /// The source timestamp may be Unix seconds, a date or an RFC 3339
    /// timestamp; without one, today's local date is used.
    pub fn lastmod(&self) -> Result<String> {
        let raw = match self.source_timestamp.as_deref().map(str::trim) {
            Some(raw) => raw,
            None => return Ok(Local::now().format("%Y-%m-%d").to_string()),
        };

        let date = if let Ok(seconds) = raw.parse::<i64>() {
            DateTime::from_timestamp(seconds, 0).map(|t| t.date_naive())
        } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Some(date)
        } else {
            DateTime::parse_from_rfc3339(raw).ok().map(|t| t.date_naive())
        };

        date.map(|d| d.format("%Y-%m-%d").to_string()).ok_or_else(|| {
            ConfigError::Value {
                name: "SYMCAT_SOURCE_TIMESTAMP".to_string(),
                message: format!("cannot read {:?} as a date", raw),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_toml_keys() {
        let config = SiteConfig::from_toml(
            r#"
source-dir = "catalog"
bibliography = "refs.json"
site-dir = "public"
math = "mathjax"
reader = "pandoc"
base-url = "https://example.org/"
"#,
        )
        .unwrap();

        assert_eq!(config.source_dir, PathBuf::from("catalog"));
        assert_eq!(config.bibliography, Some(PathBuf::from("refs.json")));
        assert_eq!(config.site_dir, PathBuf::from("public"));
        assert_eq!(config.math, MathBackend::MathJax);
        assert_eq!(config.reader, ReaderKind::Pandoc);
        assert_eq!(config.base_url, "https://example.org/");
        assert_eq!(config.intermediate_dir, SiteConfig::default().intermediate_dir);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            SiteConfig::from_toml("math = 3"),
            Err(Error::Config(ConfigError::File { .. }))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let env = HashMap::from([
            ("SYMCAT_INTERMEDIATE_DIR", "/tmp/inter"),
            ("SYMCAT_BIBLIOGRAPHY", "db.bib"),
            ("SYMCAT_TEMPLATE", "page.html"),
            ("SYMCAT_SITE_DIR", ""),
            ("SYMCAT_MATH", "mathml"),
        ]);
        let mut config = SiteConfig::default();
        config
            .apply_env(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.intermediate_dir, PathBuf::from("/tmp/inter"));
        assert_eq!(config.bibliography, Some(PathBuf::from("db.bib")));
        assert_eq!(config.template, Some(PathBuf::from("page.html")));
        assert_eq!(config.site_dir, PathBuf::from("site"));
        assert_eq!(config.math, MathBackend::MathML);
    }

    #[test]
    fn test_bad_math_override() {
        let mut config = SiteConfig::default();
        let result = config.apply_env(|name| (name == "SYMCAT_MATH").then(|| "gif".to_string()));
        assert!(matches!(result, Err(Error::Config(ConfigError::Value { .. }))));
    }

    #[test]
    fn test_lastmod_forms() {
        let mut config = SiteConfig::default();
        for (raw, expected) in [
            ("1714521600", "2024-05-01"),
            ("2024-05-01", "2024-05-01"),
            ("2024-05-01T23:30:00+00:00", "2024-05-01"),
        ] {
            config.source_timestamp = Some(raw.to_string());
            assert_eq!(config.lastmod().unwrap(), expected);
        }

        config.source_timestamp = Some("yesterday".into());
        assert!(config.lastmod().is_err());

        config.source_timestamp = None;
        assert_eq!(config.lastmod().unwrap().len(), 10);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symcat.toml");
        std::fs::write(&path, "label-index = \"idx/labels.json\"\n").unwrap();
        let config = SiteConfig::from_file(&path).unwrap();
        assert_eq!(config.label_index, PathBuf::from("idx/labels.json"));

        std::fs::write(&path, "label-index = [").unwrap();
        let err = SiteConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains(&path.display().to_string()));
    }
}
