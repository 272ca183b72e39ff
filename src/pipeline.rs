//! Stage orchestration.
//!
//! `walk` and `render` process files independently on the rayon pool.
//! `merge` is the barrier between them: it reads every artifact the walk
//! produced and writes the site indexes rendering depends on. Each stage
//! communicates with the next only through files, so the stages can also
//! run as separate invocations.

use crate::bibliography::Bibliography;
use crate::config::SiteConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, ResolutionError, Result};
use crate::merge::{merge, sitemap, LabelIndex, RecordIndex};
use crate::meta::Artifact;
use crate::parser::{preprocess, TexReader};
use crate::render::{render_page, RenderContext, Template};
use crate::resolve::Walker;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Counts of what a run did and what it found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub files: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl BuildReport {
    fn from_diagnostics(files: usize, diagnostics: &Diagnostics) -> Self {
        Self {
            files,
            warnings: diagnostics.warning_count(),
            errors: diagnostics.error_count(),
        }
    }

    /// Add the counts of a later stage.
    pub fn absorb(&mut self, other: BuildReport) {
        self.files = self.files.max(other.files);
        self.warnings += other.warnings;
        self.errors += other.errors;
    }

    /// Process exit status: 1 when any content error was reported.
    pub fn exit_code(&self) -> i32 {
        if self.errors > 0 {
            1
        } else {
            0
        }
    }
}

/// The configured pipeline with its shared, read-only inputs.
pub struct Pipeline<'a> {
    config: &'a SiteConfig,
    reader: Box<dyn TexReader>,
    bibliography: Bibliography,
}

impl<'a> Pipeline<'a> {
    /// Set up from configuration, loading the bibliography if one is
    /// configured.
    pub fn new(config: &'a SiteConfig) -> Result<Self> {
        let bibliography = match &config.bibliography {
            Some(path) => Bibliography::load(path)?,
            None => {
                tracing::info!("no bibliography configured, every citation will be undefined");
                Bibliography::default()
            }
        };
        Ok(Self::with_parts(config, config.reader(), bibliography))
    }

    pub fn with_parts(config: &'a SiteConfig, reader: Box<dyn TexReader>, bibliography: Bibliography) -> Self {
        Self {
            config,
            reader,
            bibliography,
        }
    }

    /// Walk every source in the configured source directory, merge, render.
    pub fn build(&self) -> Result<BuildReport> {
        let sources = discover_sources(&self.config.source_dir)?;
        let mut report = self.walk(&sources)?;
        report.absorb(self.merge()?);
        report.absorb(self.render()?);
        tracing::info!(
            files = report.files,
            warnings = report.warnings,
            errors = report.errors,
            "build finished"
        );
        Ok(report)
    }

    /// Pass 1: rewrite each source and write its artifact.
    pub fn walk(&self, sources: &[PathBuf]) -> Result<BuildReport> {
        let reader: &dyn TexReader = self.reader.as_ref();
        let per_file = sources
            .par_iter()
            .map(|path| {
                let (artifact, diagnostics) = walk_source(path, reader, &self.bibliography)?;
                artifact.write(&self.config.intermediate_dir)?;
                Ok(diagnostics)
            })
            .collect::<Result<Vec<Diagnostics>>>()?;

        let mut diagnostics = Diagnostics::new();
        for d in per_file {
            diagnostics.extend(d);
        }
        tracing::info!(
            files = sources.len(),
            warnings = diagnostics.warning_count(),
            errors = diagnostics.error_count(),
            "walk finished"
        );
        Ok(BuildReport::from_diagnostics(sources.len(), &diagnostics))
    }

    /// The barrier: build and validate the site indexes from all artifacts.
    pub fn merge(&self) -> Result<BuildReport> {
        let artifacts = read_artifacts(&self.config.intermediate_dir)?;
        let merged = merge(artifacts.iter().map(|a| &a.meta));

        merged.labels.write(&self.config.label_index)?;
        merged.records.write(&self.config.record_index)?;

        let site_dir = &self.config.site_dir;
        std::fs::create_dir_all(site_dir).map_err(|e| Error::io(site_dir, e))?;
        let xml = sitemap(&merged.pages, &self.config.base_url, &self.config.lastmod()?);
        let sitemap_path = site_dir.join("sitemap.xml");
        std::fs::write(&sitemap_path, xml).map_err(|e| Error::io(&sitemap_path, e))?;

        Ok(BuildReport::from_diagnostics(artifacts.len(), &merged.diagnostics))
    }

    /// Pass 2: render every artifact against the merged indexes.
    pub fn render(&self) -> Result<BuildReport> {
        let artifacts = read_artifacts(&self.config.intermediate_dir)?;
        let labels = LabelIndex::load(&self.config.label_index)?;
        let records = RecordIndex::load(&self.config.record_index)?;
        let template = match &self.config.template {
            Some(path) => Template::load(path)?,
            None => Template::default(),
        };
        let lastmod = self.config.lastmod()?;

        let ctx = RenderContext {
            labels: &labels,
            records: &records,
            bibliography: &self.bibliography,
            template: &template,
            math: self.config.math,
            lastmod: &lastmod,
        };

        let site_dir = &self.config.site_dir;
        std::fs::create_dir_all(site_dir).map_err(|e| Error::io(site_dir, e))?;

        let per_page = artifacts
            .par_iter()
            .map(|artifact| {
                let page = render_page(artifact, &ctx)?;
                let path = site_dir.join(&page.path);
                std::fs::write(&path, &page.html).map_err(|e| Error::io(&path, e))?;
                Ok(page.diagnostics)
            })
            .collect::<Result<Vec<Diagnostics>>>()?;

        let mut diagnostics = Diagnostics::new();
        for d in per_page {
            diagnostics.extend(d);
        }
        tracing::info!(
            pages = artifacts.len(),
            errors = diagnostics.error_count(),
            "render finished"
        );
        Ok(BuildReport::from_diagnostics(artifacts.len(), &diagnostics))
    }
}

/// Preprocess, parse and walk one source file.
pub fn walk_source(
    path: &Path,
    reader: &dyn TexReader,
    bibliography: &Bibliography,
) -> Result<(Artifact, Diagnostics)> {
    let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let _span = tracing::debug_span!("walk", page = %stem).entered();
    let document = reader.read(&preprocess(&source))?;
    let walked = Walker::new(&stem, reader, bibliography).walk(document)?;
    Ok(walked.into_artifact())
}

/// Every `*.tex` file directly inside `dir`, sorted.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sources: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "tex"))
        .collect();
    sources.sort();
    Ok(sources)
}

fn read_artifacts(dir: &Path) -> Result<Vec<Artifact>> {
    if !dir.is_dir() {
        return Err(ResolutionError::MissingArtifact(dir.display().to_string()).into());
    }
    let artifacts = Artifact::read_dir(dir)?;
    if artifacts.is_empty() {
        return Err(ResolutionError::MissingArtifact(format!("no artifacts in {}", dir.display())).into());
    }
    Ok(artifacts)
}
