//! # symcat
//!
//! Build pipeline for a catalog of symmetric-function families: LaTeX
//! sources in, a static HTML site out.
//!
//! ## Stages
//!
//! 1. **Walk** (per file, parallel): the source is preprocessed and parsed
//!    into a pandoc-shaped tree. Every raw LaTeX node is matched against the
//!    catalog's macro vocabulary and rewritten into typed nodes. Labels,
//!    citations, structured family records and page metadata are collected
//!    into a [`DocumentMeta`] and written, with the rewritten tree, as a JSON
//!    artifact.
//! 2. **Merge** (once, after every walk): all artifacts are combined into
//!    the site-wide label index and structured-record index, which are then
//!    validated. A sitemap is written alongside.
//! 3. **Render** (per file, parallel): each artifact becomes an HTML page.
//!    Cross-references are resolved against the label index, the page's
//!    bibliography is built from the citations it actually uses, and the
//!    result is substituted into the page template.
//!
//! ## Macro vocabulary
//!
//! Inline: `\defin`, `\icon`, `\includeimage`, `\oeis`, `\filelink`,
//! `\hyperref`, `\ref`, `\cref`, `\label`, `\enquote`, `\cite`, `\todo`,
//! `\topiccard`, and `\ytab` and the spacing commands (which belong on their
//! own line and are reported when used inline).
//!
//! Block: `\metatitle`, `\metadescription`, `\metakeywords`,
//! `cssvariables`, `\specialblock{polynomialtable}`, `quote`, the
//! theorem-like environments (starred for collapsible), `\family[id]{Title}`,
//! `polydata{id}`, `figure`, `topicsection`, and the table shorthands
//! `ytableau`, `array`, `tabular` and `\ytab`.
//!
//! ## Diagnostics
//!
//! Content problems (unknown macros, undefined citations, dangling labels,
//! incomplete records) never abort a stage. They are logged through
//! `tracing`, collected as [`Diagnostics`], and turn the process exit status
//! to 1. Only environment problems (unreadable files, a broken bibliography)
//! are [`Error`]s.
//!
//! ## Quick start
//!
//! ```text
//! use symcat::{Bibliography, walk_text};
//!
//! let walked = walk_text("lie", r"\family[heisenbergAlgebra]{Heisenberg algebra}", &Bibliography::default())?;
//! assert!(walked.meta.labels.contains("heisenbergAlgebra"));
//! ```

pub mod ast;
pub mod bibliography;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod merge;
pub mod meta;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod resolve;

// Convenience re-exports
pub use ast::{Block, Document, Inline};
pub use bibliography::{BibEntry, Bibliography};
pub use config::SiteConfig;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{ConfigError, Error, ParseError, RenderError, ResolutionError, Result};
pub use merge::{merge, LabelIndex, Merged, RecordIndex, RefTarget};
pub use meta::{Artifact, DocumentMeta};
pub use parser::{parse, LatexReader, PandocReader, TexReader};
pub use pipeline::{discover_sources, BuildReport, Pipeline};
pub use render::{render_page, MathBackend, RenderContext, RenderedPage, Template};
pub use resolve::{Walked, Walker};

/// Parse and walk one page of LaTeX with the built-in reader.
pub fn walk_text(source_stem: &str, source: &str, bibliography: &Bibliography) -> Result<Walked> {
    let document = parse(source)?;
    Walker::new(source_stem, &LatexReader, bibliography).walk(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    const LIE: &str = r"\metatitle{Lie algebras}

\family[heisenbergAlgebra]{Heisenberg algebra}

\begin{polydata}{heisenbergAlgebra}
Name & Heisenberg \\
Category & Lie \\
Year & 1925 \\
Rating & 4 \\
\end{polydata}

\family[schurS]{Schur functions}
";

    const SCHUR: &str = r"\family[schurS]{Schur polynomials}

\begin{polydata}{schurS}
Name & Schur polynomials \\
Category & Classical \\
Year & 1901 \\
Rating & \\
\end{polydata}

\specialblock{polynomialtable}
";

    const INTRO: &str = r"\metatitle{Introduction}

See \hyperref[heisenbergAlgebra]{the Heisenberg algebra} and \cite{Smith99}.
";

    fn site_config(root: &Path) -> SiteConfig {
        SiteConfig {
            source_dir: root.join("tex"),
            intermediate_dir: root.join("build/intermediate"),
            label_index: root.join("build/labels.json"),
            record_index: root.join("build/polydata.json"),
            site_dir: root.join("site"),
            source_timestamp: Some("2024-05-01".into()),
            base_url: "https://example.org/".into(),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn test_walk_text() {
        let walked = walk_text(
            "lie",
            r"\family[heisenbergAlgebra]{Heisenberg algebra}",
            &Bibliography::default(),
        )
        .unwrap();
        assert!(walked.meta.labels.contains("heisenbergAlgebra"));
        assert_eq!(walked.meta.display_title(), "Heisenberg algebra");
        assert!(walked.diagnostics.is_empty());
    }

    #[test]
    fn test_full_build() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_config(dir.path());
        std::fs::create_dir_all(&config.source_dir).unwrap();
        for (name, source) in [("lie.tex", LIE), ("schur.tex", SCHUR), ("intro.tex", INTRO)] {
            std::fs::write(config.source_dir.join(name), source).unwrap();
        }

        let pipeline = Pipeline::with_parts(&config, Box::new(LatexReader), Bibliography::default());
        let report = pipeline.build().unwrap();

        // Undefined citation, duplicate schurS, blank Rating
        assert_eq!(report.files, 3);
        assert_eq!(report.errors, 3);
        assert_eq!(report.exit_code(), 1);

        let intro = std::fs::read_to_string(config.site_dir.join("intro.htm")).unwrap();
        assert!(intro.contains(r#"<a href="lie.htm#heisenbergAlgebra" class="crossref">the Heisenberg algebra</a>"#));
        assert!(intro.contains("UNDEF:Smith99"));
        assert!(intro.contains("<title>Introduction</title>"));

        let schur = std::fs::read_to_string(config.site_dir.join("schur.htm")).unwrap();
        assert!(schur.contains(r#"<td><a href="lie.htm#heisenbergAlgebra">Heisenberg</a></td>"#));
        assert!(schur.contains(r#"<td><a href="lie.htm#schurS">Schur polynomials</a></td>"#));

        let labels = LabelIndex::load(&config.label_index).unwrap();
        assert_eq!(labels.get("schurS").unwrap().page, "lie");
        assert_eq!(
            labels.resolve("heisenbergAlgebra"),
            RefTarget::Resolved("lie.htm#heisenbergAlgebra".into())
        );

        let records = RecordIndex::load(&config.record_index).unwrap();
        assert_eq!(records.get("schurS").unwrap()["page"], "schur");

        let sitemap = std::fs::read_to_string(config.site_dir.join("sitemap.xml")).unwrap();
        assert_eq!(sitemap.matches("<lastmod>2024-05-01</lastmod>").count(), 3);
        assert!(sitemap.contains("<loc>https://example.org/intro.htm</loc>"));
    }

    #[test]
    fn test_stages_are_idempotent() {
        let first = walk_text("intro", INTRO, &Bibliography::default()).unwrap();
        let second = walk_text("intro", INTRO, &Bibliography::default()).unwrap();
        assert_eq!(
            serde_json::to_string(&first.document).unwrap(),
            serde_json::to_string(&second.document).unwrap()
        );
        assert_eq!(first.meta, second.meta);
        assert_eq!(first.diagnostics.error_count(), 1);
    }
}
