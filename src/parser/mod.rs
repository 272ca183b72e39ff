//! Parser boundary: LaTeX source to document tree.
//!
//! The rewriter only relies on the [`TexReader`] trait. Two readers ship
//! with the crate: [`LatexReader`], a nom-based reader for the LaTeX subset
//! the catalog is written in, and [`PandocReader`], which delegates to the
//! `pandoc` executable. Both leave every construct they do not model as a
//! raw passthrough node.

mod block;
mod inline;
mod lexer;
mod pandoc;
mod preprocess;

pub use block::parse_blocks;
pub use inline::parse_inlines;
pub use lexer::{
    braced, bracketed, command_name, environment, spaced_braced, spaced_bracketed,
    split_top_level, star, Environment,
};
pub use pandoc::PandocReader;
pub use preprocess::preprocess;

use crate::ast::Document;
use crate::error::Result;

/// Something that turns LaTeX text into a document tree.
///
/// Implementations must be shareable across the per-file worker threads.
pub trait TexReader: Sync {
    fn read(&self, source: &str) -> Result<Document>;
}

/// The built-in reader for the catalog's LaTeX subset.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexReader;

impl TexReader for LatexReader {
    fn read(&self, source: &str) -> Result<Document> {
        Ok(Document::new(parse_blocks(source)?))
    }
}

/// Parse a complete document from source text with the built-in reader.
pub fn parse(input: &str) -> Result<Document> {
    LatexReader.read(&preprocess(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Format};

    #[test]
    fn test_parse_full_document() {
        let input = r#"\documentclass{article}
\begin{document}
\metatitle{Lie algebras} % page title

\begin{figure}
\includeimage[0.5\linewidth]{lie.svg}
\end{figure}
\end{document}"#;

        let doc = parse(input).unwrap();
        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(doc.blocks[0], Block::RawBlock(Format::tex(), "\\metatitle{Lie algebras}".into()));
        match &doc.blocks[1] {
            Block::RawBlock(_, text) => assert!(text.starts_with("\\begin{figurefreeze}")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
