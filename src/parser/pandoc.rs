//! Reader backed by the `pandoc` executable.

use crate::ast::Document;
use crate::error::{ParseError, Result};
use crate::parser::TexReader;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Runs `pandoc -f latex+raw_tex -t json` and reads its JSON AST.
///
/// Constructs pandoc does not model arrive as `RawBlock`/`RawInline` nodes
/// tagged `latex`, which the rewriter treats like `tex`.
#[derive(Debug, Clone)]
pub struct PandocReader {
    executable: PathBuf,
}

impl PandocReader {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl Default for PandocReader {
    fn default() -> Self {
        Self::new("pandoc")
    }
}

impl TexReader for PandocReader {
    fn read(&self, source: &str) -> Result<Document> {
        let mut child = Command::new(&self.executable)
            .args(["--from", "latex+raw_tex", "--to", "json"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ParseError::External(format!("{}: {}", self.executable.display(), e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .map_err(|e| ParseError::External(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| ParseError::External(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ParseError::External(format!("{}: {}", output.status, stderr.trim())).into());
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ParseError::Output(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable_is_an_error() {
        let reader = PandocReader::new("/nonexistent/pandoc-binary");
        let err = reader.read("x").unwrap_err();
        assert!(err.to_string().contains("External parser failed"));
    }
}
