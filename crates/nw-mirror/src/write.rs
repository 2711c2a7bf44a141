//! Writing rendered documents to the output directory.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Failure, Stage};
use crate::render::Document;

/// Result of writing documents.
#[derive(Debug, Default)]
pub struct WriteOutcome {
    /// Paths (relative to the output root) that were written, in document order.
    pub written: Vec<String>,
    pub failures: Vec<Failure>,
}

/// Write every document under `out_dir`, creating directories as needed.
///
/// A document that cannot be written is recorded and skipped.
pub fn write_documents(out_dir: &Path, documents: &[Document]) -> WriteOutcome {
    let mut outcome = WriteOutcome::default();

    for document in documents {
        let target = out_dir.join(&document.path);
        let result = target
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(&target, &document.content));

        match result {
            Ok(()) => {
                debug!("wrote {}", target.display());
                outcome.written.push(document.path.clone());
            }
            Err(e) => outcome.failures.push(Failure::new(
                document.id,
                Stage::Write,
                format!("cannot write {}: {e}", target.display()),
            )),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use nw_notion::EntityId;
    use tempfile::TempDir;

    use super::*;

    fn document(n: u8, path: &str, content: &str) -> Document {
        Document {
            id: EntityId::parse(&format!("{n:032x}")).unwrap(),
            path: path.to_owned(),
            content: content.to_owned(),
        }
    }

    #[test]
    fn test_write_creates_directories() {
        let temp_dir = TempDir::new().unwrap();

        let outcome = write_documents(
            temp_dir.path(),
            &[
                document(1, "p/index.md", "# P\n\n"),
                document(2, "c/alpha.md", "# Alpha\n\n"),
            ],
        );

        assert_eq!(outcome.written, vec!["p/index.md", "c/alpha.md"]);
        assert!(outcome.failures.is_empty());
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("c/alpha.md")).unwrap(),
            "# Alpha\n\n"
        );
    }

    #[test]
    fn test_failed_write_does_not_stop_others() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("blocked"), "file, not a directory").unwrap();

        let outcome = write_documents(
            temp_dir.path(),
            &[
                document(1, "blocked/index.md", "x"),
                document(2, "ok.md", "y"),
            ],
        );

        assert_eq!(outcome.written, vec!["ok.md"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].stage, Stage::Write);
    }
}
