//! Document loading.

use crate::error::DocumentError;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

const TEXT_EXTENSIONS: [&str; 2] = ["txt", "md"];

fn has_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            TEXT_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Read every `.txt` / `.md` file under `dir`, recursively.
///
/// Files are visited in sorted path order so document order — and therefore
/// chunk indices — is stable across runs. Contents are trimmed and empty
/// files dropped. Files that cannot be read are skipped with a warning;
/// failing the whole load for one bad file would be worse than answering
/// from the rest.
///
/// # Errors
///
/// Returns [`DocumentError::DirectoryNotFound`] or
/// [`DocumentError::NotADirectory`] when `dir` is unusable, and
/// [`DocumentError::NoReadableInput`] when no file yields any content.
pub fn read_text_files(dir: impl AsRef<Path>) -> std::result::Result<Vec<String>, DocumentError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Err(DocumentError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(DocumentError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) if e.file_type().is_file() && has_text_extension(e.path()) => {
                Some(e.into_path())
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .collect();
    paths.sort();

    let mut docs = Vec::new();
    for path in paths {
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let content = content.trim();
                if !content.is_empty() {
                    docs.push(content.to_string());
                }
            }
            Err(e) => {
                warn!("Could not read {}: {}", path.display(), e);
            }
        }
    }

    if docs.is_empty() {
        return Err(DocumentError::NoReadableInput {
            path: dir.to_path_buf(),
        });
    }
    Ok(docs)
}
