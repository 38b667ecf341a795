// Document loading
// Reads the plain-text corpus that the indexer chunks and embeds


use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// A plain-text document loaded from the corpus directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source: PathBuf,
    pub text: String,
}

impl Document {
    /// Identifier recorded as provenance on every chunk of this document
    #[inline]
    pub fn source_id(&self) -> String {
        self.source.display().to_string()
    }

    #[inline]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Load every `*.txt` file directly inside `dir`, in path order.
///
/// Files that cannot be read as UTF-8 text are skipped with a warning.
#[inline]
pub fn load_documents(dir: &Path) -> io::Result<Vec<Document>> {
    let mut paths = fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!("Failed to read directory entry in {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|path| path.is_file() && is_text_file(path))
        .collect::<Vec<_>>();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        match fs::read_to_string(&path) {
            Ok(text) => {
                debug!("Loaded document {} ({} bytes)", path.display(), text.len());
                documents.push(Document { source: path, text });
            }
            Err(e) => {
                warn!("Skipping unreadable document {}: {}", path.display(), e);
            }
        }
    }

    Ok(documents)
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("txt"))
}
