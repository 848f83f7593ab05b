//! Export of the active note as a standalone markdown file.

use crate::vault::target::vault_file_name;
use std::io;
use std::path::{Path, PathBuf};

/// A note snapshot ready to be saved as `<id>.md`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedNote {
    pub file_name: String,
    pub content: String,
}

impl ExportedNote {
    pub fn new(note_id: &str, content: impl Into<String>) -> Self {
        Self {
            file_name: vault_file_name(note_id),
            content: content.into(),
        }
    }

    /// Writes the snapshot under `dir` and returns the written path.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> io::Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.content.as_bytes())?;
        Ok(path)
    }
}
