//! Vault capability and grant prompt contracts.
//!
//! # Responsibility
//! - Abstract the writable external directory behind `VaultTarget`.
//! - Abstract the user-facing grant prompt behind `VaultPicker`.
//! - Map note ids to safe relative markdown file names.
//!
//! # Invariants
//! - A file name produced by `vault_file_name` never escapes the vault root.
//! - `DirectoryVault` fails writes once its root directory is gone.

use once_cell::sync::Lazy;
use regex::Regex;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

static ILLEGAL_FILE_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"\\|?*\x00-\x1f]"#).expect("valid file name regex"));

pub type WriteFuture<'a> = Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>>;
pub type PickFuture<'a> = Pin<Box<dyn Future<Output = Option<Arc<dyn VaultTarget>>> + Send + 'a>>;

/// Granted write access to an external note directory.
pub trait VaultTarget: Send + Sync {
    /// Human-readable name shown in the connect notice.
    fn name(&self) -> &str;
    /// Overwrites (or creates) `file_name` with `content`.
    fn write_note<'a>(&'a self, file_name: &'a str, content: &'a str) -> WriteFuture<'a>;
}

/// The prompt that asks the user to grant a vault directory.
///
/// Resolves to `None` when the user dismisses the prompt.
pub trait VaultPicker: Send + Sync {
    fn pick(&self) -> PickFuture<'_>;
}

/// Vault backed by a local directory.
#[derive(Debug, Clone)]
pub struct DirectoryVault {
    root: PathBuf,
    name: String,
}

impl DirectoryVault {
    /// Grants access to an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("vault directory `{}` does not exist", root.display()),
            ));
        }
        let name = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Ok(Self { root, name })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl VaultTarget for DirectoryVault {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_note<'a>(&'a self, file_name: &'a str, content: &'a str) -> WriteFuture<'a> {
        Box::pin(async move {
            if !tokio::fs::try_exists(&self.root).await? {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "vault directory was removed",
                ));
            }
            let path = self.root.join(file_name);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, content.as_bytes()).await
        })
    }
}

/// Picker that answers the prompt with a directory chosen up front.
///
/// `None`, or a path that is not an existing directory, behaves like a
/// dismissed prompt.
#[derive(Debug, Clone, Default)]
pub struct FixedDirectoryPicker {
    path: Option<PathBuf>,
}

impl FixedDirectoryPicker {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl VaultPicker for FixedDirectoryPicker {
    fn pick(&self) -> PickFuture<'_> {
        Box::pin(async move {
            let path = self.path.as_ref()?;
            let vault = DirectoryVault::open(path).ok()?;
            Some(Arc::new(vault) as Arc<dyn VaultTarget>)
        })
    }
}

/// Maps a note id to its mirror file name, `<id>.md`.
///
/// `/` separates subdirectories. Characters illegal on common filesystems
/// become `_`, as do empty, `.` and `..` segments.
pub fn vault_file_name(note_id: &str) -> String {
    let segments = note_id
        .split('/')
        .map(|segment| {
            let cleaned = ILLEGAL_FILE_CHARS_RE.replace_all(segment, "_");
            match cleaned.as_ref() {
                "" | "." | ".." => "_".to_string(),
                other => other.to_string(),
            }
        })
        .collect::<Vec<_>>();
    format!("{}.md", segments.join("/"))
}
