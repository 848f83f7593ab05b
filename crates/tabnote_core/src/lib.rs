//! Core of the tabnote widget: notes, vault mirroring and wallpaper rotation.
//! This crate owns every state invariant; UI layers only call into it.

pub mod command;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod session;
pub mod vault;
pub mod wallpaper;

pub use command::expander::{apply_enter, expand, EnterEdit, Expansion};
pub use config::{ConfigError, WidgetConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{daily_note_id, Note, NoteCollection, NoteId};
pub use model::wallpaper::{WallpaperMode, WallpaperState};
pub use repo::state_repo::{
    LoadedState, RepoError, RepoResult, SqliteStateRepository, StateRepository,
};
pub use service::export::ExportedNote;
pub use service::note_store::NoteStore;
pub use session::{Session, SessionError};
pub use vault::mirror::{BindOutcome, MirrorDisposition, VaultMirror};
pub use vault::target::{DirectoryVault, FixedDirectoryPicker, VaultPicker, VaultTarget};
pub use wallpaper::scheduler::{WallpaperError, WallpaperScheduler, WallpaperSurface};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
