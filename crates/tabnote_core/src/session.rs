//! Session context owning every stateful component.
//!
//! # Responsibility
//! - Load durable state once and hand each slice to its component.
//! - Hold the note store, vault mirror and wallpaper scheduler together.
//! - Drain background work on shutdown.
//!
//! # Invariants
//! - Only a storage failure during `open` is fatal.
//! - Vault and wallpaper failures never interrupt note operations.

use crate::command::expander::apply_enter;
use crate::config::WidgetConfig;
use crate::model::note::{daily_note_id, Note};
use crate::repo::state_repo::{RepoError, SqliteStateRepository, StateRepository};
use crate::service::export::ExportedNote;
use crate::service::note_store::NoteStore;
use crate::vault::mirror::{BindOutcome, VaultMirror};
use crate::vault::target::VaultPicker;
use crate::wallpaper::scheduler::{WallpaperScheduler, WallpaperSurface};
use chrono::Utc;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;

#[derive(Debug)]
pub enum SessionError {
    /// The durable state could not be opened or read.
    Storage(RepoError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "cannot establish starting state: {err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// One running widget: notes, vault mirror and wallpaper rotation.
pub struct Session {
    notes: NoteStore,
    wallpaper: WallpaperScheduler,
}

impl Session {
    /// Opens the SQLite state at `config.db_path` and restores the session.
    pub fn open_with_config(
        config: &WidgetConfig,
        surface: Arc<dyn WallpaperSurface>,
        runtime: Handle,
    ) -> Result<Self, SessionError> {
        let repo = SqliteStateRepository::open(&config.db_path).map_err(RepoError::from)?;
        Self::open(config, Arc::new(repo), surface, runtime)
    }

    /// Restores notes and wallpaper state from `repo`.
    ///
    /// # Errors
    /// `SessionError::Storage` when the state cannot be read.
    pub fn open(
        config: &WidgetConfig,
        repo: Arc<dyn StateRepository>,
        surface: Arc<dyn WallpaperSurface>,
        runtime: Handle,
    ) -> Result<Self, SessionError> {
        let started_at = Instant::now();
        let loaded = repo.load_state().inspect_err(|err| {
            error!("event=session_open module=session status=error error={err}");
        })?;

        let mirror = VaultMirror::new(runtime.clone());
        let notes = NoteStore::restore(
            loaded.notes,
            loaded.active_note_id,
            Arc::clone(&repo),
            mirror,
            daily_note_id(Utc::now().date_naive()),
        );

        let wallpaper = WallpaperScheduler::new(
            config.wallpaper_urls(),
            config.slideshow_period(),
            repo,
            surface,
            runtime,
        );
        wallpaper.restore(loaded.wallpaper_index, loaded.wallpaper_mode);

        info!(
            "event=session_open module=session status=ok malformed_fields={} duration_ms={}",
            loaded.malformed_fields.len(),
            started_at.elapsed().as_millis()
        );
        Ok(Self { notes, wallpaper })
    }

    pub fn notes(&self) -> &NoteStore {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut NoteStore {
        &mut self.notes
    }

    pub fn vault(&self) -> &VaultMirror {
        self.notes.mirror()
    }

    pub fn wallpaper(&self) -> &WallpaperScheduler {
        &self.wallpaper
    }

    /// Prompts for a vault directory and binds it for this process.
    pub async fn bind_vault(&self, picker: &dyn VaultPicker) -> BindOutcome {
        self.vault().bind(picker).await
    }

    /// Presses Enter at the active note's cursor, expanding slash commands.
    pub fn press_enter(&mut self) -> &Note {
        let active = self.notes.active_note();
        let edit = apply_enter(&active.content, active.cursor);
        self.notes.update_active(edit.content, edit.cursor)
    }

    pub fn export_active(&self) -> ExportedNote {
        self.notes.export_active()
    }

    /// Stops the slideshow timer and waits for pending vault writes.
    pub async fn shutdown(&self) {
        self.wallpaper.shutdown();
        self.vault().settle().await;
        info!("event=session_close module=session status=ok");
    }
}
