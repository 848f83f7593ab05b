//! In-memory note store with write-through persistence.
//!
//! # Responsibility
//! - Restore notes and the active note id from the state repository.
//! - Apply edits and active-note switches, persisting each one immediately.
//! - Trigger vault mirroring as a detached follow-on of every edit.
//!
//! # Invariants
//! - The active note id always resolves to a note in the collection.
//! - The in-memory mutation completes before its persistence write is issued.
//! - A failed runtime save is logged; the next mutation's save supersedes it.
//! - Vault state never influences the outcome of an edit.

use crate::model::note::{Note, NoteCollection, NoteId};
use crate::repo::state_repo::{RepoResult, StateRepository};
use crate::search::filter::filter_note_ids;
use crate::service::export::ExportedNote;
use crate::vault::mirror::VaultMirror;
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Instant;

/// Note collection plus active-note pointer, bound to a repository and mirror.
pub struct NoteStore {
    notes: NoteCollection,
    active_note_id: NoteId,
    repo: Arc<dyn StateRepository>,
    mirror: VaultMirror,
}

impl NoteStore {
    /// Loads notes from `repo`, falling back to `default_note_id` as active.
    ///
    /// # Errors
    /// Returns the repository error when the state cannot be read at all.
    pub fn load(
        repo: Arc<dyn StateRepository>,
        mirror: VaultMirror,
        default_note_id: impl Into<NoteId>,
    ) -> RepoResult<Self> {
        let loaded = repo.load_state().inspect_err(|err| {
            error!("event=notes_load module=service status=error error={err}");
        })?;
        Ok(Self::restore(
            loaded.notes,
            loaded.active_note_id,
            repo,
            mirror,
            default_note_id,
        ))
    }

    /// Builds a store from already-decoded state.
    ///
    /// A missing active id falls back to `default_note_id`; a dangling one
    /// gets an empty note, which is written through immediately.
    pub fn restore(
        notes: NoteCollection,
        active_note_id: Option<NoteId>,
        repo: Arc<dyn StateRepository>,
        mirror: VaultMirror,
        default_note_id: impl Into<NoteId>,
    ) -> Self {
        let started_at = Instant::now();
        let mut store = Self {
            notes,
            active_note_id: active_note_id.unwrap_or_else(|| default_note_id.into()),
            repo,
            mirror,
        };

        if !store.notes.contains_key(&store.active_note_id) {
            let id = store.active_note_id.clone();
            store.notes.insert(id.clone(), Note::empty(id));
            store.persist("load");
        }

        info!(
            "event=notes_load module=service status=ok note_count={} duration_ms={}",
            store.notes.len(),
            started_at.elapsed().as_millis()
        );
        store
    }

    pub fn active_note_id(&self) -> &str {
        &self.active_note_id
    }

    pub fn active_note(&self) -> &Note {
        // `load` and `switch_active` insert the active note before pointing at it.
        &self.notes[&self.active_note_id]
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn notes(&self) -> &NoteCollection {
        &self.notes
    }

    /// All note ids in ascending order.
    pub fn note_ids(&self) -> Vec<NoteId> {
        self.notes.keys().cloned().collect()
    }

    pub fn mirror(&self) -> &VaultMirror {
        &self.mirror
    }

    /// Makes `id` active, creating an empty note when it does not exist yet.
    ///
    /// Re-selecting the current note only re-persists the pointer; content
    /// and cursor are left untouched.
    pub fn switch_active(&mut self, id: &str) -> &Note {
        if !self.notes.contains_key(id) {
            self.notes.insert(id.to_string(), Note::empty(id));
            debug!("event=note_create module=service status=ok note_id={id}");
        }
        self.active_note_id = id.to_string();
        self.persist("switch_active");
        &self.notes[id]
    }

    /// Replaces the content and cursor of note `id`, then persists and mirrors it.
    pub fn update(&mut self, id: &str, content: impl Into<String>, cursor: usize) -> &Note {
        let note = self
            .notes
            .entry(id.to_string())
            .or_insert_with(|| Note::empty(id));
        note.set_content(content, cursor);
        let mirrored = note.content.clone();

        self.persist("update");
        let disposition = self.mirror.mirror(id, mirrored);
        debug!("event=note_update module=service status=ok note_id={id} mirror={disposition:?}");
        &self.notes[id]
    }

    /// `update` applied to the active note.
    pub fn update_active(&mut self, content: impl Into<String>, cursor: usize) -> &Note {
        let id = self.active_note_id.clone();
        self.update(&id, content, cursor)
    }

    /// Ids of notes whose content contains `query`, ignoring case.
    pub fn filter(&self, query: &str) -> Vec<NoteId> {
        filter_note_ids(&self.notes, query)
    }

    /// Snapshot of the active note for the export action.
    pub fn export_active(&self) -> ExportedNote {
        ExportedNote::new(&self.active_note_id, self.active_note().content.as_str())
    }

    fn persist(&self, op: &'static str) {
        let started_at = Instant::now();
        match self.repo.save_notes(&self.notes, &self.active_note_id) {
            Ok(()) => debug!(
                "event=state_save module=service status=ok op={op} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=state_save module=service status=error op={op} error={err}"
            ),
        }
    }
}
