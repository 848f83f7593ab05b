//! Durable widget state contract and SQLite implementation.
//!
//! # Responsibility
//! - Read the whole state blob once at startup.
//! - Write the notes slice and the wallpaper slice independently.
//! - Decode malformed or missing fields into per-field defaults.
//!
//! # Invariants
//! - Stored keys are exactly `notes`, `activeNoteId`, `wallpaperIndex`, `wallpaperMode`.
//! - `notes` and `activeNoteId` are written in one transaction.
//! - Decoding never fails; each field degrades on its own.

use crate::db::{open_db, open_db_in_memory, DbError, DbResult};
use crate::model::note::{Note, NoteCollection, NoteId};
use crate::model::wallpaper::{WallpaperMode, WallpaperState};
use log::{debug, warn};
use rusqlite::{params, Connection};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const KEY_NOTES: &str = "notes";
pub const KEY_ACTIVE_NOTE_ID: &str = "activeNoteId";
pub const KEY_WALLPAPER_INDEX: &str = "wallpaperIndex";
pub const KEY_WALLPAPER_MODE: &str = "wallpaperMode";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence failure for state reads and writes.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Encode(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "state store unavailable: {err}"),
            Self::Encode(err) => write!(f, "failed to encode state: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Decoded state blob. `None` means the field was missing or malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedState {
    pub notes: NoteCollection,
    pub active_note_id: Option<NoteId>,
    pub wallpaper_index: Option<usize>,
    pub wallpaper_mode: Option<WallpaperMode>,
    /// Keys that were present but could not be decoded.
    pub malformed_fields: Vec<&'static str>,
}

/// Read/write contract for the durable state blob.
pub trait StateRepository: Send + Sync {
    /// Reads and decodes the full blob.
    fn load_state(&self) -> RepoResult<LoadedState>;
    /// Writes all notes and the active note id together.
    fn save_notes(&self, notes: &NoteCollection, active_note_id: &str) -> RepoResult<()>;
    /// Writes the wallpaper index and mode together.
    fn save_wallpaper(&self, state: WallpaperState) -> RepoResult<()>;
}

#[derive(Serialize)]
struct StoredNote<'a> {
    content: &'a str,
    cursor: usize,
}

/// SQLite-backed state repository over the `widget_state` table.
pub struct SqliteStateRepository {
    conn: Mutex<Connection>,
}

impl SqliteStateRepository {
    /// Wraps a connection that already has migrations applied.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens the state database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        open_db(path).map(Self::new)
    }

    /// Opens a throwaway in-memory state database.
    pub fn open_in_memory() -> DbResult<Self> {
        open_db_in_memory().map(Self::new)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateRepository for SqliteStateRepository {
    fn load_state(&self) -> RepoResult<LoadedState> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key, value FROM widget_state;")?;
        let mut rows = stmt.query([])?;
        let mut raw = HashMap::new();
        while let Some(row) = rows.next()? {
            raw.insert(row.get::<_, String>(0)?, row.get::<_, String>(1)?);
        }
        Ok(decode_state(&raw))
    }

    fn save_notes(&self, notes: &NoteCollection, active_note_id: &str) -> RepoResult<()> {
        let stored = notes
            .iter()
            .map(|(id, note)| {
                (
                    id.as_str(),
                    StoredNote {
                        content: &note.content,
                        cursor: note.cursor,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();
        let notes_json = serde_json::to_string(&stored)?;
        let active_json = serde_json::to_string(active_note_id)?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        upsert(&tx, KEY_NOTES, &notes_json)?;
        upsert(&tx, KEY_ACTIVE_NOTE_ID, &active_json)?;
        tx.commit()?;
        Ok(())
    }

    fn save_wallpaper(&self, state: WallpaperState) -> RepoResult<()> {
        let index_json = serde_json::to_string(&state.index)?;
        let mode_json = serde_json::to_string(&state.mode)?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        upsert(&tx, KEY_WALLPAPER_INDEX, &index_json)?;
        upsert(&tx, KEY_WALLPAPER_MODE, &mode_json)?;
        tx.commit()?;
        Ok(())
    }
}

fn upsert(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO widget_state (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
        params![key, value],
    )?;
    Ok(())
}

/// Decodes raw `key -> JSON text` pairs into typed state.
///
/// Each key decodes independently. Inside `notes`, each entry decodes
/// independently too: non-object entries are dropped, a missing `content`
/// becomes `""`, and a missing `cursor` lands at the end of the content.
pub fn decode_state(raw: &HashMap<String, String>) -> LoadedState {
    let mut state = LoadedState::default();

    if let Some(value) = field(raw, KEY_NOTES, &mut state.malformed_fields) {
        match decode_notes(&value) {
            Some(notes) => state.notes = notes,
            None => malformed(KEY_NOTES, &mut state.malformed_fields),
        }
    }

    if let Some(value) = field(raw, KEY_ACTIVE_NOTE_ID, &mut state.malformed_fields) {
        match value.as_str() {
            Some(id) if !id.is_empty() => state.active_note_id = Some(id.to_string()),
            _ => malformed(KEY_ACTIVE_NOTE_ID, &mut state.malformed_fields),
        }
    }

    if let Some(value) = field(raw, KEY_WALLPAPER_INDEX, &mut state.malformed_fields) {
        match value.as_u64().and_then(|index| usize::try_from(index).ok()) {
            Some(index) => state.wallpaper_index = Some(index),
            None => malformed(KEY_WALLPAPER_INDEX, &mut state.malformed_fields),
        }
    }

    if let Some(value) = field(raw, KEY_WALLPAPER_MODE, &mut state.malformed_fields) {
        match value.as_str().and_then(WallpaperMode::parse) {
            Some(mode) => state.wallpaper_mode = Some(mode),
            None => malformed(KEY_WALLPAPER_MODE, &mut state.malformed_fields),
        }
    }

    state
}

fn field(
    raw: &HashMap<String, String>,
    key: &'static str,
    malformed_fields: &mut Vec<&'static str>,
) -> Option<Value> {
    let Some(text) = raw.get(key) else {
        debug!("event=state_decode module=repo status=missing field={key}");
        return None;
    };
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(_) => {
            malformed(key, malformed_fields);
            None
        }
    }
}

fn malformed(key: &'static str, malformed_fields: &mut Vec<&'static str>) {
    warn!("event=state_decode module=repo status=defaulted field={key}");
    malformed_fields.push(key);
}

fn decode_notes(value: &Value) -> Option<NoteCollection> {
    let entries = value.as_object()?;
    let mut notes = NoteCollection::new();
    for (id, entry) in entries {
        let Some(entry) = entry.as_object() else {
            warn!("event=state_decode module=repo status=dropped field={KEY_NOTES} note_id={id}");
            continue;
        };
        let content = entry
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let cursor = entry
            .get("cursor")
            .and_then(Value::as_u64)
            .and_then(|cursor| usize::try_from(cursor).ok())
            .unwrap_or(content.len());
        notes.insert(id.clone(), Note::new(id.clone(), content, cursor));
    }
    Some(notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn empty_blob_decodes_to_all_defaults() {
        let state = decode_state(&HashMap::new());
        assert_eq!(state, LoadedState::default());
    }

    #[test]
    fn each_malformed_field_is_defaulted_independently() {
        let state = decode_state(&raw(&[
            (KEY_NOTES, "[1, 2]"),
            (KEY_ACTIVE_NOTE_ID, "\"Inbox\""),
            (KEY_WALLPAPER_INDEX, "-4"),
            (KEY_WALLPAPER_MODE, "\"static\""),
        ]));
        assert!(state.notes.is_empty());
        assert_eq!(state.active_note_id.as_deref(), Some("Inbox"));
        assert_eq!(state.wallpaper_index, None);
        assert_eq!(state.wallpaper_mode, Some(WallpaperMode::Static));
        assert_eq!(state.malformed_fields, vec![KEY_NOTES, KEY_WALLPAPER_INDEX]);
    }

    #[test]
    fn unparseable_json_and_empty_active_id_are_malformed() {
        let state = decode_state(&raw(&[
            (KEY_ACTIVE_NOTE_ID, "\"\""),
            (KEY_WALLPAPER_MODE, "{not json"),
        ]));
        assert_eq!(state.active_note_id, None);
        assert_eq!(state.wallpaper_mode, None);
        assert_eq!(
            state.malformed_fields,
            vec![KEY_ACTIVE_NOTE_ID, KEY_WALLPAPER_MODE]
        );
    }

    #[test]
    fn note_entries_decode_independently() {
        let state = decode_state(&raw(&[(
            KEY_NOTES,
            r#"{
                "ok": {"content": "hello", "cursor": 2},
                "no-cursor": {"content": "abc"},
                "no-content": {"cursor": 7},
                "big-cursor": {"content": "xy", "cursor": 40},
                "bad": "just a string"
            }"#,
        )]));

        assert_eq!(state.notes.len(), 4);
        assert_eq!(state.notes["ok"].cursor, 2);
        assert_eq!(state.notes["no-cursor"].cursor, 3);
        assert_eq!(state.notes["no-content"].content, "");
        assert_eq!(state.notes["no-content"].cursor, 0);
        assert_eq!(state.notes["big-cursor"].cursor, 2);
        assert!(!state.notes.contains_key("bad"));
        assert!(state.malformed_fields.is_empty());
    }
}
