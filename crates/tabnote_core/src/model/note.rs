//! Note domain model.
//!
//! # Responsibility
//! - Represent one named text unit and its editor cursor.
//! - Derive the default daily note id.
//!
//! # Invariants
//! - `cursor` is a byte offset in `[0, content.len()]` on a char boundary.
//! - Note ids are caller-chosen strings and never rewritten by core.

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Identifier of a note, e.g. `Daily/2026-10-18`.
pub type NoteId = String;

/// Notes keyed by id; iteration order is ascending id.
pub type NoteCollection = BTreeMap<NoteId, Note>;

/// Prefix of date-derived note ids.
pub const DAILY_NOTE_PREFIX: &str = "Daily/";

/// One note with its remembered cursor position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    /// Byte offset into `content`.
    pub cursor: usize,
}

impl Note {
    /// Creates an empty note with cursor at 0.
    pub fn empty(id: impl Into<NoteId>) -> Self {
        Self {
            id: id.into(),
            content: String::new(),
            cursor: 0,
        }
    }

    /// Creates a note, clamping `cursor` into the content bounds.
    pub fn new(id: impl Into<NoteId>, content: impl Into<String>, cursor: usize) -> Self {
        let content = content.into();
        let cursor = clamp_cursor(&content, cursor);
        Self {
            id: id.into(),
            content,
            cursor,
        }
    }

    /// Replaces content and cursor together, keeping the cursor in bounds.
    pub fn set_content(&mut self, content: impl Into<String>, cursor: usize) {
        self.content = content.into();
        self.cursor = clamp_cursor(&self.content, cursor);
    }
}

/// Clamps `cursor` to `content.len()` and floors it to a char boundary.
pub fn clamp_cursor(content: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(content.len());
    while !content.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

/// Returns the daily note id for `date`, e.g. `Daily/2026-10-18`.
pub fn daily_note_id(date: NaiveDate) -> NoteId {
    format!("{DAILY_NOTE_PREFIX}{}", date.format("%Y-%m-%d"))
}
