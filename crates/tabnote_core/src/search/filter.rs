//! Case-insensitive substring filter over note content.

use crate::model::note::{NoteCollection, NoteId};

/// Returns ids of notes whose content contains `query`, ignoring case.
///
/// An empty query matches every note. Ids come back in ascending order.
pub fn filter_note_ids(notes: &NoteCollection, query: &str) -> Vec<NoteId> {
    if query.is_empty() {
        return notes.keys().cloned().collect();
    }

    let needle = query.to_lowercase();
    notes
        .values()
        .filter(|note| note.content.to_lowercase().contains(&needle))
        .map(|note| note.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::filter_note_ids;
    use crate::model::note::{Note, NoteCollection};

    fn collection(entries: &[(&str, &str)]) -> NoteCollection {
        entries
            .iter()
            .map(|(id, content)| ((*id).to_string(), Note::new(*id, *content, 0)))
            .collect()
    }

    #[test]
    fn empty_query_returns_all_ids_sorted() {
        let notes = collection(&[("b", "x"), ("a", "y"), ("c", "")]);
        assert_eq!(filter_note_ids(&notes, ""), vec!["a", "b", "c"]);
    }

    #[test]
    fn match_ignores_case_on_both_sides() {
        let notes = collection(&[("milk", "Buy Milk"), ("eggs", "Buy Eggs")]);
        assert_eq!(filter_note_ids(&notes, "milk"), vec!["milk"]);
        assert_eq!(filter_note_ids(&notes, "MILK"), vec!["milk"]);
        assert_eq!(filter_note_ids(&notes, "buy"), vec!["eggs", "milk"]);
    }

    #[test]
    fn ids_are_not_searched() {
        let notes = collection(&[("groceries", "Buy Eggs")]);
        assert!(filter_note_ids(&notes, "groceries").is_empty());
    }
}
