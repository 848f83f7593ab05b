//! Slash-command expansion on Enter.

use crate::model::note::clamp_cursor;
use chrono::{Local, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Template {
    Literal(&'static str),
    CurrentDate,
}

impl Template {
    fn render(self, today: NaiveDate) -> String {
        match self {
            Self::Literal(text) => text.to_string(),
            Self::CurrentDate => today.format("%Y-%m-%d").to_string(),
        }
    }
}

const COMMANDS: &[(&str, Template)] = &[
    ("/todo", Template::Literal("- [ ] ")),
    ("/date", Template::CurrentDate),
    ("/heading", Template::Literal("## ")),
    ("/code", Template::Literal("```js\n\n```")),
];

/// Names of all recognized commands, in table order.
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|(name, _)| *name)
}

/// Outcome of pressing Enter on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// Suppress the newline; replace the line up to the cursor with `text`.
    /// `cursor` is the new offset from the line start.
    Replace { text: String, cursor: usize },
    /// Not a command; insert the newline as usual.
    Newline,
}

/// Expands `line` if the text before `cursor`, trimmed, is a known command.
///
/// `cursor` is a byte offset within `line`.
pub fn expand(line: &str, cursor: usize) -> Expansion {
    expand_on(line, cursor, Local::now().date_naive())
}

/// [`expand`] with an explicit date for `/date`.
pub fn expand_on(line: &str, cursor: usize, today: NaiveDate) -> Expansion {
    let cursor = clamp_cursor(line, cursor);
    let typed = line[..cursor].trim();
    if !typed.starts_with('/') {
        return Expansion::Newline;
    }

    match COMMANDS.iter().find(|(name, _)| *name == typed) {
        Some((_, template)) => {
            let text = template.render(today);
            Expansion::Replace {
                cursor: text.len(),
                text,
            }
        }
        None => Expansion::Newline,
    }
}

/// Buffer state after Enter was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterEdit {
    pub content: String,
    pub cursor: usize,
    /// Whether a command was expanded instead of inserting a newline.
    pub expanded: bool,
}

/// Handles Enter at `cursor` in a whole editor buffer.
pub fn apply_enter(content: &str, cursor: usize) -> EnterEdit {
    apply_enter_on(content, cursor, Local::now().date_naive())
}

/// [`apply_enter`] with an explicit date for `/date`.
pub fn apply_enter_on(content: &str, cursor: usize, today: NaiveDate) -> EnterEdit {
    let cursor = clamp_cursor(content, cursor);
    let line_start = content[..cursor].rfind('\n').map_or(0, |at| at + 1);
    let line_end = content[cursor..]
        .find('\n')
        .map_or(content.len(), |at| cursor + at);

    match expand_on(&content[line_start..line_end], cursor - line_start, today) {
        Expansion::Replace { text, cursor: offset } => EnterEdit {
            content: format!("{}{}{}", &content[..line_start], text, &content[cursor..]),
            cursor: line_start + offset,
            expanded: true,
        },
        Expansion::Newline => EnterEdit {
            content: format!("{}\n{}", &content[..cursor], &content[cursor..]),
            cursor: cursor + 1,
            expanded: false,
        },
    }
}
