//! Line-level slash commands for the editor.
//!
//! # Responsibility
//! - Recognize a fixed table of `/command` lines on Enter.
//! - Produce replacement text and the new cursor position.
//!
//! # Invariants
//! - Pure: no I/O and no state besides the current date for `/date`.
//! - Unknown lines never change content beyond the normal newline.

pub mod expander;
