//! Domain model shared by the store, mirror and scheduler.
//!
//! # Responsibility
//! - Define notes, note ids and wallpaper state.
//! - Keep the cursor-bounds invariant inside the note type itself.
//!
//! # Invariants
//! - A note's cursor never exceeds its content length.
//! - Wallpaper mode is one of `slideshow` or `static`.

pub mod note;
pub mod wallpaper;
