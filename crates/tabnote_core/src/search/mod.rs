//! Note list filtering.
//!
//! # Responsibility
//! - Match note content against the search box text.
//!
//! # Invariants
//! - Results are sorted by ascending note id.

pub mod filter;
