//! External vault mirroring.
//!
//! # Responsibility
//! - Model the user-granted vault capability and its grant prompt.
//! - Serialize and coalesce mirror writes per note id.
//!
//! # Invariants
//! - The binding lives for the process only and is never persisted.
//! - Vault failures never reach the note-editing path.

pub mod mirror;
pub mod target;
