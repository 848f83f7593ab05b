//! Note use-case services.
//!
//! # Responsibility
//! - Own the in-memory note collection and the active-note pointer.
//! - Write every mutation through to the state repository.
//! - Hand content to the vault mirror without waiting for it.
//!
//! # See also
//! - `crate::repo::state_repo` for the durable schema.

pub mod export;
pub mod note_store;
