//! Persistence boundary for the durable widget state.
//!
//! # Responsibility
//! - Define the state read/write contract used by the store and scheduler.
//! - Keep SQLite and JSON encoding details out of the service layer.
//!
//! # Invariants
//! - Loading never fails because of malformed content, only on I/O failure.

pub mod state_repo;
