//! Best-effort, per-note write-serializing vault mirror.
//!
//! # Responsibility
//! - Hold the process-lifetime vault binding.
//! - Mirror note content to `<id>.md` without ever blocking the editing path.
//!
//! # Invariants
//! - Lanes are keyed by vault file name, so ids that sanitize to the same
//!   file share one lane.
//! - At most one physical write per vault file is in flight at any instant.
//! - While a write is in flight, only the newest requested content waits
//!   behind it; older queued content is discarded.
//! - Once a lane drains, its file holds the last content passed to `mirror`.
//! - A failed or panicked write clears the binding it was issued against and
//!   nothing else; the lane keeps draining either way.

use crate::vault::target::{vault_file_name, VaultPicker, VaultTarget};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Result of a `bind` prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// The user granted a directory.
    Bound { name: String },
    /// The user dismissed the prompt; any earlier binding is kept.
    Cancelled,
}

/// What `mirror` did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorDisposition {
    /// No vault is bound; nothing was scheduled.
    Unbound,
    /// A write task was started for this id.
    Started,
    /// A write is in flight; this content will be written right after it.
    Queued,
}

#[derive(Clone)]
struct Binding {
    generation: u64,
    target: Arc<dyn VaultTarget>,
}

struct QueuedWrite {
    seq: u64,
    content: String,
    binding: Binding,
}

#[derive(Default)]
struct Lane {
    latest_seq: u64,
    committed_seq: u64,
    in_flight: bool,
    queued: Option<QueuedWrite>,
}

#[derive(Default)]
struct MirrorState {
    binding: Option<Binding>,
    next_generation: u64,
    /// Keyed by `vault_file_name(id)`.
    lanes: HashMap<String, Lane>,
}

/// Cheaply cloneable handle to the shared vault mirror.
#[derive(Clone)]
pub struct VaultMirror {
    state: Arc<Mutex<MirrorState>>,
    active_lanes: Arc<watch::Sender<usize>>,
    runtime: Handle,
}

impl VaultMirror {
    /// Creates an unbound mirror whose writes run on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        let (active_lanes, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(MirrorState::default())),
            active_lanes: Arc::new(active_lanes),
            runtime,
        }
    }

    /// Prompts for a vault through `picker` and binds the granted target.
    pub async fn bind(&self, picker: &dyn VaultPicker) -> BindOutcome {
        let Some(target) = picker.pick().await else {
            warn!("event=vault_bind module=vault status=cancelled");
            return BindOutcome::Cancelled;
        };

        let name = target.name().to_string();
        let mut state = self.lock();
        state.next_generation += 1;
        let generation = state.next_generation;
        state.binding = Some(Binding { generation, target });
        info!("event=vault_bind module=vault status=ok generation={generation}");
        BindOutcome::Bound { name }
    }

    /// Drops the current binding; later `mirror` calls become no-ops.
    pub fn unbind(&self) {
        if self.lock().binding.take().is_some() {
            info!("event=vault_unbind module=vault status=ok");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.lock().binding.is_some()
    }

    /// Schedules a full overwrite of `<id>.md` with `content`.
    ///
    /// Returns immediately; the write runs on the mirror's runtime. Ids that
    /// map to the same file name queue behind each other.
    pub fn mirror(&self, id: &str, content: impl Into<String>) -> MirrorDisposition {
        let mut state = self.lock();
        let Some(binding) = state.binding.clone() else {
            return MirrorDisposition::Unbound;
        };

        let file_name = vault_file_name(id);
        let lane = state.lanes.entry(file_name.clone()).or_default();
        lane.latest_seq += 1;
        let write = QueuedWrite {
            seq: lane.latest_seq,
            content: content.into(),
            binding,
        };

        if lane.in_flight {
            if let Some(superseded) = lane.queued.replace(write) {
                debug!(
                    "event=vault_write module=vault status=superseded note_id={id} seq={}",
                    superseded.seq
                );
            }
            return MirrorDisposition::Queued;
        }

        lane.in_flight = true;
        drop(state);

        self.active_lanes.send_modify(|active| *active += 1);
        let mirror = self.clone();
        self.runtime.spawn(async move {
            mirror.drain_lane(file_name, write).await;
        });
        MirrorDisposition::Started
    }

    /// Waits until no note id has a write in flight.
    pub async fn settle(&self) {
        let mut active = self.active_lanes.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = active.wait_for(|count| *count == 0).await;
    }

    /// Sequence number of the last successful write to `id`'s file, 0 if none.
    pub fn committed_seq(&self, id: &str) -> u64 {
        self.lock()
            .lanes
            .get(&vault_file_name(id))
            .map_or(0, |lane| lane.committed_seq)
    }

    /// Writes `first`, then whatever content queued up behind it, until the lane is empty.
    async fn drain_lane(self, file_name: String, first: QueuedWrite) {
        let mut write = first;
        loop {
            let started_at = Instant::now();
            let bytes = write.content.len();
            let result = self.write_isolated(&file_name, &write).await;

            let next = {
                let mut state = self.lock();
                match &result {
                    Ok(()) => debug!(
                        "event=vault_write module=vault status=ok file={file_name} seq={} bytes={bytes} duration_ms={}",
                        write.seq,
                        started_at.elapsed().as_millis()
                    ),
                    Err(err) => {
                        warn!(
                            "event=vault_write module=vault status=error file={file_name} seq={} error={err}",
                            write.seq
                        );
                        // Why: a rebind may have happened while this write was
                        // in flight; only the binding this write used is known bad.
                        let revoked = state
                            .binding
                            .as_ref()
                            .is_some_and(|bound| bound.generation == write.binding.generation);
                        if revoked {
                            state.binding = None;
                            warn!(
                                "event=vault_unbind module=vault status=revoked generation={}",
                                write.binding.generation
                            );
                        }
                    }
                }

                let lane = state.lanes.entry(file_name.clone()).or_default();
                if result.is_ok() && write.seq > lane.committed_seq {
                    lane.committed_seq = write.seq;
                }
                let next = lane.queued.take();
                lane.in_flight = next.is_some();
                next
            };

            match next {
                Some(queued) => write = queued,
                None => break,
            }
        }
        self.active_lanes.send_modify(|active| *active -= 1);
    }

    /// Runs one target write on its own task so a panicking target surfaces
    /// as a failed write instead of killing the lane.
    async fn write_isolated(&self, file_name: &str, write: &QueuedWrite) -> io::Result<()> {
        let target = Arc::clone(&write.binding.target);
        let file_name = file_name.to_string();
        let content = write.content.clone();
        let task = self
            .runtime
            .spawn(async move { target.write_note(&file_name, &content).await });
        match task.await {
            Ok(result) => result,
            Err(join_err) => Err(io::Error::other(format!(
                "vault write task failed: {join_err}"
            ))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MirrorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{BindOutcome, MirrorDisposition, VaultMirror};
    use crate::vault::target::{FixedDirectoryPicker, VaultPicker};
    use tokio::runtime::Handle;

    #[tokio::test]
    async fn unbound_mirror_is_a_no_op() {
        let mirror = VaultMirror::new(Handle::current());
        assert_eq!(mirror.mirror("a", "x"), MirrorDisposition::Unbound);
        mirror.settle().await;
        assert_eq!(mirror.committed_seq("a"), 0);
    }

    #[tokio::test]
    async fn cancelled_bind_keeps_previous_binding() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = VaultMirror::new(Handle::current());

        let granted = FixedDirectoryPicker::new(Some(dir.path().to_path_buf()));
        assert!(matches!(
            mirror.bind(&granted as &dyn VaultPicker).await,
            BindOutcome::Bound { .. }
        ));

        let dismissed = FixedDirectoryPicker::new(None);
        assert_eq!(mirror.bind(&dismissed).await, BindOutcome::Cancelled);
        assert!(mirror.is_bound());

        mirror.unbind();
        assert!(!mirror.is_bound());
    }

    #[tokio::test]
    async fn directory_binding_mirrors_last_content() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = VaultMirror::new(Handle::current());
        mirror
            .bind(&FixedDirectoryPicker::new(Some(dir.path().to_path_buf())))
            .await;

        mirror.mirror("Daily/2026-10-18", "one");
        mirror.mirror("Daily/2026-10-18", "two");
        mirror.mirror("Daily/2026-10-18", "three");
        mirror.settle().await;

        let written = std::fs::read_to_string(dir.path().join("Daily/2026-10-18.md")).unwrap();
        assert_eq!(written, "three");
        assert_eq!(mirror.committed_seq("Daily/2026-10-18"), 3);
    }
}
