//! Two-mode wallpaper rotation scheduler.
//!
//! # Responsibility
//! - Apply wallpapers through the rendering surface.
//! - Run the slideshow timer and persist every index/mode change.
//! - Resume the persisted mode and index after a restart.
//!
//! # Invariants
//! - At most one timer handle is held at any time; starting a timer always
//!   cancels the previous one first.
//! - A cancelled timer can never mutate state: every tick checks the
//!   generation it was started with.
//! - `index < wallpapers.len()` whenever the wallpaper set is non-empty.
//! - An empty wallpaper set leaves the scheduler inert.

use crate::model::wallpaper::{WallpaperMode, WallpaperState};
use crate::repo::state_repo::StateRepository;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Default slideshow period.
pub const DEFAULT_SLIDESHOW_PERIOD: Duration = Duration::from_secs(15);

/// Renders the chosen wallpaper.
///
/// Called while the scheduler holds its state lock; implementations must not
/// call back into the scheduler.
pub trait WallpaperSurface: Send + Sync {
    fn apply(&self, index: usize, wallpaper: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WallpaperError {
    IndexOutOfRange { index: usize, count: usize },
}

impl Display for WallpaperError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, count } => write!(
                f,
                "wallpaper index {index} is out of range for {count} wallpapers"
            ),
        }
    }
}

impl Error for WallpaperError {}

#[derive(Default)]
struct SchedulerState {
    current: WallpaperState,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

#[derive(Clone)]
struct Shared {
    state: Arc<Mutex<SchedulerState>>,
    wallpapers: Arc<[String]>,
    repo: Arc<dyn StateRepository>,
    surface: Arc<dyn WallpaperSurface>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, index: usize) {
        if let Some(wallpaper) = self.wallpapers.get(index) {
            self.surface.apply(index, wallpaper);
        }
    }

    fn persist(&self, state: WallpaperState) {
        match self.repo.save_wallpaper(state) {
            Ok(()) => debug!(
                "event=state_save module=wallpaper status=ok index={} mode={}",
                state.index, state.mode
            ),
            Err(err) => error!("event=state_save module=wallpaper status=error error={err}"),
        }
    }

    /// One slideshow tick. Returns `false` when the timer is stale and must stop.
    fn advance(&self, generation: u64) -> bool {
        let mut state = self.lock();
        // Why: `abort` only lands at the task's next await point, so a tick
        // already past `ticker.tick()` must check it still owns the timer.
        if state.generation != generation || state.current.mode != WallpaperMode::Slideshow {
            return false;
        }
        let count = self.wallpapers.len();
        if count == 0 {
            return false;
        }

        state.current.index = (state.current.index + 1) % count;
        self.apply(state.current.index);
        self.persist(state.current);
        true
    }
}

/// Slideshow/static wallpaper state machine.
pub struct WallpaperScheduler {
    shared: Shared,
    period: Duration,
    runtime: Handle,
}

impl WallpaperScheduler {
    /// Creates a scheduler in its default state; call `restore` to resume persisted state.
    ///
    /// A zero `period` falls back to [`DEFAULT_SLIDESHOW_PERIOD`].
    pub fn new(
        wallpapers: Vec<String>,
        period: Duration,
        repo: Arc<dyn StateRepository>,
        surface: Arc<dyn WallpaperSurface>,
        runtime: Handle,
    ) -> Self {
        let period = if period.is_zero() {
            DEFAULT_SLIDESHOW_PERIOD
        } else {
            period
        };
        Self {
            shared: Shared {
                state: Arc::new(Mutex::new(SchedulerState::default())),
                wallpapers: wallpapers.into(),
                repo,
                surface,
            },
            period,
            runtime,
        }
    }

    /// Resumes persisted state: slideshow restarts from `index`, static just shows it.
    ///
    /// Missing values default to index 0 and slideshow mode; an index outside
    /// the wallpaper set defaults to 0.
    pub fn restore(&self, index: Option<usize>, mode: Option<WallpaperMode>) {
        let count = self.shared.wallpapers.len();
        let index = match index {
            Some(index) if index < count => index,
            Some(index) => {
                warn!(
                    "event=wallpaper_restore module=wallpaper status=defaulted index={index} count={count}"
                );
                0
            }
            None => 0,
        };
        let mode = mode.unwrap_or_default();

        let mut state = self.shared.lock();
        self.cancel_timer(&mut state);
        state.current = WallpaperState { index, mode };
        self.shared.apply(index);
        if mode == WallpaperMode::Slideshow {
            self.spawn_timer(&mut state);
        }
        info!("event=wallpaper_restore module=wallpaper status=ok index={index} mode={mode}");
    }

    /// Switches to slideshow mode, showing the current wallpaper right away.
    pub fn start_slideshow(&self) {
        let mut state = self.shared.lock();
        self.cancel_timer(&mut state);
        state.current.mode = WallpaperMode::Slideshow;
        self.shared.apply(state.current.index);
        self.shared.persist(state.current);
        self.spawn_timer(&mut state);
        info!(
            "event=wallpaper_mode module=wallpaper status=ok mode=slideshow index={}",
            state.current.index
        );
    }

    /// Stops any rotation and pins wallpaper `index`.
    ///
    /// # Errors
    /// `IndexOutOfRange` when `index` is not in the wallpaper set; state is unchanged.
    pub fn select_static(&self, index: usize) -> Result<(), WallpaperError> {
        let count = self.shared.wallpapers.len();
        if index >= count {
            return Err(WallpaperError::IndexOutOfRange { index, count });
        }

        let mut state = self.shared.lock();
        self.cancel_timer(&mut state);
        state.current = WallpaperState {
            index,
            mode: WallpaperMode::Static,
        };
        self.shared.apply(index);
        self.shared.persist(state.current);
        info!("event=wallpaper_mode module=wallpaper status=ok mode=static index={index}");
        Ok(())
    }

    /// Cancels the slideshow timer without changing the persisted mode.
    pub fn shutdown(&self) {
        let mut state = self.shared.lock();
        self.cancel_timer(&mut state);
    }

    pub fn state(&self) -> WallpaperState {
        self.shared.lock().current
    }

    /// Number of live timers: 0 or 1.
    pub fn active_timers(&self) -> usize {
        let state = self.shared.lock();
        usize::from(state.timer.as_ref().is_some_and(|timer| !timer.is_finished()))
    }

    pub fn wallpapers(&self) -> &[String] {
        &self.shared.wallpapers
    }

    fn cancel_timer(&self, state: &mut SchedulerState) {
        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
            debug!("event=wallpaper_timer module=wallpaper status=cancelled");
        }
    }

    fn spawn_timer(&self, state: &mut SchedulerState) {
        if self.shared.wallpapers.is_empty() {
            return;
        }
        let generation = state.generation;
        let shared = self.shared.clone();
        let period = self.period;
        state.timer = Some(self.runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !shared.advance(generation) {
                    break;
                }
            }
        }));
        debug!(
            "event=wallpaper_timer module=wallpaper status=started period_ms={}",
            period.as_millis()
        );
    }
}

impl Drop for WallpaperScheduler {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }
}
