use std::sync::{Arc, Mutex};
use std::time::Duration;
use tabnote_core::{
    SqliteStateRepository, StateRepository, WallpaperError, WallpaperMode, WallpaperScheduler,
    WallpaperState, WallpaperSurface,
};
use tokio::runtime::Handle;

const PERIOD: Duration = Duration::from_secs(15);

#[derive(Default)]
struct RecordingSurface {
    applied: Mutex<Vec<(usize, String)>>,
}

impl RecordingSurface {
    fn indices(&self) -> Vec<usize> {
        self.applied
            .lock()
            .unwrap()
            .iter()
            .map(|(index, _)| *index)
            .collect()
    }

    fn clear(&self) {
        self.applied.lock().unwrap().clear();
    }
}

impl WallpaperSurface for RecordingSurface {
    fn apply(&self, index: usize, wallpaper: &str) {
        self.applied
            .lock()
            .unwrap()
            .push((index, wallpaper.to_string()));
    }
}

struct Fixture {
    repo: Arc<SqliteStateRepository>,
    surface: Arc<RecordingSurface>,
    scheduler: WallpaperScheduler,
}

fn fixture(count: usize) -> Fixture {
    let repo = Arc::new(SqliteStateRepository::open_in_memory().unwrap());
    let surface = Arc::new(RecordingSurface::default());
    let wallpapers = (1..=count).map(|n| format!("bg{n}.jpg")).collect();
    let scheduler = WallpaperScheduler::new(
        wallpapers,
        PERIOD,
        Arc::clone(&repo) as Arc<dyn StateRepository>,
        Arc::clone(&surface) as Arc<dyn WallpaperSurface>,
        Handle::current(),
    );
    Fixture {
        repo,
        surface,
        scheduler,
    }
}

async fn elapse_periods(periods: u32) {
    tokio::time::sleep(PERIOD * periods + Duration::from_millis(1)).await;
}

fn persisted(repo: &SqliteStateRepository) -> (Option<usize>, Option<WallpaperMode>) {
    let state = repo.load_state().unwrap();
    (state.wallpaper_index, state.wallpaper_mode)
}

#[tokio::test(start_paused = true)]
async fn slideshow_applies_immediately_and_advances_each_period() {
    let f = fixture(3);

    f.scheduler.start_slideshow();
    assert_eq!(f.surface.indices(), vec![0]);
    assert_eq!(f.scheduler.active_timers(), 1);

    elapse_periods(1).await;
    assert_eq!(f.surface.indices(), vec![0, 1]);
    assert_eq!(persisted(&f.repo), (Some(1), Some(WallpaperMode::Slideshow)));

    elapse_periods(2).await;
    assert_eq!(f.surface.indices(), vec![0, 1, 2, 0]);
    assert_eq!(
        f.scheduler.state(),
        WallpaperState {
            index: 0,
            mode: WallpaperMode::Slideshow
        }
    );
}

#[tokio::test(start_paused = true)]
async fn repeated_starts_leave_a_single_effective_timer() {
    let f = fixture(3);
    for _ in 0..5 {
        f.scheduler.start_slideshow();
        assert_eq!(f.scheduler.active_timers(), 1);
    }
    f.surface.clear();

    elapse_periods(1).await;
    assert_eq!(f.surface.indices(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn interleaved_transitions_never_hold_more_than_one_timer() {
    let f = fixture(3);
    let steps: [Option<usize>; 8] = [None, Some(1), None, None, Some(2), Some(0), None, Some(2)];

    for step in steps {
        match step {
            None => f.scheduler.start_slideshow(),
            Some(index) => f.scheduler.select_static(index).unwrap(),
        }
        assert!(f.scheduler.active_timers() <= 1);
    }

    assert_eq!(f.scheduler.active_timers(), 0);
    f.surface.clear();
    elapse_periods(4).await;
    assert!(f.surface.indices().is_empty());
    assert_eq!(f.scheduler.state().index, 2);
}

#[tokio::test(start_paused = true)]
async fn select_static_stops_rotation_and_persists() {
    let f = fixture(3);
    f.scheduler.start_slideshow();
    f.scheduler.select_static(2).unwrap();

    assert_eq!(f.scheduler.active_timers(), 0);
    assert_eq!(f.surface.indices(), vec![0, 2]);
    assert_eq!(persisted(&f.repo), (Some(2), Some(WallpaperMode::Static)));

    elapse_periods(3).await;
    assert_eq!(f.surface.indices(), vec![0, 2]);
}

#[tokio::test]
async fn select_static_rejects_out_of_range_index() {
    let f = fixture(3);
    let err = f.scheduler.select_static(3).unwrap_err();

    assert_eq!(err, WallpaperError::IndexOutOfRange { index: 3, count: 3 });
    assert!(f.surface.indices().is_empty());
    assert_eq!(f.scheduler.state(), WallpaperState::default());
}

#[tokio::test(start_paused = true)]
async fn restore_static_shows_persisted_index_without_timer() {
    let f = fixture(3);
    f.scheduler
        .restore(Some(2), Some(WallpaperMode::Static));

    assert_eq!(f.surface.indices(), vec![2]);
    assert_eq!(f.scheduler.active_timers(), 0);

    elapse_periods(2).await;
    assert_eq!(f.surface.indices(), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn restore_slideshow_resumes_from_persisted_index() {
    let f = fixture(3);
    f.scheduler
        .restore(Some(1), Some(WallpaperMode::Slideshow));

    assert_eq!(f.surface.indices(), vec![1]);
    assert_eq!(f.scheduler.active_timers(), 1);

    elapse_periods(2).await;
    assert_eq!(f.surface.indices(), vec![1, 2, 0]);
}

#[tokio::test(start_paused = true)]
async fn restore_defaults_invalid_index_and_missing_mode() {
    let f = fixture(3);
    f.scheduler.restore(Some(7), None);

    assert_eq!(f.surface.indices(), vec![0]);
    assert_eq!(f.scheduler.state().mode, WallpaperMode::Slideshow);
    assert_eq!(f.scheduler.active_timers(), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_wallpaper_set_is_inert() {
    let f = fixture(0);
    f.scheduler.restore(Some(0), Some(WallpaperMode::Slideshow));
    f.scheduler.start_slideshow();

    assert_eq!(f.scheduler.active_timers(), 0);
    assert!(matches!(
        f.scheduler.select_static(0),
        Err(WallpaperError::IndexOutOfRange { count: 0, .. })
    ));
    elapse_periods(2).await;
    assert!(f.surface.indices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_and_drop_cancel_the_timer() {
    let f = fixture(3);
    f.scheduler.start_slideshow();
    f.scheduler.shutdown();
    assert_eq!(f.scheduler.active_timers(), 0);

    f.scheduler.start_slideshow();
    let surface = Arc::clone(&f.surface);
    drop(f);
    surface.clear();

    elapse_periods(2).await;
    assert!(surface.indices().is_empty());
}
