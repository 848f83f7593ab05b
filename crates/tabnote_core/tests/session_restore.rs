use std::sync::{Arc, Mutex};
use tabnote_core::db::DbError;
use tabnote_core::{
    BindOutcome, FixedDirectoryPicker, LoadedState, NoteCollection, RepoError, RepoResult,
    Session, SessionError, SqliteStateRepository, StateRepository, WallpaperMode, WallpaperState,
    WallpaperSurface, WidgetConfig,
};
use tokio::runtime::Handle;

#[derive(Default)]
struct RecordingSurface {
    applied: Mutex<Vec<usize>>,
}

impl WallpaperSurface for RecordingSurface {
    fn apply(&self, index: usize, _wallpaper: &str) {
        self.applied.lock().unwrap().push(index);
    }
}

struct UnavailableRepo;

impl StateRepository for UnavailableRepo {
    fn load_state(&self) -> RepoResult<LoadedState> {
        Err(RepoError::Db(DbError::Sqlite(rusqlite::Error::InvalidQuery)))
    }

    fn save_notes(&self, _notes: &NoteCollection, _active_note_id: &str) -> RepoResult<()> {
        Ok(())
    }

    fn save_wallpaper(&self, _state: WallpaperState) -> RepoResult<()> {
        Ok(())
    }
}

fn config_in(dir: &tempfile::TempDir) -> WidgetConfig {
    WidgetConfig {
        db_path: dir.path().join("tabnote.sqlite3"),
        ..WidgetConfig::default()
    }
}

fn open_session(
    repo: Arc<dyn StateRepository>,
    surface: &Arc<RecordingSurface>,
) -> Result<Session, SessionError> {
    Session::open(
        &WidgetConfig::default(),
        repo,
        Arc::clone(surface) as Arc<dyn WallpaperSurface>,
        Handle::current(),
    )
}

#[tokio::test]
async fn persisted_static_wallpaper_restores_without_timer() {
    let repo = Arc::new(SqliteStateRepository::open_in_memory().unwrap());
    repo.save_wallpaper(WallpaperState {
        index: 2,
        mode: WallpaperMode::Static,
    })
    .unwrap();
    let surface = Arc::new(RecordingSurface::default());

    let session = open_session(repo, &surface).unwrap();

    assert_eq!(*surface.applied.lock().unwrap(), vec![2]);
    assert_eq!(session.wallpaper().active_timers(), 0);
    assert_eq!(session.wallpaper().state().mode, WallpaperMode::Static);
}

#[tokio::test]
async fn first_run_defaults_to_daily_note_and_slideshow() {
    let repo = Arc::new(SqliteStateRepository::open_in_memory().unwrap());
    let surface = Arc::new(RecordingSurface::default());

    let session = open_session(repo, &surface).unwrap();

    assert!(session.notes().active_note_id().starts_with("Daily/"));
    assert_eq!(session.notes().active_note().content, "");
    assert_eq!(session.wallpaper().state().index, 0);
    assert_eq!(session.wallpaper().active_timers(), 1);
    session.shutdown().await;
    assert_eq!(session.wallpaper().active_timers(), 0);
}

#[tokio::test]
async fn unreadable_state_is_fatal_at_open() {
    let surface = Arc::new(RecordingSurface::default());
    let result = open_session(Arc::new(UnavailableRepo), &surface);
    assert!(matches!(result, Err(SessionError::Storage(_))));
}

#[tokio::test]
async fn notes_and_wallpaper_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let surface = Arc::new(RecordingSurface::default());

    {
        let mut session = Session::open_with_config(
            &config,
            Arc::clone(&surface) as Arc<dyn WallpaperSurface>,
            Handle::current(),
        )
        .unwrap();
        session.notes_mut().switch_active("Groceries");
        session.notes_mut().update_active("Buy Milk", 4);
        session.wallpaper().select_static(1).unwrap();
        session.shutdown().await;
    }

    let session = Session::open_with_config(
        &config,
        Arc::clone(&surface) as Arc<dyn WallpaperSurface>,
        Handle::current(),
    )
    .unwrap();
    assert_eq!(session.notes().active_note_id(), "Groceries");
    assert_eq!(session.notes().active_note().content, "Buy Milk");
    assert_eq!(session.notes().active_note().cursor, 4);
    assert_eq!(
        session.wallpaper().state(),
        WallpaperState {
            index: 1,
            mode: WallpaperMode::Static
        }
    );
    assert_eq!(session.wallpaper().active_timers(), 0);
}

#[tokio::test]
async fn press_enter_expands_command_on_active_note() {
    let repo = Arc::new(SqliteStateRepository::open_in_memory().unwrap());
    let surface = Arc::new(RecordingSurface::default());
    let mut session = open_session(repo, &surface).unwrap();

    session.notes_mut().update_active("list\n/todo", 10);
    let note = session.press_enter();
    assert_eq!(note.content, "list\n- [ ] ");
    assert_eq!(note.cursor, 11);

    let note = session.press_enter();
    assert_eq!(note.content, "list\n- [ ] \n");
    assert_eq!(note.cursor, 12);
    session.shutdown().await;
}

#[tokio::test]
async fn bound_vault_receives_edits_until_shutdown_drains() {
    let vault_dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(SqliteStateRepository::open_in_memory().unwrap());
    let surface = Arc::new(RecordingSurface::default());
    let mut session = open_session(repo, &surface).unwrap();

    let outcome = session
        .bind_vault(&FixedDirectoryPicker::new(Some(vault_dir.path().to_path_buf())))
        .await;
    assert!(matches!(outcome, BindOutcome::Bound { .. }));

    session.notes_mut().switch_active("Inbox");
    session.notes_mut().update_active("v1", 2);
    session.notes_mut().update_active("v2", 2);
    session.shutdown().await;

    let written = std::fs::read_to_string(vault_dir.path().join("Inbox.md")).unwrap();
    assert_eq!(written, "v2");
}
