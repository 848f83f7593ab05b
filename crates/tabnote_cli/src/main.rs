//! Interactive terminal shell over `tabnote_core`.
//!
//! # Responsibility
//! - Stand in for the widget UI: editor input, note list, wallpaper picker,
//!   vault prompt and export button.
//! - Keep all state decisions inside the core session.

use log::{info, warn};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tabnote_core::{
    core_version, init_logging, BindOutcome, FixedDirectoryPicker, Session, WallpaperSurface,
    WidgetConfig,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Handle;

const HELP: &str = "\
plain text      type a line into the active note (Enter expands /todo /date /heading /code)
:open <id>      switch to (or create) a note
:list [query]   list notes whose content contains query
:show           print the active note
:bind [dir]     connect a vault directory (no dir = dismiss the prompt)
:unbind         disconnect the vault
:slideshow      rotate wallpapers
:wallpaper <n>  pin wallpaper n
:export [dir]   write the active note as <id>.md (default: current dir)
:quit           exit";

struct ConsoleSurface;

impl WallpaperSurface for ConsoleSurface {
    fn apply(&self, index: usize, wallpaper: &str) {
        println!("[wallpaper {index}] {wallpaper}");
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Type(&'a str),
    Open(&'a str),
    List(&'a str),
    Show,
    Bind(Option<&'a str>),
    Unbind,
    Slideshow,
    Wallpaper(&'a str),
    Export(Option<&'a str>),
    Help,
    Quit,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let Some(rest) = line.strip_prefix(':') else {
            return Self::Type(line);
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest.trim(), ""),
        };
        let optional = (!arg.is_empty()).then_some(arg);
        match name {
            "open" if !arg.is_empty() => Self::Open(arg),
            "list" => Self::List(arg),
            "show" => Self::Show,
            "bind" => Self::Bind(optional),
            "unbind" => Self::Unbind,
            "slideshow" => Self::Slideshow,
            "wallpaper" => Self::Wallpaper(arg),
            "export" => Self::Export(optional),
            "help" => Self::Help,
            "quit" | "q" => Self::Quit,
            _ => Self::Unknown(name),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tabnote: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => WidgetConfig::load(path)?,
        None => WidgetConfig::default(),
    };
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let mut session =
        Session::open_with_config(&config, Arc::new(ConsoleSurface), Handle::current())?;
    info!("event=cli_start module=cli status=ok version={}", core_version());
    println!(
        "tabnote {} - active note `{}` (:help for commands)",
        core_version(),
        session.notes().active_note_id()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Quit => break,
            command => handle(&mut session, command).await,
        }
    }

    session.shutdown().await;
    Ok(())
}

async fn handle(session: &mut Session, command: Command<'_>) {
    match command {
        Command::Type(text) => {
            let active = session.notes().active_note();
            let (before, after) = active.content.split_at(active.cursor);
            let content = format!("{before}{text}{after}");
            let cursor = active.cursor + text.len();
            session.notes_mut().update_active(content, cursor);
            session.press_enter();
        }
        Command::Open(id) => {
            let note = session.notes_mut().switch_active(id);
            println!("-- {} ({} bytes, cursor {})", note.id, note.content.len(), note.cursor);
        }
        Command::List(query) => {
            let active = session.notes().active_note_id().to_string();
            for id in session.notes().filter(query) {
                let marker = if id == active { '*' } else { ' ' };
                println!("{marker} {id}");
            }
        }
        Command::Show => println!("{}", session.notes().active_note().content),
        Command::Bind(dir) => {
            let picker = FixedDirectoryPicker::new(dir.map(PathBuf::from));
            match session.bind_vault(&picker).await {
                BindOutcome::Bound { name } => println!("Connected to vault: {name}"),
                BindOutcome::Cancelled => println!("Vault connection cancelled"),
            }
        }
        Command::Unbind => session.vault().unbind(),
        Command::Slideshow => session.wallpaper().start_slideshow(),
        Command::Wallpaper(arg) => match arg.parse::<usize>() {
            Ok(index) => {
                if let Err(err) = session.wallpaper().select_static(index) {
                    println!("{err}");
                }
            }
            Err(_) => println!("usage: :wallpaper <n>"),
        },
        Command::Export(dir) => {
            let exported = session.export_active();
            match exported.write_to(dir.unwrap_or(".")) {
                Ok(path) => println!("exported {}", path.display()),
                Err(err) => println!("export failed: {err}"),
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Unknown(name) => {
            warn!("event=cli_command module=cli status=unknown name={name}");
            println!("unknown command `:{name}` (:help for commands)");
        }
        Command::Quit => {}
    }
}
