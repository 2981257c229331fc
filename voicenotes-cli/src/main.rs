// Terminal front end for Voice Notes

mod render;
mod settings;

use clap::{Parser, Subcommand};
use render::{render_note, render_state};
use settings::{load_settings, save_settings, settings_file_path, AppSettings};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use voicenotes_core::{
    NotesRepository, NotesUiState, NotesViewModel, Session, SqliteDocumentStore,
};

#[derive(Parser)]
#[command(name = "voicenotes")]
#[command(about = "Voice Notes - short notes with live search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file to use instead of the default location
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the principal that owns subsequent notes
    Login {
        /// User id to sign in as
        user_id: String,
    },

    /// Forget the signed-in principal
    Logout,

    /// Save a new note; content is read from stdin when omitted
    Add {
        /// Optional title
        #[arg(short, long, default_value = "")]
        title: String,

        /// Note text (e.g. a dictation result)
        content: Option<String>,
    },

    /// Replace the title and/or content of an existing note
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        content: Option<String>,
    },

    /// Print one note
    Show { id: String },

    /// Delete a note
    Rm { id: String },

    /// Print the notes list once
    List {
        /// Only notes whose title or content contains this text
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Keep printing the notes list as it changes, until Ctrl-C
    Watch {
        #[arg(short, long, default_value = "")]
        search: String,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings_path = cli.settings.clone().unwrap_or_else(settings_file_path);
    match run(cli.command, &settings_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, settings_path: &Path) -> Result<(), String> {
    let mut settings = load_settings(settings_path);

    match command {
        Commands::Login { user_id } => {
            if user_id.trim().is_empty() {
                return Err("User id cannot be empty".to_string());
            }
            settings.principal_id = Some(user_id.clone());
            save_settings(settings_path, &settings)?;
            println!("Signed in as {user_id}");
        }
        Commands::Logout => {
            settings.principal_id = None;
            save_settings(settings_path, &settings)?;
            println!("Signed out");
        }
        Commands::Add { title, content } => {
            let content = match content {
                Some(content) => content,
                None => read_stdin()?,
            };
            let (_, vm) = open(&settings)?;
            let id = vm
                .save_note(&title, &content)
                .await
                .map_err(|e| e.user_message())?;
            println!("Saved note {id}");
        }
        Commands::Edit { id, title, content } => {
            let (repository, vm) = open(&settings)?;
            let mut note = repository
                .fetch(&id)
                .await
                .map_err(|e| e.user_message())?
                .ok_or_else(|| format!("Note not found: {id}"))?;
            if let Some(title) = title {
                note.title = title.trim().to_string();
            }
            if let Some(content) = content {
                note.content = content.trim().to_string();
            }
            vm.update_note(note).await.map_err(|e| e.user_message())?;
            println!("Saved note {id}");
        }
        Commands::Show { id } => {
            let (repository, _) = open(&settings)?;
            let note = repository
                .get(&id)
                .await
                .map_err(|e| e.user_message())?
                .ok_or_else(|| format!("Note not found: {id}"))?;
            println!("{}", render_note(&note, chrono::Utc::now()));
        }
        Commands::Rm { id } => {
            let (_, vm) = open(&settings)?;
            vm.delete_note(&id).await.map_err(|e| e.user_message())?;
            println!("Deleted note {id}");
        }
        Commands::List { search } => {
            let (_, mut vm) = open(&settings)?;
            vm.on_search_query_changed(search.clone());
            let mut state = vm.state();
            vm.resume();
            let first = state
                .wait_for(|s| *s != NotesUiState::Loading)
                .await
                .map_err(|e| e.to_string())?
                .clone();
            println!("{}", render_state(&first, &search, chrono::Utc::now()));
            if let NotesUiState::Error(message) = first {
                return Err(message);
            }
        }
        Commands::Watch { search } => {
            let (_, mut vm) = open(&settings)?;
            vm.on_search_query_changed(search.clone());
            let mut state = vm.state();
            vm.resume();
            if let NotesUiState::Error(message) = vm.current_state() {
                return Err(message);
            }
            loop {
                tokio::select! {
                    changed = state.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let current = state.borrow_and_update().clone();
                        if current != NotesUiState::Loading {
                            println!("{}\n", render_state(&current, &search, chrono::Utc::now()));
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            vm.pause();
        }
    }
    Ok(())
}

/// Wires store, session, repository and view model from `settings`.
fn open(settings: &AppSettings) -> Result<(Arc<NotesRepository>, NotesViewModel), String> {
    let path = Path::new(&settings.database_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create data directory: {e}"))?;
    }
    let store = SqliteDocumentStore::open(path).map_err(|e| e.user_message())?;
    let session = match &settings.principal_id {
        Some(principal) => Session::signed_in(principal.clone()),
        None => Session::new(),
    };
    let repository = Arc::new(NotesRepository::new(Arc::new(store), Arc::new(session)));
    let vm = NotesViewModel::new(Arc::clone(&repository));
    Ok((repository, vm))
}

fn read_stdin() -> Result<String, String> {
    let mut content = String::new();
    std::io::stdin()
        .read_to_string(&mut content)
        .map_err(|e| format!("Failed to read note from stdin: {e}"))?;
    Ok(content)
}
