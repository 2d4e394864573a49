//! FFI use-case API for the notes UI.
//!
//! # Responsibility
//! - Expose the note store operations the UI needs (create, update, delete,
//!   list, get) as flat, synchronous functions.
//! - Own the single process-wide note session.
//! - Apply presentation-side input limits (title length) before calling core.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - A mutation response is only returned after the store has flushed it.
//! - Broken durable storage never makes the API unusable; it degrades to an
//!   in-memory session and reports warnings.

use log::{info, warn};
use notes_core::db::open_db;
use notes_core::{
    core_version as core_version_inner, default_log_level as default_log_level_inner,
    init_logging as init_logging_inner, ping as ping_inner,
    Commit, DisabledSlotStore, Note, NoteDraft, NoteStore, NoteStoreError, PersistenceBridge,
    SlotStore, SqliteSlotStore, SystemClock, TITLE_MAX_CHARS,
};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};

const NOTES_DB_FILE_NAME: &str = "minimal_notes.sqlite3";
const NOTES_DB_PATH_ENV: &str = "MINIMAL_NOTES_DB_PATH";

static NOTES_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static SESSION: OnceLock<Mutex<Session>> = OnceLock::new();

type Session = NoteStore<Box<dyn SlotStore + Send>, SystemClock>;

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Exposes core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - `level`: `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory for rolling log files.
/// - Returns empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Sets the SQLite file used for the notes slot.
///
/// # FFI contract
/// - Must be called before the first note operation; later calls fail.
/// - Returns empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_notes_db_path(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    if SESSION.get().is_some() {
        return "notes session already started; db_path can no longer change".to_string();
    }

    let requested = PathBuf::from(trimmed);
    match NOTES_DB_PATH.set(requested.clone()) {
        Ok(()) => String::new(),
        Err(_) if resolve_notes_db_path() == requested => String::new(),
        Err(_) => format!(
            "db_path already configured as `{}`",
            resolve_notes_db_path().display()
        ),
    }
}

/// Note projection returned to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: String,
    pub title: String,
    /// Title for list rendering (`[Untitled]` when empty).
    pub display_title: String,
    pub content: String,
    pub created_ms: i64,
    pub updated_ms: i64,
}

/// Result envelope for create/update/delete requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    /// Whether the request was accepted. Discarded blank drafts are `ok`.
    pub ok: bool,
    /// Whether the collection changed.
    pub changed: bool,
    /// Created or updated note.
    pub note: Option<NoteItem>,
    /// Set when the change is applied in memory but could not be persisted.
    pub warning: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl NoteActionResponse {
    fn committed<T>(commit: &Commit<T>, note: Option<NoteItem>, message: &str) -> Self {
        Self {
            ok: true,
            changed: true,
            note,
            warning: commit.persist_warning.as_ref().map(ToString::to_string),
            message: message.to_string(),
        }
    }

    fn unchanged(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            changed: false,
            note: None,
            warning: None,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            note: None,
            warning: None,
            message: message.into(),
        }
    }
}

/// Sorted note list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesListResponse {
    /// Notes sorted by last update, newest first.
    pub items: Vec<NoteItem>,
    pub message: String,
}

/// Creates a note from the editor form.
///
/// # FFI contract
/// - Titles longer than 100 UTF-16 code units are truncated.
/// - Blank title + content is discarded with `ok=true, changed=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn request_create(title: String, content: String) -> NoteActionResponse {
    with_session(|session| create_in(session, title, content))
        .unwrap_or_else(NoteActionResponse::failure)
}

/// Replaces title/content of an existing note.
///
/// # FFI contract
/// - Unknown ids return `ok=false`.
/// - Blank title + content leaves the note unchanged with `ok=true`.
#[flutter_rust_bridge::frb(sync)]
pub fn request_update(id: String, title: String, content: String) -> NoteActionResponse {
    with_session(|session| update_in(session, &id, title, content))
        .unwrap_or_else(NoteActionResponse::failure)
}

/// Deletes a note. The UI confirms with the user before calling this.
///
/// # FFI contract
/// - Never fails for unknown ids; returns `changed=false` instead.
#[flutter_rust_bridge::frb(sync)]
pub fn request_delete(id: String) -> NoteActionResponse {
    with_session(|session| delete_in(session, &id)).unwrap_or_else(NoteActionResponse::failure)
}

/// Lists notes newest-first. The UI calls this after every mutation.
#[flutter_rust_bridge::frb(sync)]
pub fn list_notes() -> NotesListResponse {
    with_session(|session| list_in(session)).unwrap_or_else(|err| NotesListResponse {
        items: Vec::new(),
        message: err,
    })
}

/// Loads one note for the edit form.
#[flutter_rust_bridge::frb(sync)]
pub fn get_note(id: String) -> Option<NoteItem> {
    with_session(|session| session.get(id.as_str()))
        .ok()
        .flatten()
        .map(|note| to_note_item(&note))
}

/// Log level the host should pass to `init_logging` for this build.
#[flutter_rust_bridge::frb(sync)]
pub fn default_log_level() -> String {
    default_log_level_inner().to_owned()
}

fn create_in(session: &mut Session, title: String, content: String) -> NoteActionResponse {
    match session.create(editor_draft(title, content)) {
        Some(commit) => {
            let item = to_note_item(&commit.value);
            NoteActionResponse::committed(&commit, Some(item), "Note created.")
        }
        None => NoteActionResponse::unchanged("Empty note discarded."),
    }
}

fn update_in(session: &mut Session, id: &str, title: String, content: String) -> NoteActionResponse {
    match session.update(id, editor_draft(title, content)) {
        Ok(Some(commit)) => {
            let item = to_note_item(&commit.value);
            NoteActionResponse::committed(&commit, Some(item), "Note updated.")
        }
        Ok(None) => NoteActionResponse::unchanged("Empty edit discarded."),
        Err(err @ NoteStoreError::NotFound(_)) => {
            NoteActionResponse::failure(format!("request_update failed: {err}"))
        }
    }
}

fn delete_in(session: &mut Session, id: &str) -> NoteActionResponse {
    let commit = session.delete(id);
    if commit.value {
        NoteActionResponse::committed(&commit, None, "Note deleted.")
    } else {
        NoteActionResponse::unchanged("Note not found; nothing deleted.")
    }
}

fn list_in(session: &Session) -> NotesListResponse {
    let items = session.list().iter().map(to_note_item).collect::<Vec<_>>();
    let message = if items.is_empty() {
        "No notes yet.".to_string()
    } else {
        format!("{} note(s).", items.len())
    };
    NotesListResponse { items, message }
}

/// Applies the editor's `maxLength`, which counts UTF-16 code units.
fn editor_draft(title: String, content: String) -> NoteDraft {
    if title.encode_utf16().count() <= TITLE_MAX_CHARS {
        return NoteDraft::new(title, content);
    }

    let mut units = 0;
    let truncated = title
        .chars()
        .take_while(|c| {
            units += c.len_utf16();
            units <= TITLE_MAX_CHARS
        })
        .collect::<String>();
    NoteDraft::new(truncated, content)
}

fn to_note_item(note: &Note) -> NoteItem {
    NoteItem {
        id: note.id.clone(),
        title: note.title.clone(),
        display_title: note.display_title().to_string(),
        content: note.content.clone(),
        created_ms: note.created,
        updated_ms: note.updated,
    }
}

fn resolve_notes_db_path() -> PathBuf {
    NOTES_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(NOTES_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(NOTES_DB_FILE_NAME)
        })
        .clone()
}

fn open_session() -> Session {
    open_session_at(&resolve_notes_db_path())
}

/// Opens a session over `db_path`, degrading to an in-memory session whose
/// writes all fail when the database cannot be opened.
fn open_session_at(db_path: &Path) -> Session {
    let slots: Box<dyn SlotStore + Send> = match open_db(db_path) {
        Ok(conn) => Box::new(SqliteSlotStore::new(conn)),
        Err(err) => {
            warn!(
                "event=session_open module=ffi status=degraded error_code=db_open_failed error={err}"
            );
            Box::new(DisabledSlotStore::new(format!(
                "cannot open `{}`: {err}",
                db_path.display()
            )))
        }
    };
    let session = NoteStore::open(PersistenceBridge::new(slots), SystemClock);
    info!(
        "event=session_open module=ffi status=ok slot={} count={}",
        session.bridge().slot_key(),
        session.len()
    );
    session
}

fn lock_session() -> MutexGuard<'static, Session> {
    let session = SESSION.get_or_init(|| Mutex::new(open_session()));
    // A poisoned lock still guards a consistent store; every mutation finishes
    // before the guard is released.
    session
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn with_session<T>(f: impl FnOnce(&mut Session) -> T) -> Result<T, String> {
    let mut guard = lock_session();
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&mut guard)))
        .map_err(|_| "notes session operation panicked".to_string())
}
