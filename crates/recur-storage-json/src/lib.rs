use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, NaiveDateTime, Utc};
use recur_core::{
    storage::{lock_state, LedgerState, LedgerStore, StagedUnit, UnitOfWork},
    CoreError,
};
use tracing::{debug, info};

const LEDGER_FILE: &str = "ledger.json";
const BACKUPS_DIR: &str = "backups";
const BACKUP_PREFIX: &str = "ledger";
const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
pub const DEFAULT_RETENTION: usize = 5;

/// Describes a persisted backup of the ledger file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub path: PathBuf,
}

/// Ledger store persisted as a single JSON document. The committed state is cached in memory;
/// every commit rewrites the file atomically before the cache is updated.
pub struct JsonLedgerStore {
    ledger_path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
    state: Mutex<LedgerState>,
}

impl JsonLedgerStore {
    /// Opens (or initializes) the store rooted at `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        Self::with_retention(data_dir, DEFAULT_RETENTION)
    }

    pub fn with_retention(data_dir: impl Into<PathBuf>, retention: usize) -> Result<Self, CoreError> {
        let data_dir = data_dir.into();
        let backups_dir = data_dir.join(BACKUPS_DIR);
        fs::create_dir_all(&data_dir)?;
        fs::create_dir_all(&backups_dir)?;
        let ledger_path = data_dir.join(LEDGER_FILE);
        let state = if ledger_path.exists() {
            load_state_from_path(&ledger_path)?
        } else {
            LedgerState::default()
        };
        debug!(
            path = %ledger_path.display(),
            templates = state.templates.len(),
            "json ledger opened"
        );
        Ok(Self {
            ledger_path,
            backups_dir,
            retention: retention.max(1),
            state: Mutex::new(state),
        })
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Clone of the committed state.
    pub fn snapshot(&self) -> Result<LedgerState, CoreError> {
        Ok(lock_state(&self.state)?.clone())
    }

    /// Writes a timestamped copy of the committed state, then prunes old backups.
    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo, CoreError> {
        let state = lock_state(&self.state)?;
        let now = Utc::now();
        let timestamp = now.format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", BACKUP_PREFIX, timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let id = format!("{}.{}", stem, BACKUP_EXTENSION);
        let path = self.backups_dir.join(&id);
        save_state_to_path(&state, &path)?;
        self.prune_backups()?;
        info!(backup = %id, "ledger backup written");
        Ok(BackupInfo {
            created_at: parse_backup_timestamp(&id),
            id,
            path,
        })
    }

    /// Backups, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION)
            {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(BackupInfo {
                    id: file_name.to_string(),
                    created_at: parse_backup_timestamp(file_name),
                    path: path.clone(),
                });
            }
        }
        entries.sort_by(|a, b| {
            Reverse(a.created_at)
                .cmp(&Reverse(b.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(entries)
    }

    /// Replaces the ledger file and the cached state with the named backup. `id` must be a
    /// bare file name inside the backups directory.
    pub fn restore_backup(&self, id: &str) -> Result<LedgerState, CoreError> {
        if Path::new(id).file_name().and_then(|name| name.to_str()) != Some(id) {
            return Err(CoreError::Validation(format!(
                "backup id `{id}` must be a file name from the backup list"
            )));
        }
        let path = self.backups_dir.join(id);
        if !path.is_file() {
            return Err(CoreError::Persistence(format!("backup `{id}` not found")));
        }
        let mut state = lock_state(&self.state)?;
        let restored = load_state_from_path(&path)?;
        save_state_to_path(&restored, &self.ledger_path)?;
        *state = restored.clone();
        info!(backup = %id, "ledger restored from backup");
        Ok(restored)
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        for entry in self.list_backups()?.into_iter().skip(self.retention) {
            let _ = fs::remove_file(entry.path);
        }
        Ok(())
    }
}

impl LedgerStore for JsonLedgerStore {
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, CoreError> {
        let guard = lock_state(&self.state)?;
        let path = self.ledger_path.as_path();
        Ok(Box::new(StagedUnit::with_persistence(guard, move |state| {
            save_state_to_path(state, path)
        })))
    }
}

/// Serializes `state` next to `path` and renames it into place.
pub fn save_state_to_path(state: &LedgerState, path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    write_atomic(&tmp, &serialize_state(state)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_state_from_path(path: &Path) -> Result<LedgerState, CoreError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| {
        CoreError::Persistence(format!("failed to parse {}: {err}", path.display()))
    })
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !sanitized.is_empty() && !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Extracts the `YYYYmmdd_HHMMSS` stamp from a backup file name, ignoring any note suffix.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(&format!(".{}", BACKUP_EXTENSION))?;
    let segments: Vec<&str> = stem.split('_').collect();
    segments.windows(2).find_map(|pair| {
        if !is_digits(pair[0], 8) || !is_digits(pair[1], 6) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{}{}", pair[0], pair[1]), "%Y%m%d%H%M%S")
            .ok()
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn serialize_state(state: &LedgerState) -> Result<String, CoreError> {
    serde_json::to_string_pretty(state).map_err(|err| CoreError::Persistence(err.to_string()))
}
