use crate::error::AppError;
use crate::model::{TaskRecord, decode_lines, encode_line, encode_lines};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const HOME_ENV_VAR: &str = "BPC_HOME";
const HOME_DIR_NAME: &str = ".bpc";
const HISTORY_FILE_NAME: &str = "history";
const ACTIVE_FILE_NAME: &str = "active";
const ACTIVE_TEMP_FILE_NAME: &str = "active.tmp";
const OUTPUT_EXTENSION: &str = "out";

pub fn home_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(HOME_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let profile = std::env::var("USERPROFILE")
            .map_err(|_| AppError::invalid_data("USERPROFILE is not set"))?;
        Ok(PathBuf::from(profile).join(HOME_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(HOME_DIR_NAME))
    }
}

/// File-backed history and active record sets plus the per-id output files.
///
/// There is no locking between concurrent invocations: the last writer wins.
/// Read-modify-write of the active set goes through [`ActiveSection`] so that
/// an advisory lock can be taken there if it is ever needed.
#[derive(Debug, Clone)]
pub struct RecordStore {
    home: PathBuf,
}

impl RecordStore {
    /// Opens the store rooted at `home`, creating the directory and both
    /// record files when they are missing. Existing files are left intact.
    pub fn open<P: Into<PathBuf>>(home: P) -> Result<Self, AppError> {
        let store = Self { home: home.into() };
        std::fs::create_dir_all(&store.home).map_err(|err| {
            AppError::storage(format!("{}: {}", store.home.display(), err))
        })?;
        store.touch(&store.history_path())?;
        store.touch(&store.active_path())?;
        Ok(store)
    }

    pub fn open_default() -> Result<Self, AppError> {
        Self::open(home_path()?)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn history_path(&self) -> PathBuf {
        self.home.join(HISTORY_FILE_NAME)
    }

    pub fn active_path(&self) -> PathBuf {
        self.home.join(ACTIVE_FILE_NAME)
    }

    pub fn output_path(&self, id: u64) -> PathBuf {
        self.home.join(format!("{id}.{OUTPUT_EXTENSION}"))
    }

    pub fn append_history(&self, record: &TaskRecord) -> Result<(), AppError> {
        append_record(&self.history_path(), record)
    }

    pub fn append_active(&self, record: &TaskRecord) -> Result<(), AppError> {
        append_record(&self.active_path(), record)
    }

    pub fn read_history(&self) -> Result<Vec<TaskRecord>, AppError> {
        read_records(&self.history_path())
    }

    /// Raw read; no reconciliation against the process table happens here.
    pub fn read_active(&self) -> Result<Vec<TaskRecord>, AppError> {
        read_records(&self.active_path())
    }

    /// Replaces the whole active set. The new content is written to a
    /// sibling file first and renamed over the old one.
    pub fn rewrite_active(&self, records: &[TaskRecord]) -> Result<(), AppError> {
        let temp_path = self.home.join(ACTIVE_TEMP_FILE_NAME);
        let active_path = self.active_path();

        std::fs::write(&temp_path, encode_lines(records))
            .map_err(|err| AppError::storage(format!("{}: {}", temp_path.display(), err)))?;
        restrict_permissions(&temp_path)?;
        std::fs::rename(&temp_path, &active_path)
            .map_err(|err| AppError::storage(format!("{}: {}", active_path.display(), err)))?;

        debug!(count = records.len(), "rewrote active records");
        Ok(())
    }

    pub fn begin_active(&self) -> Result<ActiveSection<'_>, AppError> {
        Ok(ActiveSection {
            store: self,
            records: self.read_active()?,
        })
    }

    /// Empties the history and deletes every output file. The active set is
    /// not touched.
    pub fn clear_history(&self) -> Result<(), AppError> {
        let history_path = self.history_path();
        std::fs::write(&history_path, "")
            .map_err(|err| AppError::storage(format!("{}: {}", history_path.display(), err)))?;

        let entries = std::fs::read_dir(&self.home)
            .map_err(|err| AppError::storage(format!("{}: {}", self.home.display(), err)))?;

        let mut removed = 0usize;
        for entry in entries {
            let entry = entry.map_err(|err| AppError::storage(err.to_string()))?;
            let path = entry.path();
            let is_output = path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(OUTPUT_EXTENSION);
            if !is_output {
                continue;
            }

            std::fs::remove_file(&path)
                .map_err(|err| AppError::storage(format!("{}: {}", path.display(), err)))?;
            removed += 1;
        }

        debug!(removed, "cleared history and output files");
        Ok(())
    }

    /// One past the highest history id, or 1 for an empty history.
    pub fn next_id(&self) -> Result<u64, AppError> {
        let history = self.read_history()?;
        Ok(history
            .iter()
            .map(|record| record.id)
            .max()
            .map_or(1, |id| id + 1))
    }

    /// Creates the output file for `id`, truncating any leftover content.
    pub fn create_output(&self, id: u64) -> Result<File, AppError> {
        let path = self.output_path(id);
        let file = File::create(&path)
            .map_err(|err| AppError::storage(format!("{}: {}", path.display(), err)))?;
        restrict_permissions(&path)?;
        Ok(file)
    }

    pub fn read_output(&self, id: u64) -> Result<Vec<u8>, AppError> {
        let path = self.output_path(id);
        std::fs::read(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("no output for process {id}"))
            } else {
                AppError::storage(format!("{}: {}", path.display(), err))
            }
        })
    }

    fn touch(&self, path: &Path) -> Result<(), AppError> {
        if path.exists() {
            return Ok(());
        }

        std::fs::write(path, "")
            .map_err(|err| AppError::storage(format!("{}: {}", path.display(), err)))?;
        restrict_permissions(path)
    }
}

/// Scoped read-modify-write over the active record set: the records are read
/// when the section begins and written back in full on [`ActiveSection::commit`].
#[derive(Debug)]
pub struct ActiveSection<'a> {
    store: &'a RecordStore,
    records: Vec<TaskRecord>,
}

impl ActiveSection<'_> {
    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn replace(&mut self, records: Vec<TaskRecord>) {
        self.records = records;
    }

    pub fn commit(self) -> Result<Vec<TaskRecord>, AppError> {
        self.store.rewrite_active(&self.records)?;
        Ok(self.records)
    }
}

fn append_record(path: &Path, record: &TaskRecord) -> Result<(), AppError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| AppError::storage(format!("{}: {}", path.display(), err)))?;

    let mut line = encode_line(record);
    line.push('\n');
    file.write_all(line.as_bytes())
        .map_err(|err| AppError::storage(format!("{}: {}", path.display(), err)))?;

    debug!(path = %path.display(), id = record.id, "appended record");
    Ok(())
}

fn read_records(path: &Path) -> Result<Vec<TaskRecord>, AppError> {
    let content = std::fs::read(path)
        .map_err(|err| AppError::storage(format!("{}: {}", path.display(), err)))?;
    Ok(decode_lines(&content))
}

fn restrict_permissions(path: &Path) -> Result<(), AppError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)
            .map_err(|err| AppError::storage(err.to_string()))?;
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}
