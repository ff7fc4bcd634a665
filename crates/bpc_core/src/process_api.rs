use crate::config::{Config, ConfigOverrides, load_config_with_fallback, merge_overrides};
use crate::error::AppError;
use crate::host::{ProcessHost, platform_host};
use crate::model::TaskRecord;
use crate::reconcile::reconcile_store;
use crate::storage::RecordStore;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Terminated(TaskRecord),
    /// The id was not in the reconciled active set; nothing was signalled.
    NotActive,
}

pub fn status() -> Result<Vec<TaskRecord>, AppError> {
    let store = RecordStore::open_default()?;
    let host = platform_host();
    status_with(&store, host.as_ref())
}

pub fn history() -> Result<Vec<TaskRecord>, AppError> {
    let store = RecordStore::open_default()?;
    history_with(&store)
}

pub fn start(input: &str, overrides: &ConfigOverrides) -> Result<TaskRecord, AppError> {
    let store = RecordStore::open_default()?;
    let loaded = load_config_with_fallback(store.home());
    let config = merge_overrides(&loaded.config, overrides);
    let host = platform_host();
    start_with(&store, host.as_ref(), &config, input)
}

pub fn stop(id: u64) -> Result<StopOutcome, AppError> {
    let store = RecordStore::open_default()?;
    let host = platform_host();
    stop_with(&store, host.as_ref(), id)
}

pub fn show_output(id: u64) -> Result<Vec<u8>, AppError> {
    let store = RecordStore::open_default()?;
    show_output_with(&store, id)
}

pub fn clean() -> Result<(), AppError> {
    let store = RecordStore::open_default()?;
    clean_with(&store)
}

pub fn status_with(store: &RecordStore, host: &dyn ProcessHost) -> Result<Vec<TaskRecord>, AppError> {
    reconcile_store(store, host)
}

pub fn history_with(store: &RecordStore) -> Result<Vec<TaskRecord>, AppError> {
    store.read_history()
}

/// Launches `input` in the background. When the whole input is a number
/// that matches a history id, that entry's command is run again under a new id.
pub fn start_with(
    store: &RecordStore,
    host: &dyn ProcessHost,
    config: &Config,
    input: &str,
) -> Result<TaskRecord, AppError> {
    if input.trim().is_empty() {
        return Err(AppError::invalid_input("command is required"));
    }

    let command = resolve_command(store, input)?;
    if command.contains(['\n', '\r']) {
        return Err(AppError::invalid_input(
            "command must not contain line breaks",
        ));
    }

    let id = store.next_id()?;
    let output = store.create_output(id)?;
    let pid = match host.spawn_detached(&config.shell_command(&command), output) {
        Ok(pid) => pid,
        Err(err) => {
            std::fs::remove_file(store.output_path(id)).ok();
            return Err(err);
        }
    };

    let record = TaskRecord::new(id, pid, command);
    store.append_history(&record)?;
    store.append_active(&record)?;

    info!(id = record.id, pid = record.pid, "started background process");
    Ok(record)
}

fn resolve_command(store: &RecordStore, input: &str) -> Result<String, AppError> {
    let Ok(history_id) = input.parse::<u64>() else {
        return Ok(input.to_string());
    };

    let replayed = store
        .read_history()?
        .into_iter()
        .find(|record| record.id == history_id);

    match replayed {
        Some(record) => {
            debug!(history_id, "replaying command from history");
            Ok(record.command)
        }
        None => Ok(input.to_string()),
    }
}

/// Terminates the process behind `id` if it is still active. Ids that are
/// unknown or already exited are a no-op.
pub fn stop_with(
    store: &RecordStore,
    host: &dyn ProcessHost,
    id: u64,
) -> Result<StopOutcome, AppError> {
    let active = reconcile_store(store, host)?;
    let Some(record) = active.into_iter().find(|record| record.id == id) else {
        info!(id, "process is not active; nothing to stop");
        return Ok(StopOutcome::NotActive);
    };

    host.terminate(record.pid)?;
    info!(id = record.id, pid = record.pid, "sent termination request");
    Ok(StopOutcome::Terminated(record))
}

pub fn show_output_with(store: &RecordStore, id: u64) -> Result<Vec<u8>, AppError> {
    store.read_output(id)
}

pub fn clean_with(store: &RecordStore) -> Result<(), AppError> {
    store.clear_history()
}
