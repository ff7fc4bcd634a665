use crate::error::AppError;
use crate::host::ProcessHost;
use crate::model::TaskRecord;
use crate::storage::RecordStore;
use std::collections::HashSet;
use tracing::debug;

/// Keeps the records whose pid is in `live`, in their original order.
pub fn reconcile(records: Vec<TaskRecord>, live: &HashSet<u32>) -> Vec<TaskRecord> {
    records
        .into_iter()
        .filter(|record| live.contains(&record.pid))
        .collect()
}

/// Prunes the persisted active set against the live process table and
/// returns what is left. The process table is queried before the store is
/// opened, so a failed query leaves the active file untouched.
pub fn reconcile_store(
    store: &RecordStore,
    host: &dyn ProcessHost,
) -> Result<Vec<TaskRecord>, AppError> {
    let live = host.live_pids()?;

    let mut section = store.begin_active()?;
    let before = section.records().len();
    let kept = reconcile(section.records().to_vec(), &live);
    section.replace(kept);
    let kept = section.commit()?;

    debug!(before, after = kept.len(), "reconciled active records");
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::{reconcile, reconcile_store};
    use crate::config::ShellCommand;
    use crate::error::AppError;
    use crate::host::ProcessHost;
    use crate::model::TaskRecord;
    use crate::storage::RecordStore;
    use std::collections::HashSet;
    use std::fs::{self, File};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    struct TableHost {
        live: Option<HashSet<u32>>,
    }

    impl ProcessHost for TableHost {
        fn spawn_detached(&self, _command: &ShellCommand, _output: File) -> Result<u32, AppError> {
            Err(AppError::launch("not supported"))
        }

        fn live_pids(&self) -> Result<HashSet<u32>, AppError> {
            self.live
                .clone()
                .ok_or_else(|| AppError::process_table("query failed"))
        }

        fn terminate(&self, _pid: u32) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn temp_home(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("bpc-{nanos}-{name}"))
    }

    #[test]
    fn reconcile_keeps_live_records_in_order() {
        let records = vec![
            TaskRecord::new(1, 100, "a"),
            TaskRecord::new(2, 200, "b"),
            TaskRecord::new(3, 300, "c"),
        ];
        let live: HashSet<u32> = [300, 100].into_iter().collect();

        let kept = reconcile(records, &live);

        assert_eq!(
            kept,
            vec![TaskRecord::new(1, 100, "a"), TaskRecord::new(3, 300, "c")]
        );
    }

    #[test]
    fn reconcile_with_empty_table_drops_everything() {
        let records = vec![TaskRecord::new(1, 100, "a")];
        assert!(reconcile(records, &HashSet::new()).is_empty());
    }

    #[test]
    fn reconcile_store_prunes_dead_records() {
        let home = temp_home("prune");
        let store = RecordStore::open(&home).unwrap();
        let alive = TaskRecord::new(1, 100, "sleep 100");
        let dead = TaskRecord::new(2, 200, "sleep 1");
        store.append_active(&alive).unwrap();
        store.append_active(&dead).unwrap();
        let host = TableHost {
            live: Some([100, 1].into_iter().collect()),
        };

        let kept = reconcile_store(&store, &host).unwrap();
        let stored = store.read_active().unwrap();
        fs::remove_dir_all(&home).ok();

        assert_eq!(kept, vec![alive.clone()]);
        assert_eq!(stored, vec![alive]);
    }

    #[test]
    fn reconcile_store_is_idempotent() {
        let home = temp_home("idempotent");
        let store = RecordStore::open(&home).unwrap();
        store.append_active(&TaskRecord::new(1, 100, "a")).unwrap();
        store.append_active(&TaskRecord::new(2, 200, "b")).unwrap();
        let host = TableHost {
            live: Some([200].into_iter().collect()),
        };

        let first = reconcile_store(&store, &host).unwrap();
        let first_content = fs::read_to_string(store.active_path()).unwrap();
        let second = reconcile_store(&store, &host).unwrap();
        let second_content = fs::read_to_string(store.active_path()).unwrap();
        fs::remove_dir_all(&home).ok();

        assert_eq!(first, second);
        assert_eq!(first_content, second_content);
    }

    #[test]
    fn reconcile_store_leaves_file_alone_when_query_fails() {
        let home = temp_home("query-fails");
        let store = RecordStore::open(&home).unwrap();
        store.append_active(&TaskRecord::new(1, 100, "a")).unwrap();
        let before = fs::read_to_string(store.active_path()).unwrap();
        let host = TableHost { live: None };

        let err = reconcile_store(&store, &host).unwrap_err();
        let after = fs::read_to_string(store.active_path()).unwrap();
        fs::remove_dir_all(&home).ok();

        assert_eq!(err.code(), "process_table_error");
        assert_eq!(before, after);
    }

    #[test]
    fn reconcile_store_skips_corrupt_active_line() {
        let home = temp_home("corrupt-active");
        let store = RecordStore::open(&home).unwrap();
        fs::write(store.active_path(), b"1\t100\tsleep 100\n2\t5\techo \xff\xfe\n").unwrap();
        let host = TableHost {
            live: Some([100, 5].into_iter().collect()),
        };

        let kept = reconcile_store(&store, &host).unwrap();
        let stored = fs::read_to_string(store.active_path()).unwrap();
        fs::remove_dir_all(&home).ok();

        assert_eq!(kept, vec![TaskRecord::new(1, 100, "sleep 100")]);
        assert_eq!(stored, "1\t100\tsleep 100\n");
    }

    #[test]
    fn reconcile_store_fails_when_active_file_is_unreadable() {
        let home = temp_home("no-active");
        let store = RecordStore::open(&home).unwrap();
        fs::remove_file(store.active_path()).unwrap();
        let host = TableHost {
            live: Some([1].into_iter().collect()),
        };

        let err = reconcile_store(&store, &host).unwrap_err();
        fs::remove_dir_all(&home).ok();

        assert_eq!(err.code(), "storage_error");
    }
}
