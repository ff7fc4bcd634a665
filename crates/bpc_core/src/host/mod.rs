use crate::config::ShellCommand;
use crate::error::AppError;
use std::collections::HashSet;
use std::fs::File;
use sysinfo::{ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};
use tracing::debug;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use self::unix as platform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use self::windows as platform;

/// The operating-system capabilities the record lifecycle depends on.
pub trait ProcessHost {
    /// Starts `command` detached from the caller, with stdout and stderr
    /// bound to `output`, and returns the child's process id without waiting.
    fn spawn_detached(&self, command: &ShellCommand, output: File) -> Result<u32, AppError>;

    /// Ids of every process currently running on the machine.
    fn live_pids(&self) -> Result<HashSet<u32>, AppError>;

    fn is_alive(&self, pid: u32) -> Result<bool, AppError> {
        Ok(self.live_pids()?.contains(&pid))
    }

    fn terminate(&self, pid: u32) -> Result<(), AppError>;
}

pub struct SystemHost;

impl ProcessHost for SystemHost {
    fn spawn_detached(&self, command: &ShellCommand, output: File) -> Result<u32, AppError> {
        let pid = platform::spawn_detached(command, output)?;
        debug!(pid, shell = %command.shell, "spawned detached process");
        Ok(pid)
    }

    fn live_pids(&self) -> Result<HashSet<u32>, AppError> {
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );

        // Threads share the pid number space, and exited children nobody has
        // reaped yet still show up as zombies; neither is a running process.
        let pids: HashSet<u32> = system
            .processes()
            .iter()
            .filter(|(_, process)| process.thread_kind().is_none())
            .filter(|(_, process)| process.status() != ProcessStatus::Zombie)
            .map(|(pid, _)| pid.as_u32())
            .collect();

        // At minimum this process is running, so an empty table means the query failed.
        if pids.is_empty() {
            return Err(AppError::process_table("process table query returned no entries"));
        }

        debug!(count = pids.len(), "queried live processes");
        Ok(pids)
    }

    fn terminate(&self, pid: u32) -> Result<(), AppError> {
        if pid == 0 {
            return Err(AppError::terminate("refusing to signal process id 0"));
        }
        platform::terminate(pid)
    }
}

pub fn platform_host() -> Box<dyn ProcessHost> {
    Box::new(SystemHost)
}
