use crate::config::ShellCommand;
use crate::error::AppError;
use std::fs::File;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

pub fn spawn_detached(command: &ShellCommand, output: File) -> Result<u32, AppError> {
    let stderr = output
        .try_clone()
        .map_err(|err| AppError::launch(err.to_string()))?;

    // A fresh process group keeps terminal job-control signals away from the child.
    let child = Command::new(&command.shell)
        .arg(&command.flag)
        .arg(&command.command)
        .stdin(Stdio::null())
        .stdout(Stdio::from(output))
        .stderr(Stdio::from(stderr))
        .process_group(0)
        .spawn()
        .map_err(|err| AppError::launch(format!("{}: {}", command.shell, err)))?;

    Ok(child.id())
}

pub fn terminate(pid: u32) -> Result<(), AppError> {
    let target = libc::pid_t::try_from(pid)
        .map_err(|_| AppError::terminate(format!("process id {pid} is out of range")))?;

    let result = unsafe { libc::kill(target, libc::SIGTERM) };
    if result == 0 {
        Ok(())
    } else {
        Err(AppError::terminate(format!(
            "kill {pid}: {}",
            std::io::Error::last_os_error()
        )))
    }
}
