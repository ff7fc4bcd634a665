use crate::config::ShellCommand;
use crate::error::AppError;
use std::fs::File;
use std::os::windows::process::CommandExt;
use std::process::{Command, Stdio};

const DETACHED_PROCESS: u32 = 0x0000_0008;
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

pub fn spawn_detached(command: &ShellCommand, output: File) -> Result<u32, AppError> {
    let stderr = output
        .try_clone()
        .map_err(|err| AppError::launch(err.to_string()))?;

    // cmd.exe does its own parsing of the inline command, so pass it unquoted.
    let child = Command::new(&command.shell)
        .arg(&command.flag)
        .raw_arg(&command.command)
        .stdin(Stdio::null())
        .stdout(Stdio::from(output))
        .stderr(Stdio::from(stderr))
        .creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP)
        .spawn()
        .map_err(|err| AppError::launch(format!("{}: {}", command.shell, err)))?;

    Ok(child.id())
}

pub fn terminate(pid: u32) -> Result<(), AppError> {
    let output = Command::new("taskkill")
        .args(["/f", "/pid", &pid.to_string()])
        .output()
        .map_err(|err| AppError::terminate(format!("taskkill: {err}")))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(AppError::terminate(format!(
            "taskkill /pid {pid}: {}",
            stderr.trim()
        )))
    }
}
