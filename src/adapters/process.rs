use crate::domain::ports::{CommandOutput, CommandRunner};
use crate::utils::error::ProcessError;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Runs real processes on the host.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn output(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ProcessError> {
        tracing::debug!("Running {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ProcessError::from_spawn(program, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(ProcessError::Failed {
                program: program.to_string(),
                status: output.status.code(),
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }

    async fn interactive(&self, program: &str, args: &[&str]) -> Result<(), ProcessError> {
        tracing::info!("Running {} {}", program, args.join(" "));

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| ProcessError::from_spawn(program, e))?;

        if !status.success() {
            return Err(ProcessError::Failed {
                program: program.to_string(),
                status: status.code(),
                stderr: String::new(),
            });
        }
        Ok(())
    }
}
