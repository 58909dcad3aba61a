use crate::utils::error::{BenchError, ProcessError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::task::JoinSet;

#[derive(Debug)]
pub enum ViewerOutcome {
    /// The viewer started and later exited with this code (`None` on signal).
    Exited(Option<i32>),
    Failed(BenchError),
}

#[derive(Debug)]
pub struct ViewerReport {
    pub artifact: PathBuf,
    pub outcome: ViewerOutcome,
}

impl ViewerReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, ViewerOutcome::Exited(Some(0)))
    }
}

/// Starts one viewer per profile artifact and waits for every one of them.
#[derive(Debug, Clone)]
pub struct ViewerLauncher {
    program: String,
    args: Vec<String>,
}

impl ViewerLauncher {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Reports come back in the order of `artifacts`. Returns only after all
    /// started viewers have exited.
    pub async fn launch_all(&self, artifacts: &[PathBuf]) -> Vec<ViewerReport> {
        let mut outcomes: Vec<Option<ViewerOutcome>> = artifacts.iter().map(|_| None).collect();
        let mut running = JoinSet::new();

        for (index, artifact) in artifacts.iter().enumerate() {
            match self.spawn(artifact) {
                Ok(mut child) => {
                    tracing::info!("Started {} for {}", self.program, artifact.display());
                    running.spawn(async move { (index, child.wait().await) });
                }
                Err(err) => {
                    tracing::warn!("Viewer for {} not started: {}", artifact.display(), err);
                    outcomes[index] = Some(ViewerOutcome::Failed(err));
                }
            }
        }

        while let Some(joined) = running.join_next().await {
            match joined {
                Ok((index, Ok(status))) => {
                    tracing::debug!("Viewer {} exited with {:?}", index, status.code());
                    outcomes[index] = Some(ViewerOutcome::Exited(status.code()));
                }
                Ok((index, Err(err))) => {
                    outcomes[index] = Some(ViewerOutcome::Failed(BenchError::IoError(err)));
                }
                Err(join_err) => {
                    tracing::error!("Viewer task aborted: {}", join_err);
                }
            }
        }

        artifacts
            .iter()
            .zip(outcomes)
            .map(|(artifact, outcome)| ViewerReport {
                artifact: artifact.clone(),
                outcome: outcome.unwrap_or_else(|| {
                    ViewerOutcome::Failed(BenchError::IoError(std::io::Error::other(
                        "viewer task aborted",
                    )))
                }),
            })
            .collect()
    }

    fn spawn(&self, artifact: &Path) -> Result<tokio::process::Child, BenchError> {
        if !artifact.exists() {
            return Err(BenchError::ArtifactMissingError {
                path: artifact.display().to_string(),
            });
        }

        Command::new(&self.program)
            .args(&self.args)
            .arg(artifact)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| ProcessError::from_spawn(&self.program, e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"profile").unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_artifact_is_not_spawned() {
        let dir = TempDir::new().unwrap();
        let present = touch(&dir, "a.prof");
        let missing = dir.path().join("missing.prof");

        let launcher = ViewerLauncher::new("true", vec![]);
        let reports = launcher.launch_all(&[present, missing]).await;

        assert!(reports[0].succeeded());
        assert!(matches!(
            reports[1].outcome,
            ViewerOutcome::Failed(BenchError::ArtifactMissingError { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_viewer_program() {
        let dir = TempDir::new().unwrap();
        let artifact = touch(&dir, "a.prof");

        let launcher = ViewerLauncher::new("gpubench-no-such-viewer", vec![]);
        let reports = launcher.launch_all(&[artifact]).await;

        assert!(matches!(
            reports[0].outcome,
            ViewerOutcome::Failed(BenchError::ToolNotFoundError { .. })
        ));
    }
}
