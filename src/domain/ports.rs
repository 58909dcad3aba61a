use crate::domain::model::{
    FrameworkInfo, FrameworkKind, FrameworkOptions, TrainingOutcome, TrainingPlan,
};
use crate::utils::error::{ProcessError, Result};
use crate::utils::monitor::SystemMonitor;
use async_trait::async_trait;
use std::path::Path;

/// Captured result of a process that exited successfully.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` to completion and captures its output. A non-zero exit
    /// is reported as [`ProcessError::Failed`].
    async fn output(&self, program: &str, args: &[&str]) -> std::result::Result<CommandOutput, ProcessError>;

    /// Runs `program` attached to the caller's terminal.
    async fn interactive(&self, program: &str, args: &[&str]) -> std::result::Result<(), ProcessError>;
}

#[async_trait]
pub trait FrameworkProbe: Send + Sync {
    fn kind(&self) -> FrameworkKind;

    /// Loads the framework and describes it. Fails with
    /// `FrameworkMissingError` when the framework is not part of this build.
    async fn load(&self, runner: &dyn CommandRunner, options: &FrameworkOptions) -> Result<FrameworkInfo>;
}

#[async_trait]
pub trait Downloader: Send + Sync {
    /// Whether `link` is currently reachable (HTTP 200 on HEAD).
    async fn verify_link(&self, link: &str) -> Result<bool>;

    /// Fetches `link` into `dest`, returning the byte count.
    async fn download(&self, link: &str, dest: &Path) -> Result<u64>;
}

pub trait Trainer {
    fn framework(&self) -> FrameworkKind;

    fn device_label(&self) -> String;

    /// Runs the full training loop. Framework failures are returned as-is.
    fn train(&mut self, plan: &TrainingPlan, monitor: &SystemMonitor) -> Result<TrainingOutcome>;
}

/// An active sampling session; consumed to produce the encoded profile.
pub trait ProfilerSession {
    fn finish(self: Box<Self>) -> Result<Vec<u8>>;
}

pub trait Profiler {
    fn start(&self) -> Result<Box<dyn ProfilerSession>>;
}
