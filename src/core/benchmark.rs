use crate::domain::model::{ProfileArtifact, RunSummary, TrainingPlan};
use crate::domain::ports::{Profiler, Trainer};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::Utc;
use std::fs;
use std::io::Write;
use std::time::Instant;

/// Wraps a framework's training loop in a profiler session and a wall clock,
/// then persists the profile and a JSON run summary.
pub struct BenchmarkRunner<'a> {
    profiler: &'a dyn Profiler,
    monitor: &'a SystemMonitor,
}

impl<'a> BenchmarkRunner<'a> {
    pub fn new(profiler: &'a dyn Profiler, monitor: &'a SystemMonitor) -> Self {
        Self { profiler, monitor }
    }

    pub fn run<W: Write>(
        &self,
        trainer: &mut dyn Trainer,
        plan: &TrainingPlan,
        artifact: &ProfileArtifact,
        out: &mut W,
    ) -> Result<RunSummary> {
        if let Some(parent) = artifact.path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(
            "Training {} on {} for {} epochs (batch size {}, {} worker threads)",
            trainer.framework().display_name(),
            trainer.device_label(),
            plan.epochs,
            plan.batch_size,
            plan.worker_threads
        );

        let started_at = Utc::now();
        let session = self.profiler.start()?;
        let start = Instant::now();

        let outcome = trainer.train(plan, self.monitor)?;

        let elapsed = start.elapsed();
        let profile = session.finish()?;

        writeln!(out, "Elapsed time: {}", elapsed.as_secs_f64())?;

        fs::write(&artifact.path, &profile)?;
        tracing::info!(
            "📁 Profile ({} bytes) saved to: {}",
            profile.len(),
            artifact.path.display()
        );

        let summary = RunSummary {
            framework: artifact.framework,
            variant: artifact.variant,
            device: trainer.device_label(),
            plan: plan.clone(),
            outcome,
            started_at,
            elapsed_secs: elapsed.as_secs_f64(),
            profile_path: artifact.path.clone(),
        };
        fs::write(artifact.summary_path(), serde_json::to_vec_pretty(&summary)?)?;

        self.monitor.log_final_stats();
        Ok(summary)
    }
}
