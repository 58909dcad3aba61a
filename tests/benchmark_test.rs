use gpubench::domain::model::{
    FrameworkKind, ProfileArtifact, TrainingOutcome, TrainingPlan, Variant,
};
use gpubench::domain::ports::{Profiler, ProfilerSession, Trainer};
use gpubench::utils::monitor::SystemMonitor;
use gpubench::{BenchError, BenchmarkRunner, Result};
use std::cell::Cell;
use tempfile::TempDir;

struct FakeProfiler {
    started: Cell<usize>,
}

struct FakeSession;

impl ProfilerSession for FakeSession {
    fn finish(self: Box<Self>) -> Result<Vec<u8>> {
        Ok(b"fake-pprof".to_vec())
    }
}

impl Profiler for FakeProfiler {
    fn start(&self) -> Result<Box<dyn ProfilerSession>> {
        self.started.set(self.started.get() + 1);
        Ok(Box::new(FakeSession))
    }
}

struct FakeTrainer {
    fail: bool,
}

impl Trainer for FakeTrainer {
    fn framework(&self) -> FrameworkKind {
        FrameworkKind::Burn
    }

    fn device_label(&self) -> String {
        "ndarray:cpu".to_string()
    }

    fn train(&mut self, plan: &TrainingPlan, _monitor: &SystemMonitor) -> Result<TrainingOutcome> {
        if self.fail {
            return Err(BenchError::TrainingError {
                message: "out of memory".to_string(),
            });
        }
        for epoch in 1..=plan.epochs {
            println!("Epoch {}/{}", epoch, plan.epochs);
        }
        Ok(TrainingOutcome {
            epochs_completed: plan.epochs,
            train_samples: 40,
            final_loss: Some(1.5),
            validation_accuracy: Some(0.25),
        })
    }
}

fn plan() -> TrainingPlan {
    TrainingPlan {
        epochs: 2,
        batch_size: 8,
        learning_rate: 1e-3,
        validation_split: 0.2,
        worker_threads: 4,
    }
}

#[test]
fn test_run_writes_profile_and_summary() {
    let dir = TempDir::new().unwrap();
    let profiler = FakeProfiler { started: Cell::new(0) };
    let monitor = SystemMonitor::new(false);
    let artifact = ProfileArtifact::new(dir.path(), FrameworkKind::Burn, Variant::Stable);

    let mut out = Vec::new();
    let summary = BenchmarkRunner::new(&profiler, &monitor)
        .run(&mut FakeTrainer { fail: false }, &plan(), &artifact, &mut out)
        .unwrap();

    assert_eq!(profiler.started.get(), 1);
    assert!(String::from_utf8(out).unwrap().starts_with("Elapsed time: "));
    assert_eq!(std::fs::read(&artifact.path).unwrap(), b"fake-pprof");
    assert_eq!(artifact.path, dir.path().join("burn").join("burn_stable.prof"));

    let written: serde_json::Value =
        serde_json::from_slice(&std::fs::read(artifact.summary_path()).unwrap()).unwrap();
    assert_eq!(written["framework"], "burn");
    assert_eq!(written["variant"], "stable");
    assert_eq!(written["device"], "ndarray:cpu");
    assert_eq!(written["outcome"]["epochs_completed"], 2);
    assert_eq!(summary.outcome.validation_accuracy, Some(0.25));
}

#[test]
fn test_variants_do_not_overwrite_each_other() {
    let dir = TempDir::new().unwrap();
    let profiler = FakeProfiler { started: Cell::new(0) };
    let monitor = SystemMonitor::new(false);
    let runner = BenchmarkRunner::new(&profiler, &monitor);

    for variant in [Variant::Nightly, Variant::Stable] {
        let artifact = ProfileArtifact::new(dir.path(), FrameworkKind::Candle, variant);
        runner
            .run(&mut FakeTrainer { fail: false }, &plan(), &artifact, &mut Vec::new())
            .unwrap();
    }

    assert!(dir.path().join("candle/candle_nightly.prof").exists());
    assert!(dir.path().join("candle/candle_stable.prof").exists());
}

#[test]
fn test_training_failure_propagates_without_artifact() {
    let dir = TempDir::new().unwrap();
    let profiler = FakeProfiler { started: Cell::new(0) };
    let monitor = SystemMonitor::new(false);
    let artifact = ProfileArtifact::new(dir.path(), FrameworkKind::Candle, Variant::Nightly);

    let mut out = Vec::new();
    let err = BenchmarkRunner::new(&profiler, &monitor)
        .run(&mut FakeTrainer { fail: true }, &plan(), &artifact, &mut out)
        .unwrap_err();

    assert!(matches!(err, BenchError::TrainingError { .. }));
    assert!(out.is_empty());
    assert!(!artifact.path.exists());
}
