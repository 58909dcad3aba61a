//! Shared flow of the `bench-candle` and `bench-burn` binaries.

use crate::adapters::profiler::PprofProfiler;
use crate::app::cifar::{Cifar10, CifarSplit};
use crate::app::frameworks::{burn_net, candle_net};
use crate::config::cli::BenchArgs;
use crate::config::toml_config::TomlConfig;
use crate::core::benchmark::BenchmarkRunner;
use crate::domain::model::{FrameworkKind, ProfileArtifact, RunSummary, TrainingPlan, Variant};
use crate::domain::ports::Trainer;
use crate::utils::error::Result;
use crate::utils::logger::init_cli_logger;
use crate::utils::monitor::{cpu_count, SystemMonitor};
use crate::utils::validation::Validate;
use std::io;

/// Hyper-parameters of one framework's benchmark under `config`.
pub fn plan_for(framework: FrameworkKind, config: &TomlConfig) -> TrainingPlan {
    let (learning_rate, validation_split) = match framework {
        FrameworkKind::Candle => (candle_net::LEARNING_RATE, 0.0),
        FrameworkKind::Burn => (burn_net::LEARNING_RATE, burn_net::VALIDATION_SPLIT),
    };

    TrainingPlan {
        epochs: config.bench.epochs,
        batch_size: config.bench.batch_size,
        learning_rate,
        validation_split,
        worker_threads: cpu_count(),
    }
}

/// Validates the variant before anything else, then loads the data,
/// trains under the profiler and writes the artifacts.
pub fn run_bench<F>(framework: FrameworkKind, args: &BenchArgs, make_trainer: F) -> Result<RunSummary>
where
    F: FnOnce(CifarSplit) -> Result<Box<dyn Trainer>>,
{
    let variant = Variant::from_arg(&args.variant)?;

    let config = args.common.load_config()?;
    config.validate()?;
    let options = args.common.framework_options(&config);
    init_cli_logger(args.common.verbose, options.log_level);

    tracing::info!(
        "🚀 {} benchmark, {} run",
        framework.display_name(),
        variant.as_str()
    );

    let monitor = SystemMonitor::new(args.monitor);
    let data = Cifar10::load_dir(&config.bench.data_dir)?;
    monitor.log_stats("Dataset loaded");

    let mut trainer = make_trainer(data.train)?;
    let plan = plan_for(framework, &config);
    let artifact = ProfileArtifact::new(&config.bench.output_dir, framework, variant);
    let profiler = PprofProfiler::new(config.bench.profiler_frequency);

    BenchmarkRunner::new(&profiler, &monitor).run(
        trainer.as_mut(),
        &plan,
        &artifact,
        &mut io::stdout(),
    )
}
