use gpubench::app::bench::run_bench;
use gpubench::app::BurnTrainer;
use gpubench::config::cli::{parse_or_usage, BenchArgs};
use gpubench::domain::ports::Trainer;
use gpubench::{report_failure, FrameworkKind, SystemRunner};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = match parse_or_usage::<BenchArgs>("bench-burn") {
        Ok(args) => args,
        Err(e) => return report_failure(&e),
    };

    let result = run_bench(FrameworkKind::Burn, &args, |train| {
        let runtime = tokio::runtime::Runtime::new()?;
        let trainer = runtime.block_on(BurnTrainer::detect(train, &SystemRunner::new()));
        Ok(Box::new(trainer) as Box<dyn Trainer>)
    });

    match result {
        Ok(summary) => {
            tracing::info!("📁 Profile saved to: {}", summary.profile_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => report_failure(&e),
    }
}
