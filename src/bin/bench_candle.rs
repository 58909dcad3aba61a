use gpubench::app::bench::run_bench;
use gpubench::app::CandleTrainer;
use gpubench::config::cli::{parse_or_usage, BenchArgs};
use gpubench::domain::ports::Trainer;
use gpubench::{report_failure, FrameworkKind};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = match parse_or_usage::<BenchArgs>("bench-candle") {
        Ok(args) => args,
        Err(e) => return report_failure(&e),
    };

    let result = run_bench(FrameworkKind::Candle, &args, |train| {
        Ok(Box::new(CandleTrainer::new(train)) as Box<dyn Trainer>)
    });

    match result {
        Ok(summary) => {
            tracing::info!("📁 Profile saved to: {}", summary.profile_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => report_failure(&e),
    }
}
