pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{HttpFetcher, PprofProfiler, SystemRunner};
pub use app::{BurnProbe, CandleProbe};
pub use config::TomlConfig;
pub use crate::core::{benchmark::BenchmarkRunner, dispatch::Dispatcher, viewer::ViewerLauncher};
pub use domain::model::{FrameworkKind, FrameworkOptions, Mode, ProfileArtifact, Variant};
pub use utils::error::{BenchError, Result};

/// Prints a failure the way every gpubench binary reports it and returns
/// the process exit status.
pub fn report_failure(err: &BenchError) -> std::process::ExitCode {
    use utils::error::ErrorCategory;

    tracing::debug!("Exiting after {:?}", err);
    match err.category() {
        ErrorCategory::Argument | ErrorCategory::Dependency => println!("{}", err.user_message()),
        ErrorCategory::Configuration | ErrorCategory::Runtime => eprintln!("{}", err.user_message()),
    }
    std::process::ExitCode::from(err.exit_code() as u8)
}
