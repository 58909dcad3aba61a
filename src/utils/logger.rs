use crate::domain::model::FrameworkLogLevel;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log targets owned by the ML frameworks and their GPU runtimes.
const FRAMEWORK_TARGETS: &[&str] = &[
    "candle_core",
    "candle_nn",
    "burn",
    "burn_core",
    "burn_autodiff",
    "burn_ndarray",
    "cubecl",
    "wgpu_core",
];

/// Targets of this crate and its binaries.
const OWN_TARGETS: &[&str] = &[
    "gpubench",
    "bench_candle",
    "bench_burn",
    "trace_view",
    "cuda_installer",
];

/// Builds the filter directives used when `RUST_LOG` is not set.
pub fn default_directives(verbose: bool, framework_level: FrameworkLogLevel) -> String {
    let own_level = if verbose { "debug" } else { "info" };
    OWN_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, own_level))
        .chain(
            FRAMEWORK_TARGETS
                .iter()
                .map(|target| format!("{}={}", target, framework_level.as_directive())),
        )
        .collect::<Vec<_>>()
        .join(",")
}

pub fn init_cli_logger(verbose: bool, framework_level: FrameworkLogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose, framework_level)));

    // stdout carries the tool's report; logs go to stderr.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
