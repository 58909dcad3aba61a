use gpubench::config::cli::{parse_or_usage, ViewArgs};
use gpubench::core::viewer::ViewerOutcome;
use gpubench::utils::{logger, validation::Validate};
use gpubench::{report_failure, ViewerLauncher};
use std::process::ExitCode;

const BANNER: &str = "**------CPU OPERATIONS------**";

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_or_usage::<ViewArgs>("trace-view") {
        Ok(args) => args,
        Err(e) => return report_failure(&e),
    };

    let config = match args.common.load_config() {
        Ok(config) => config,
        Err(e) => return report_failure(&e),
    };
    if let Err(e) = config.validate() {
        return report_failure(&e);
    }
    let options = args.common.framework_options(&config);
    logger::init_cli_logger(args.common.verbose, options.log_level);

    let artifacts = if args.artifacts.is_empty() {
        config.viewer.artifacts.clone()
    } else {
        args.artifacts.clone()
    };
    let program = args.viewer.unwrap_or(config.viewer.program);

    println!("{}", BANNER);
    let launcher = ViewerLauncher::new(program, config.viewer.args);
    let reports = launcher.launch_all(&artifacts).await;

    let mut first_failure = None;
    for report in reports {
        match report.outcome {
            ViewerOutcome::Exited(Some(0)) => {
                tracing::info!("Viewer for {} closed", report.artifact.display());
            }
            ViewerOutcome::Exited(code) => {
                tracing::error!(
                    "Viewer for {} exited with {:?}",
                    report.artifact.display(),
                    code
                );
                first_failure.get_or_insert(ExitCode::FAILURE);
            }
            ViewerOutcome::Failed(err) => {
                first_failure.get_or_insert(report_failure(&err));
            }
        }
    }

    first_failure.unwrap_or(ExitCode::SUCCESS)
}
