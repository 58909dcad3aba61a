use gpubench::config::cli::{parse_or_usage, CheckArgs};
use gpubench::utils::{logger, validation::Validate};
use gpubench::{report_failure, BurnProbe, CandleProbe, Dispatcher, Mode, SystemRunner, TomlConfig};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_or_usage::<CheckArgs>("gpubench") {
        Ok(args) => args,
        Err(e) => return report_failure(&e),
    };
    let mode = match Mode::from_arg(&args.mode) {
        Ok(mode) => mode,
        Err(e) => return report_failure(&e),
    };

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => return report_failure(&e),
    };
    let options = args.common.framework_options(&config);
    logger::init_cli_logger(args.common.verbose, options.log_level);

    let runner = SystemRunner::new();
    let dispatcher = Dispatcher::new(
        &runner,
        &CandleProbe,
        &BurnProbe,
        config.probe.cudnn_header.clone(),
        options,
    );

    let mut stdout = std::io::stdout();
    match dispatcher.run(mode, &mut stdout).await {
        Ok(mode) => {
            tracing::debug!("{:?} finished", mode);
            ExitCode::SUCCESS
        }
        Err(e) => report_failure(&e),
    }
}

fn load_config(args: &CheckArgs) -> gpubench::Result<TomlConfig> {
    let config = args.common.load_config()?;
    config.validate()?;
    Ok(config)
}
