use async_trait::async_trait;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Select};
use gpubench::app::installer::{AssumeYes, Catalogue, Installer, Prompt};
use gpubench::config::cli::{parse_or_usage, InstallerArgs};
use gpubench::utils::{logger, validation::Validate};
use gpubench::{report_failure, BenchError, HttpFetcher, SystemRunner};
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

/// Terminal prompts, run on a blocking thread so that Ctrl-C stays
/// responsive.
struct TerminalPrompt;

#[async_trait]
impl Prompt for TerminalPrompt {
    async fn choose(&self, prompt: &str, items: &[&str]) -> io::Result<usize> {
        let prompt = prompt.to_string();
        let items: Vec<String> = items.iter().map(|item| item.to_string()).collect();
        tokio::task::spawn_blocking(move || {
            Select::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .items(&items[..])
                .default(0)
                .interact()
                .map_err(io::Error::other)
        })
        .await
        .map_err(io::Error::other)?
    }

    async fn confirm(&self, prompt: &str) -> io::Result<bool> {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || {
            Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .default(true)
                .interact()
                .map_err(io::Error::other)
        })
        .await
        .map_err(io::Error::other)?
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_or_usage::<InstallerArgs>("cuda-installer") {
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

    let catalogue = match Catalogue::embedded() {
        Ok(catalogue) => catalogue,
        Err(e) => return report_failure(&e),
    };

    let runner = SystemRunner::new();
    let installer = Installer::new(
        &runner,
        Arc::new(HttpFetcher::new()),
        config.installer.tmp_dir.clone(),
        config.installer.pacman_conf.clone(),
    );

    let prompt: Box<dyn Prompt> = if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalPrompt)
    };

    let mut stdout = io::stdout();
    let result = tokio::select! {
        result = installer.run(&catalogue, args.release, prompt.as_ref(), &mut stdout) => result,
        _ = tokio::signal::ctrl_c() => Err(BenchError::InstallAbortedError {
            message: "interrupted by the user".to_string(),
        }),
    };

    installer.cleanup();

    match result {
        Ok(report) => {
            tracing::info!(
                "✅ Installation completed successfully! ({} downloaded, groups installed: {:?})",
                report.downloaded.len(),
                report.installed_groups
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Installation exited!");
            report_failure(&e);
            // A pending terminal prompt would otherwise keep the runtime alive.
            std::process::exit(e.exit_code());
        }
    }
}
