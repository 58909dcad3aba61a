use crate::core::probe::EnvironmentProbe;
use crate::core::report::{report_accelerator, report_build};
use crate::domain::model::{FrameworkOptions, Mode};
use crate::domain::ports::{CommandRunner, FrameworkProbe};
use crate::utils::error::Result;
use std::io::Write;
use std::path::PathBuf;

/// Routes `gpubench <mode>` to the probe or one of the framework reporters.
pub struct Dispatcher<'a> {
    runner: &'a dyn CommandRunner,
    first: &'a dyn FrameworkProbe,
    second: &'a dyn FrameworkProbe,
    cudnn_header: PathBuf,
    options: FrameworkOptions,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        first: &'a dyn FrameworkProbe,
        second: &'a dyn FrameworkProbe,
        cudnn_header: impl Into<PathBuf>,
        options: FrameworkOptions,
    ) -> Self {
        Self {
            runner,
            first,
            second,
            cudnn_header: cudnn_header.into(),
            options,
        }
    }

    /// Parses the raw argument and runs the selected command. Any `Err`
    /// means the invocation must exit with status 1.
    pub async fn dispatch<W: Write + Send>(&self, raw_mode: &str, out: &mut W) -> Result<Mode> {
        self.run(Mode::from_arg(raw_mode)?, out).await
    }

    pub async fn run<W: Write + Send>(&self, mode: Mode, out: &mut W) -> Result<Mode> {
        tracing::debug!("Dispatching {:?}", mode);

        match mode {
            Mode::Probe => {
                EnvironmentProbe::new(self.runner, self.cudnn_header.clone())
                    .run(out)
                    .await?;
            }
            Mode::CandleReport => {
                report_accelerator(self.first, self.runner, &self.options, out).await?;
            }
            Mode::BurnReport => {
                report_build(self.second, self.runner, &self.options, out).await?;
            }
        }

        Ok(mode)
    }
}
