use crate::app::installer::Channel;
use crate::config::toml_config::TomlConfig;
use crate::domain::model::{FrameworkLogLevel, FrameworkOptions};
use crate::utils::error::{BenchError, Result};
use clap::error::ErrorKind;
use clap::{Args, Parser};
use std::path::PathBuf;

/// Flags shared by every gpubench binary.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Path to a gpubench.toml configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log level for the ML frameworks (off, error, warn, info, debug, trace or 0-3)
    #[arg(long, env = "GPUBENCH_FRAMEWORK_LOG")]
    pub framework_log_level: Option<FrameworkLogLevel>,
}

impl CommonArgs {
    pub fn load_config(&self) -> Result<TomlConfig> {
        TomlConfig::load(self.config.as_deref())
    }

    /// Command line (or its environment fallback) wins over the config file.
    pub fn framework_options(&self, config: &TomlConfig) -> FrameworkOptions {
        FrameworkOptions {
            log_level: self
                .framework_log_level
                .unwrap_or(config.frameworks.log_level),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "gpubench")]
#[command(about = "Probe the GPU toolchain or report an ML framework's GPU support")]
#[command(allow_negative_numbers = true)]
pub struct CheckArgs {
    /// 0 = probe nvidia-smi/nvcc/cuDNN/gcc, 1 = Candle report, 2 = Burn report
    pub mode: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Parser)]
#[command(allow_negative_numbers = true)]
pub struct BenchArgs {
    /// Run identity: 0 = nightly, 1 = stable
    pub variant: String,

    /// Log CPU and memory usage after every epoch
    #[arg(long)]
    pub monitor: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "trace-view")]
#[command(about = "Open one profile viewer per benchmark artifact and wait for all of them")]
pub struct ViewArgs {
    /// Profile artifacts to open (defaults to the configured list)
    pub artifacts: Vec<PathBuf>,

    /// Viewer program (overrides viewer.program)
    #[arg(long)]
    pub viewer: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "cuda-installer")]
#[command(about = "Install pinned gcc/CUDA/cuDNN packages on pacman-based systems")]
pub struct InstallerArgs {
    /// Package release to install; asked interactively when omitted
    #[arg(long, value_enum)]
    pub release: Option<Channel>,

    /// Proceed without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Parses the process arguments. Help and version requests exit as usual;
/// every other clap failure becomes the one-line usage error.
pub fn parse_or_usage<T: Parser>(program: &str) -> Result<T> {
    parse_from_or_usage(program, std::env::args_os())
}

pub fn parse_from_or_usage<T, I, A>(program: &str, args: I) -> Result<T>
where
    T: Parser,
    I: IntoIterator<Item = A>,
    A: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(parsed) => Ok(parsed),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => Err(BenchError::UsageError {
            program: program.to_string(),
        }),
    }
}
