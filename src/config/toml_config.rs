use crate::domain::model::{FrameworkKind, FrameworkLogLevel, ProfileArtifact, Variant};
use crate::utils::error::{BenchError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "gpubench.toml";
pub const CIFAR10_URL: &str = "https://www.cs.toronto.edu/~kriz/cifar-10-binary.tar.gz";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub probe: ProbeConfig,
    pub frameworks: FrameworksConfig,
    pub bench: BenchConfig,
    pub viewer: ViewerConfig,
    pub installer: InstallerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub cudnn_header: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            cudnn_header: PathBuf::from("/usr/include/cudnn_version.h"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworksConfig {
    pub log_level: FrameworkLogLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub epochs: usize,
    pub batch_size: usize,
    pub profiler_frequency: i32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/cifar-10-batches-bin"),
            output_dir: PathBuf::from("./models"),
            epochs: 5,
            batch_size: 128,
            profiler_frequency: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub artifacts: Vec<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let root = BenchConfig::default().output_dir;
        Self {
            program: "pprof".to_string(),
            args: vec!["-http=localhost:0".to_string()],
            artifacts: vec![
                ProfileArtifact::new(&root, FrameworkKind::Candle, Variant::Stable).path,
                ProfileArtifact::new(&root, FrameworkKind::Candle, Variant::Nightly).path,
                ProfileArtifact::new(&root, FrameworkKind::Burn, Variant::Stable).path,
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub tmp_dir: PathBuf,
    pub pacman_conf: PathBuf,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            tmp_dir: PathBuf::from("/tmp/cuda_installer"),
            pacman_conf: PathBuf::from("/etc/pacman.conf"),
        }
    }
}

impl TomlConfig {
    /// Loads `path` when given; otherwise `gpubench.toml` in the working
    /// directory if present, else the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        tracing::debug!("Loading configuration from {}", path.as_ref().display());
        let content = std::fs::read_to_string(&path).map_err(BenchError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BenchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the value of `VAR`; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BenchError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("probe.cudnn_header", &self.probe.cudnn_header)?;
        validation::validate_path("bench.data_dir", &self.bench.data_dir)?;
        validation::validate_path("bench.output_dir", &self.bench.output_dir)?;
        validation::validate_range("bench.epochs", self.bench.epochs, 1, usize::MAX)?;
        validation::validate_range("bench.batch_size", self.bench.batch_size, 1, usize::MAX)?;
        validation::validate_range(
            "bench.profiler_frequency",
            self.bench.profiler_frequency,
            1,
            10_000,
        )?;
        validation::validate_non_blank("viewer.program", &self.viewer.program)?;
        validation::validate_profile_artifacts("viewer.artifacts", &self.viewer.artifacts)?;
        validation::validate_scratch_dir("installer.tmp_dir", &self.installer.tmp_dir)?;
        validation::validate_path("installer.pacman_conf", &self.installer.pacman_conf)?;
        Ok(())
    }
}
