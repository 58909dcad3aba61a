use crate::utils::error::{BenchError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Parses the single positional selector shared by every entrypoint.
pub fn parse_selector(arg: &str) -> Result<i64> {
    arg.parse::<i64>()
        .map_err(|_| BenchError::InvalidIntegerError {
            arg: arg.to_string(),
        })
}

/// Top-level command selected by `gpubench <mode>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Probe,
    CandleReport,
    BurnReport,
}

impl Mode {
    /// Parses the raw `gpubench <mode>` argument.
    pub fn from_arg(arg: &str) -> Result<Self> {
        Mode::try_from(parse_selector(arg)?)
    }
}

impl TryFrom<i64> for Mode {
    type Error = BenchError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Mode::Probe),
            1 => Ok(Mode::CandleReport),
            2 => Ok(Mode::BurnReport),
            value => Err(BenchError::UnknownModeError { value }),
        }
    }
}

/// Run identity of a benchmark; decides which artifact a run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Nightly,
    Stable,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Nightly => "nightly",
            Variant::Stable => "stable",
        }
    }
}

impl Variant {
    pub fn from_arg(arg: &str) -> Result<Self> {
        Variant::try_from(parse_selector(arg)?)
    }
}

impl TryFrom<i64> for Variant {
    type Error = BenchError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Variant::Nightly),
            1 => Ok(Variant::Stable),
            value => Err(BenchError::UnknownVariantError { value }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkKind {
    Candle,
    Burn,
}

impl FrameworkKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            FrameworkKind::Candle => "Candle",
            FrameworkKind::Burn => "Burn",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            FrameworkKind::Candle => "candle",
            FrameworkKind::Burn => "burn",
        }
    }
}

pub const PROFILE_EXTENSION: &str = "prof";

/// Location of one benchmark's profile: `<root>/<framework>/<framework>_<variant>.prof`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileArtifact {
    pub framework: FrameworkKind,
    pub variant: Variant,
    pub path: PathBuf,
}

impl ProfileArtifact {
    pub fn new(root: &Path, framework: FrameworkKind, variant: Variant) -> Self {
        let file_name = format!("{}_{}.{}", framework.slug(), variant.as_str(), PROFILE_EXTENSION);
        Self {
            framework,
            variant,
            path: root.join(framework.slug()).join(file_name),
        }
    }

    /// Path of the JSON run summary written next to the profile.
    pub fn summary_path(&self) -> PathBuf {
        self.path.with_extension("json")
    }
}

/// Verbosity applied to the frameworks' own log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameworkLogLevel {
    Off,
    #[default]
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FrameworkLogLevel {
    pub fn as_directive(&self) -> &'static str {
        match self {
            FrameworkLogLevel::Off => "off",
            FrameworkLogLevel::Error => "error",
            FrameworkLogLevel::Warn => "warn",
            FrameworkLogLevel::Info => "info",
            FrameworkLogLevel::Debug => "debug",
            FrameworkLogLevel::Trace => "trace",
        }
    }
}

impl FromStr for FrameworkLogLevel {
    type Err = String;

    /// Accepts level names and the numeric 0-3 scale (3 silences everything).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "3" => Ok(FrameworkLogLevel::Off),
            "error" | "2" => Ok(FrameworkLogLevel::Error),
            "warn" | "warning" | "1" => Ok(FrameworkLogLevel::Warn),
            "info" | "0" => Ok(FrameworkLogLevel::Info),
            "debug" => Ok(FrameworkLogLevel::Debug),
            "trace" => Ok(FrameworkLogLevel::Trace),
            other => Err(format!("unknown framework log level '{}'", other)),
        }
    }
}

impl fmt::Display for FrameworkLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_directive())
    }
}

impl Serialize for FrameworkLogLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_directive())
    }
}

impl<'de> Deserialize<'de> for FrameworkLogLevel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Options handed to framework initialisation; resolved once at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameworkOptions {
    pub log_level: FrameworkLogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cpu,
    Gpu,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub kind: DeviceKind,
    pub index: usize,
    pub name: String,
}

impl DeviceInfo {
    pub fn physical_name(&self) -> String {
        let kind = match self.kind {
            DeviceKind::Cpu => "CPU",
            DeviceKind::Gpu => "GPU",
        };
        format!("/physical_device:{}:{} ({})", kind, self.index, self.name)
    }
}

/// Versions of the native libraries a framework build was compiled against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub cuda_version: Option<String>,
    pub cudnn_version: Option<String>,
    pub backends: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameworkInfo {
    pub kind: FrameworkKind,
    pub version: String,
    pub build: BuildInfo,
    pub devices: Vec<DeviceInfo>,
}

impl FrameworkInfo {
    pub fn accelerators(&self) -> impl Iterator<Item = &DeviceInfo> {
        self.devices.iter().filter(|d| d.kind == DeviceKind::Gpu)
    }
}

/// Hyper-parameters shared by both benchmark implementations.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingPlan {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub validation_split: f32,
    pub worker_threads: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TrainingOutcome {
    pub epochs_completed: usize,
    pub train_samples: usize,
    pub final_loss: Option<f32>,
    pub validation_accuracy: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub framework: FrameworkKind,
    pub variant: Variant,
    pub device: String,
    pub plan: TrainingPlan,
    pub outcome: TrainingOutcome,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub profile_path: PathBuf,
}
