use crate::domain::ports::CommandRunner;
use crate::utils::error::{BenchError, Result};
use regex::Regex;
use std::io::Write;
use std::path::PathBuf;

/// The four toolchain checks, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Gpu,
    Cuda,
    Cudnn,
    Gcc,
}

pub const SECTIONS: [SectionKind; 4] = [
    SectionKind::Gpu,
    SectionKind::Cuda,
    SectionKind::Cudnn,
    SectionKind::Gcc,
];

impl SectionKind {
    pub fn label(&self) -> &'static str {
        match self {
            SectionKind::Gpu => "GPU:",
            SectionKind::Cuda => "CUDA Version:",
            SectionKind::Cudnn => "cuDNN Version:",
            SectionKind::Gcc => "gcc Version:",
        }
    }

    pub fn tool(&self) -> &'static str {
        match self {
            SectionKind::Gpu => "nvidia-smi",
            SectionKind::Cuda => "nvcc",
            SectionKind::Cudnn => "cuDNN",
            SectionKind::Gcc => "gcc",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeSection {
    pub kind: SectionKind,
    pub output: String,
}

pub struct EnvironmentProbe<'a> {
    runner: &'a dyn CommandRunner,
    cudnn_header: PathBuf,
}

impl<'a> EnvironmentProbe<'a> {
    pub fn new(runner: &'a dyn CommandRunner, cudnn_header: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            cudnn_header: cudnn_header.into(),
        }
    }

    pub async fn run_section(&self, kind: SectionKind) -> Result<String> {
        match kind {
            SectionKind::Gpu => Ok(self.runner.output("nvidia-smi", &[]).await?.stdout),
            SectionKind::Cuda => Ok(self.runner.output("nvcc", &["--version"]).await?.stdout),
            SectionKind::Cudnn => self.cudnn_version().await,
            SectionKind::Gcc => Ok(self.runner.output("gcc", &["--version"]).await?.stdout),
        }
    }

    /// Runs every section in order, printing each label before its result.
    /// The first failure stops the probe; later sections never run.
    pub async fn run<W: Write + Send>(&self, out: &mut W) -> Result<Vec<ProbeSection>> {
        let mut sections = Vec::with_capacity(SECTIONS.len());

        for (i, kind) in SECTIONS.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            writeln!(out, "{}", kind.label())?;

            let output = self.run_section(*kind).await.map_err(|e| {
                tracing::debug!("{} section failed: {}", kind.tool(), e);
                e
            })?;
            writeln!(out, "{}", output.trim_end())?;

            sections.push(ProbeSection {
                kind: *kind,
                output,
            });
        }

        Ok(sections)
    }

    async fn cudnn_version(&self) -> Result<String> {
        let header = tokio::fs::read_to_string(&self.cudnn_header)
            .await
            .map_err(|e| {
                tracing::debug!("Cannot read {}: {}", self.cudnn_header.display(), e);
                BenchError::ToolNotFoundError {
                    tool: SectionKind::Cudnn.tool().to_string(),
                }
            })?;

        parse_cudnn_version(&header).ok_or_else(|| BenchError::UnparseableOutputError {
            tool: SectionKind::Cudnn.tool().to_string(),
            detail: format!(
                "CUDNN_MAJOR/MINOR/PATCHLEVEL missing from {}",
                self.cudnn_header.display()
            ),
        })
    }
}

/// Extracts `major.minor.patch` from the `#define CUDNN_*` lines of a header.
pub fn parse_cudnn_version(header: &str) -> Option<String> {
    let define = |name: &str| -> Option<String> {
        let re = Regex::new(&format!(r"(?m)^\s*#define\s+{}\s+(\d+)\b", name)).ok()?;
        re.captures(header).map(|caps| caps[1].to_string())
    };

    let major = define("CUDNN_MAJOR")?;
    let minor = define("CUDNN_MINOR")?;
    let patch = define("CUDNN_PATCHLEVEL")?;
    Some(format!("{}.{}.{}", major, minor, patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"
#ifndef CUDNN_VERSION_H_
#define CUDNN_VERSION_H_

#define CUDNN_MAJOR 8
#define CUDNN_MINOR 9
#define CUDNN_PATCHLEVEL 7

#define CUDNN_VERSION (CUDNN_MAJOR * 1000 + CUDNN_MINOR * 100 + CUDNN_PATCHLEVEL)
#endif
"#;

    #[test]
    fn test_parse_cudnn_version() {
        assert_eq!(parse_cudnn_version(HEADER).as_deref(), Some("8.9.7"));
    }

    #[test]
    fn test_parse_cudnn_version_incomplete() {
        assert_eq!(parse_cudnn_version("#define CUDNN_MAJOR 9\n"), None);
        assert_eq!(parse_cudnn_version(""), None);
    }

    #[test]
    fn test_section_order_and_labels() {
        let labels: Vec<&str> = SECTIONS.iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            ["GPU:", "CUDA Version:", "cuDNN Version:", "gcc Version:"]
        );
    }
}
