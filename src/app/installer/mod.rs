//! Pinned gcc/CUDA/cuDNN installation for pacman-based hosts.

pub mod catalogue;

pub use catalogue::{Catalogue, Channel, Package, Release, Slot};

use crate::domain::ports::{CommandRunner, Downloader};
use crate::utils::error::{BenchError, Result};
use async_trait::async_trait;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

const XLA_HINT: &str = "export XLA_FLAGS=--xla_gpu_cuda_data_dir=/opt/cuda";

/// Install groups, in order. A group is skipped when none of its members
/// was downloaded.
const GROUPS: [(&str, [Slot; 2]); 2] = [
    ("GCC", [Slot::Gcc, Slot::GccLibs]),
    ("CUDA", [Slot::Cuda, Slot::Cudnn]),
];

pub const RELEASE_PROMPT: &str = "Choose the version of CUDA you want to install:";
pub const CONFIRM_PROMPT: &str = "Would you like to proceed with the installation?";

/// Operator interaction: the release choice and the go-ahead before anything
/// is downloaded.
#[async_trait]
pub trait Prompt: Send + Sync {
    /// Index of the chosen item.
    async fn choose(&self, prompt: &str, items: &[&str]) -> std::io::Result<usize>;

    async fn confirm(&self, prompt: &str) -> std::io::Result<bool>;
}

/// Takes the first choice and answers yes without asking (`--yes`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

#[async_trait]
impl Prompt for AssumeYes {
    async fn choose(&self, _prompt: &str, _items: &[&str]) -> std::io::Result<usize> {
        Ok(0)
    }

    async fn confirm(&self, _prompt: &str) -> std::io::Result<bool> {
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub slot: Slot,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct InstallReport {
    pub downloaded: Vec<Download>,
    pub installed_groups: Vec<&'static str>,
}

async fn choose_channel(prompt: &dyn Prompt) -> Result<Channel> {
    let labels = Channel::ALL.map(|channel| channel.as_str());
    let index = prompt.choose(RELEASE_PROMPT, &labels).await?;
    Channel::ALL
        .get(index)
        .copied()
        .ok_or_else(|| BenchError::InstallAbortedError {
            message: format!("no release at choice {}", index),
        })
}

pub struct Installer<'a> {
    runner: &'a dyn CommandRunner,
    downloader: Arc<dyn Downloader>,
    tmp_dir: PathBuf,
    pacman_conf: PathBuf,
}

impl<'a> Installer<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        downloader: Arc<dyn Downloader>,
        tmp_dir: impl Into<PathBuf>,
        pacman_conf: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            downloader,
            tmp_dir: tmp_dir.into(),
            pacman_conf: pacman_conf.into(),
        }
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    /// Full installation. Without a `channel` the operator picks one; the
    /// confirmation comes after the supported Python versions are shown and
    /// declining aborts before anything is downloaded.
    pub async fn run<W: Write>(
        &self,
        catalogue: &Catalogue,
        channel: Option<Channel>,
        prompt: &dyn Prompt,
        out: &mut W,
    ) -> Result<InstallReport> {
        self.update_dependencies(catalogue).await;
        self.prepare()?;

        let channel = match channel {
            Some(channel) => channel,
            None => choose_channel(prompt).await?,
        };
        let release = catalogue.release(channel);
        writeln!(out, "\nSupporting packages for `{}` version:", channel.as_str())?;
        for supported in &release.support {
            writeln!(out, "\t{}", supported)?;
        }
        writeln!(out)?;

        if !prompt.confirm(CONFIRM_PROMPT).await? {
            return Err(BenchError::InstallAbortedError {
                message: "declined by the user".to_string(),
            });
        }

        let downloaded = self.download_missing(release).await?;
        let installed_groups = self.install(&downloaded).await?;
        self.print_hints(release, out)?;

        Ok(InstallReport {
            downloaded,
            installed_groups,
        })
    }

    /// `sudo pacman -Syu <deps>`. A failed update is logged and the
    /// installation continues.
    pub async fn update_dependencies(&self, catalogue: &Catalogue) {
        let mut args = vec!["pacman", "-Syu"];
        args.extend(catalogue.dependencies());

        match self.runner.interactive("sudo", &args).await {
            Ok(()) => tracing::info!("✅ Dependencies installed: {}", catalogue.deps),
            Err(e) => tracing::error!("Failed to install dependencies: {}", e),
        }
    }

    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.tmp_dir)?;
        tracing::info!("Tmp directory created: {}", self.tmp_dir.display());
        Ok(())
    }

    /// `pacman -Q` must mention both the package and the pinned version.
    pub async fn is_installed(&self, package: &Package) -> bool {
        match self.runner.output("pacman", &["-Q", &package.pkg]).await {
            Ok(output) => {
                output.stdout.contains(&package.pkg) && output.stdout.contains(&package.version)
            }
            Err(e) => {
                tracing::debug!("{} not installed: {}", package.pkg, e);
                false
            }
        }
    }

    /// Checks every missing package's link, then fetches them concurrently
    /// into the temporary directory.
    pub async fn download_missing(&self, release: &Release) -> Result<Vec<Download>> {
        let mut pending = Vec::new();
        for (slot, package) in release.packages() {
            if self.is_installed(package).await {
                tracing::warn!("Package already installed: {}", package.name);
                continue;
            }
            if !self.downloader.verify_link(&package.link).await? {
                return Err(BenchError::InstallAbortedError {
                    message: format!("invalid link for {}: {}", package.name, package.link),
                });
            }
            pending.push((slot, package.clone()));
        }

        let mut tasks = JoinSet::new();
        for (slot, package) in pending {
            let downloader = Arc::clone(&self.downloader);
            let dest = self.tmp_dir.join(&package.name);
            tasks.spawn(async move {
                let bytes = downloader.download(&package.link, &dest).await?;
                Ok::<_, BenchError>((slot, dest, bytes))
            });
        }

        let mut downloaded = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (slot, path, bytes) = joined.map_err(|e| BenchError::InstallAbortedError {
                message: format!("download task failed: {}", e),
            })??;
            tracing::info!("✅ Downloaded {} ({} bytes)", path.display(), bytes);
            downloaded.push(Download { slot, path });
        }
        downloaded.sort_by_key(|d| d.slot);

        Ok(downloaded)
    }

    /// `sudo pacman -U` per group; returns the groups that were installed.
    pub async fn install(&self, downloaded: &[Download]) -> Result<Vec<&'static str>> {
        let mut installed = Vec::new();

        for (label, members) in GROUPS {
            let paths: Vec<String> = downloaded
                .iter()
                .filter(|d| members.contains(&d.slot))
                .map(|d| d.path.display().to_string())
                .collect();
            if paths.is_empty() {
                tracing::debug!("Nothing to install for {}", label);
                continue;
            }

            let mut args = vec!["pacman", "-U"];
            args.extend(paths.iter().map(String::as_str));
            self.runner.interactive("sudo", &args).await?;

            tracing::info!("✅ {} installed successfully.", label);
            installed.push(label);
        }

        Ok(installed)
    }

    pub fn print_hints<W: Write>(&self, release: &Release, out: &mut W) -> std::io::Result<()> {
        writeln!(
            out,
            "\nTo prevent the system from updating the packages, add the following to {}",
            self.pacman_conf.display()
        )?;
        writeln!(out, "\t{}", release.ignore_pkg_line())?;
        writeln!(out, "\nCommon Error\n# ERROR: libdevice not found at ./libdevice.10.bc")?;
        writeln!(out, "To fix this error, run the following command:")?;
        writeln!(out, "\t{}\n", XLA_HINT)
    }

    /// Removes the temporary directory; failures only warn.
    pub fn cleanup(&self) {
        match fs::remove_dir_all(&self.tmp_dir) {
            Ok(()) => tracing::info!("Tmp directory removed: {}", self.tmp_dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!("Failed to remove tmp directory: {}", e);
                tracing::warn!(
                    "Please remove the tmp directory manually at {}",
                    self.tmp_dir.display()
                );
            }
        }
    }
}
