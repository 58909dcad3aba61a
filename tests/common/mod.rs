#![allow(dead_code)]

use async_trait::async_trait;
use gpubench::domain::model::{
    BuildInfo, DeviceInfo, DeviceKind, FrameworkInfo, FrameworkKind, FrameworkOptions,
};
use gpubench::domain::ports::{CommandOutput, CommandRunner, Downloader, FrameworkProbe};
use gpubench::utils::error::{BenchError, ProcessError, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Scripted `CommandRunner`: programs without a script are "not found".
#[derive(Default)]
pub struct FakeRunner {
    scripts: HashMap<String, std::result::Result<String, i32>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, program: &str, stdout: &str) -> Self {
        self.scripts.insert(program.to_string(), Ok(stdout.to_string()));
        self
    }

    pub fn with_failure(mut self, program: &str, status: i32) -> Self {
        self.scripts.insert(program.to_string(), Err(status));
        self
    }

    /// Every invocation as `program arg1 arg2 ...`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|c| c.split_whitespace().next().map(str::to_string))
            .collect()
    }

    fn respond(&self, program: &str, args: &[&str]) -> std::result::Result<String, ProcessError> {
        let mut line = vec![program];
        line.extend_from_slice(args);
        self.calls.lock().unwrap().push(line.join(" "));

        match self.scripts.get(program) {
            Some(Ok(stdout)) => Ok(stdout.clone()),
            Some(Err(status)) => Err(ProcessError::Failed {
                program: program.to_string(),
                status: Some(*status),
                stderr: "scripted failure".to_string(),
            }),
            None => Err(ProcessError::NotFound {
                program: program.to_string(),
            }),
        }
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn output(&self, program: &str, args: &[&str]) -> std::result::Result<CommandOutput, ProcessError> {
        self.respond(program, args).map(|stdout| CommandOutput {
            stdout,
            stderr: String::new(),
        })
    }

    async fn interactive(&self, program: &str, args: &[&str]) -> std::result::Result<(), ProcessError> {
        self.respond(program, args).map(|_| ())
    }
}

/// Framework probe with a fixed answer.
pub struct FakeProbe {
    pub kind: FrameworkKind,
    pub installed: bool,
    pub gpus: Vec<&'static str>,
    pub build: BuildInfo,
}

impl FakeProbe {
    pub fn installed(kind: FrameworkKind, gpus: Vec<&'static str>) -> Self {
        Self {
            kind,
            installed: true,
            gpus,
            build: BuildInfo::default(),
        }
    }

    pub fn missing(kind: FrameworkKind) -> Self {
        Self {
            kind,
            installed: false,
            gpus: Vec::new(),
            build: BuildInfo::default(),
        }
    }
}

#[async_trait]
impl FrameworkProbe for FakeProbe {
    fn kind(&self) -> FrameworkKind {
        self.kind
    }

    async fn load(&self, _runner: &dyn CommandRunner, _options: &FrameworkOptions) -> Result<FrameworkInfo> {
        if !self.installed {
            return Err(BenchError::FrameworkMissingError {
                framework: self.kind.display_name().to_string(),
            });
        }

        let mut devices = vec![DeviceInfo {
            kind: DeviceKind::Cpu,
            index: 0,
            name: "host".to_string(),
        }];
        devices.extend(self.gpus.iter().enumerate().map(|(index, name)| DeviceInfo {
            kind: DeviceKind::Gpu,
            index,
            name: name.to_string(),
        }));

        Ok(FrameworkInfo {
            kind: self.kind,
            version: "0.0.1".to_string(),
            build: self.build.clone(),
            devices,
        })
    }
}

/// Downloader that writes a small placeholder file for every link.
#[derive(Default)]
pub struct FakeDownloader {
    pub broken_links: Vec<String>,
    pub fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn verify_link(&self, link: &str) -> Result<bool> {
        Ok(!self.broken_links.iter().any(|l| l == link))
    }

    async fn download(&self, link: &str, dest: &Path) -> Result<u64> {
        tokio::fs::write(dest, link.as_bytes()).await?;
        self.fetched.lock().unwrap().push(link.to_string());
        Ok(link.len() as u64)
    }
}
