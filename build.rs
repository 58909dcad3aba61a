use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

const CUDNN_HEADER: &str = "/usr/include/cudnn_version.h";

fn main() {
    let manifest_dir = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").unwrap_or_default());
    let lock_path = manifest_dir.join("Cargo.lock");

    println!("cargo:rerun-if-changed={}", lock_path.display());
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=CUDA_PATH");

    let lock = fs::read_to_string(&lock_path).unwrap_or_default();
    emit("GPUBENCH_CANDLE_VERSION", locked_version(&lock, "candle-core"));
    emit("GPUBENCH_BURN_VERSION", locked_version(&lock, "burn"));

    if env::var_os("CARGO_FEATURE_CUDA").is_some() {
        emit("GPUBENCH_BUILD_CUDA_VERSION", nvcc_release());
        emit("GPUBENCH_BUILD_CUDNN_VERSION", cudnn_version());
    }
}

fn emit(key: &str, value: Option<String>) {
    if let Some(value) = value {
        println!("cargo:rustc-env={key}={value}");
    }
}

/// Finds `version = "..."` of the first `[[package]]` entry named `name`.
fn locked_version(lock: &str, name: &str) -> Option<String> {
    let needle = format!("name = \"{name}\"");
    let mut lines = lock.lines();
    while let Some(line) = lines.next() {
        if line.trim() == needle {
            let version = lines.next()?.trim();
            return version
                .strip_prefix("version = \"")
                .and_then(|v| v.strip_suffix('"'))
                .map(str::to_string);
        }
    }
    None
}

fn nvcc_release() -> Option<String> {
    let nvcc = env::var_os("CUDA_PATH")
        .map(|p| PathBuf::from(p).join("bin").join("nvcc"))
        .unwrap_or_else(|| PathBuf::from("nvcc"));
    let output = Command::new(nvcc).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let release = text.split("release ").nth(1)?;
    release.split(',').next().map(|v| v.trim().to_string())
}

fn cudnn_version() -> Option<String> {
    let header = fs::read_to_string(CUDNN_HEADER).ok()?;
    let field = |key: &str| {
        header.lines().find_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some("#define"), Some(k), Some(v)) if k == key => Some(v.to_string()),
                _ => None,
            }
        })
    };
    Some(format!(
        "{}.{}.{}",
        field("CUDNN_MAJOR")?,
        field("CUDNN_MINOR")?,
        field("CUDNN_PATCHLEVEL")?
    ))
}
