use crate::domain::model::PROFILE_EXTENSION;
use crate::utils::error::{BenchError, Result};
use std::fmt::Display;
use std::path::{Component, Path, PathBuf};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl Display, reason: impl Into<String>) -> BenchError {
    BenchError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Package links are fetched over plain HTTP(S) only.
pub fn validate_download_link(field: &str, link: &str) -> Result<()> {
    let url = Url::parse(link).map_err(|e| invalid(field, link, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(field, link, format!("Unsupported URL scheme: {}", scheme))),
    }
}

pub fn validate_path(field: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(invalid(field, "", "Path cannot be empty"));
    }
    if path.to_string_lossy().contains('\0') {
        return Err(invalid(field, path.display(), "Path contains null bytes"));
    }
    Ok(())
}

/// A directory gpubench deletes when it is done with it. The filesystem root
/// and bare relative components such as `.` are refused.
pub fn validate_scratch_dir(field: &str, path: &Path) -> Result<()> {
    validate_path(field, path)?;
    let named = path
        .components()
        .any(|component| matches!(component, Component::Normal(_)));
    if !named || path.components().any(|c| c == Component::ParentDir) {
        return Err(invalid(
            field,
            path.display(),
            "Scratch directory must name a dedicated directory",
        ));
    }
    Ok(())
}

/// Every artifact the viewer opens must be a `.prof` report.
pub fn validate_profile_artifacts(field: &str, artifacts: &[PathBuf]) -> Result<()> {
    for artifact in artifacts {
        validate_path(field, artifact)?;
        match artifact.extension().and_then(|ext| ext.to_str()) {
            Some(PROFILE_EXTENSION) => {}
            Some(other) => {
                return Err(invalid(
                    field,
                    artifact.display(),
                    format!("Expected a .{} profile, got .{}", PROFILE_EXTENSION, other),
                ))
            }
            None => {
                return Err(invalid(
                    field,
                    artifact.display(),
                    format!("Expected a .{} profile", PROFILE_EXTENSION),
                ))
            }
        }
    }
    Ok(())
}

/// Archive names are joined onto the scratch directory, so they must stay
/// a single file name.
pub fn validate_file_name(field: &str, name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid(field, name, "Must be a plain file name")),
    }
}

pub fn validate_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, value, "Value cannot be empty or whitespace-only"));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + Display + Copy>(field: &str, value: T, min: T, max: T) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(field, value, format!("Value must be between {} and {}", min, max)));
    }
    Ok(())
}
