use crate::domain::model::{FrameworkInfo, FrameworkOptions};
use crate::domain::ports::{CommandRunner, FrameworkProbe};
use crate::utils::error::{BenchError, Result};
use std::io::Write;

const NOT_BUILT: &str = "not built";

/// Prints the framework version and its first accelerator. A build with no
/// visible accelerator is a failure.
pub async fn report_accelerator<W: Write + Send>(
    probe: &dyn FrameworkProbe,
    runner: &dyn CommandRunner,
    options: &FrameworkOptions,
    out: &mut W,
) -> Result<FrameworkInfo> {
    let info = probe.load(runner, options).await?;
    writeln!(out, "{} Version: {}", info.kind.display_name(), info.version)?;

    let Some(device) = info.accelerators().next() else {
        return Err(BenchError::NoAcceleratorError {
            framework: info.kind.display_name().to_string(),
        });
    };
    writeln!(out, "GPU: Available")?;
    writeln!(out, "GPU: {}", device.name)?;

    Ok(info)
}

/// Prints the framework version, the native library versions of this build
/// and every visible accelerator.
pub async fn report_build<W: Write + Send>(
    probe: &dyn FrameworkProbe,
    runner: &dyn CommandRunner,
    options: &FrameworkOptions,
    out: &mut W,
) -> Result<FrameworkInfo> {
    let info = probe.load(runner, options).await?;

    writeln!(out, "{} version: {}", info.kind.display_name(), info.version)?;
    writeln!(
        out,
        "CUDA version: {}",
        info.build.cuda_version.as_deref().unwrap_or(NOT_BUILT)
    )?;
    writeln!(
        out,
        "cuDNN version: {}",
        info.build.cudnn_version.as_deref().unwrap_or(NOT_BUILT)
    )?;
    if !info.build.backends.is_empty() {
        tracing::debug!("Backends: {}", info.build.backends.join(", "));
    }

    let devices: Vec<String> = info.accelerators().map(|d| d.physical_name()).collect();
    writeln!(out, "GPU: [{}]", devices.join(", "))?;

    Ok(info)
}
