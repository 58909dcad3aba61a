pub mod burn_net;
pub mod candle_net;

pub use burn_net::{BurnProbe, BurnTrainer};
pub use candle_net::{CandleProbe, CandleTrainer};

use crate::domain::model::{DeviceInfo, DeviceKind};
use crate::domain::ports::CommandRunner;
use crate::utils::error::{ProcessError, Result};

/// Lists the NVIDIA GPUs visible to the driver. A host without
/// `nvidia-smi` simply has no GPUs; any other failure is reported.
pub async fn nvidia_gpus(runner: &dyn CommandRunner) -> Result<Vec<DeviceInfo>> {
    let output = match runner
        .output(
            "nvidia-smi",
            &["--query-gpu=index,name", "--format=csv,noheader"],
        )
        .await
    {
        Ok(output) => output,
        Err(ProcessError::NotFound { .. }) => {
            tracing::debug!("nvidia-smi not found, assuming no GPUs");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    Ok(parse_gpu_listing(&output.stdout))
}

/// Parses `index, name` lines; malformed lines are skipped.
pub fn parse_gpu_listing(listing: &str) -> Vec<DeviceInfo> {
    listing
        .lines()
        .filter_map(|line| {
            let (index, name) = line.split_once(',')?;
            Some(DeviceInfo {
                kind: DeviceKind::Gpu,
                index: index.trim().parse().ok()?,
                name: name.trim().to_string(),
            })
        })
        .collect()
}

/// Accelerators for the CUDA ordinals that opened, named from the
/// `nvidia-smi` listing when it has an entry and `CUDA:<i>` otherwise.
pub fn name_cuda_devices(opened: &[usize], listing: &[DeviceInfo]) -> Vec<DeviceInfo> {
    opened
        .iter()
        .map(|&index| DeviceInfo {
            kind: DeviceKind::Gpu,
            index,
            name: listing
                .iter()
                .find(|gpu| gpu.index == index)
                .map(|gpu| gpu.name.clone())
                .unwrap_or_else(|| format!("CUDA:{}", index)),
        })
        .collect()
}

pub(crate) fn host_cpu() -> DeviceInfo {
    DeviceInfo {
        kind: DeviceKind::Cpu,
        index: 0,
        name: "host".to_string(),
    }
}
