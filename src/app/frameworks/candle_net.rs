//! Candle: the mode 1 report and the fixed-device CIFAR-10 benchmark.

use crate::app::cifar::CifarSplit;
use crate::domain::model::{
    FrameworkInfo, FrameworkKind, FrameworkOptions, TrainingOutcome, TrainingPlan,
};
use crate::domain::ports::{CommandRunner, FrameworkProbe, Trainer};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use async_trait::async_trait;

#[cfg(feature = "candle")]
use crate::app::cifar::{CHANNELS, CLASSES, HEIGHT, IMAGE_BYTES, WIDTH};
#[cfg(feature = "candle")]
use candle_core::{DType, Device, Module, Tensor};
#[cfg(feature = "candle")]
use candle_nn::{conv2d, linear, loss, Conv2d, Linear, Optimizer, VarBuilder, VarMap, SGD};
#[cfg(feature = "candle")]
use rand::seq::SliceRandom;

#[cfg(not(feature = "candle"))]
use crate::utils::error::BenchError;

pub const VERSION: &str = match option_env!("GPUBENCH_CANDLE_VERSION") {
    Some(version) => version,
    None => "unknown",
};

pub const LEARNING_RATE: f64 = 0.01;

#[derive(Debug, Default, Clone, Copy)]
pub struct CandleProbe;

#[async_trait]
impl FrameworkProbe for CandleProbe {
    fn kind(&self) -> FrameworkKind {
        FrameworkKind::Candle
    }

    #[cfg(feature = "candle")]
    async fn load(&self, runner: &dyn CommandRunner, options: &FrameworkOptions) -> Result<FrameworkInfo> {
        use crate::app::frameworks::{host_cpu, name_cuda_devices, nvidia_gpus};
        use crate::domain::model::BuildInfo;

        tracing::debug!("Loading Candle {} (log level {})", VERSION, options.log_level);

        let mut devices = vec![host_cpu()];
        let mut backends = vec!["cpu".to_string()];
        if candle_core::utils::cuda_is_available() {
            backends.push("cuda".to_string());
            let listing = match nvidia_gpus(runner).await {
                Ok(listing) => listing,
                Err(e) => {
                    tracing::debug!("No nvidia-smi device names: {}", e);
                    Vec::new()
                }
            };
            devices.extend(name_cuda_devices(&open_cuda_devices(), &listing));
        } else {
            tracing::debug!("Candle built without CUDA support");
        }

        Ok(FrameworkInfo {
            kind: FrameworkKind::Candle,
            version: VERSION.to_string(),
            build: BuildInfo {
                backends,
                ..BuildInfo::default()
            },
            devices,
        })
    }

    #[cfg(not(feature = "candle"))]
    async fn load(&self, _runner: &dyn CommandRunner, _options: &FrameworkOptions) -> Result<FrameworkInfo> {
        Err(BenchError::FrameworkMissingError {
            framework: FrameworkKind::Candle.display_name().to_string(),
        })
    }
}

#[cfg(feature = "candle")]
const MAX_CUDA_DEVICES: usize = 16;

/// Ordinals of the CUDA devices that actually open, stopping at the first
/// one that does not.
#[cfg(feature = "candle")]
fn open_cuda_devices() -> Vec<usize> {
    (0..MAX_CUDA_DEVICES)
        .take_while(|&ordinal| match Device::new_cuda(ordinal) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("CUDA device {} unavailable: {}", ordinal, e);
                false
            }
        })
        .collect()
}

/// Three conv/pool stages followed by three dense layers.
#[cfg(feature = "candle")]
pub struct ConvNet {
    conv1: Conv2d,
    conv2: Conv2d,
    conv3: Conv2d,
    fc1: Linear,
    fc2: Linear,
    fc3: Linear,
}

#[cfg(feature = "candle")]
impl ConvNet {
    pub fn new(vb: VarBuilder) -> candle_core::Result<Self> {
        Ok(Self {
            conv1: conv2d(CHANNELS, 64, 3, Default::default(), vb.pp("conv1"))?,
            conv2: conv2d(64, 128, 3, Default::default(), vb.pp("conv2"))?,
            conv3: conv2d(128, 256, 3, Default::default(), vb.pp("conv3"))?,
            fc1: linear(256 * 2 * 2, 1024, vb.pp("fc1"))?,
            fc2: linear(1024, 512, vb.pp("fc2"))?,
            fc3: linear(512, CLASSES, vb.pp("fc3"))?,
        })
    }
}

#[cfg(feature = "candle")]
impl Module for ConvNet {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        xs.apply(&self.conv1)?
            .relu()?
            .max_pool2d(2)?
            .apply(&self.conv2)?
            .relu()?
            .max_pool2d(2)?
            .apply(&self.conv3)?
            .relu()?
            .max_pool2d(2)?
            .flatten_from(1)?
            .apply(&self.fc1)?
            .relu()?
            .apply(&self.fc2)?
            .relu()?
            .apply(&self.fc3)
    }
}

/// Trains on CUDA device 0 with no fallback; a missing GPU surfaces as the
/// framework's own error.
pub struct CandleTrainer {
    data: CifarSplit,
}

impl CandleTrainer {
    pub fn new(data: CifarSplit) -> Self {
        Self { data }
    }
}

#[cfg(feature = "candle")]
impl CandleTrainer {
    /// Copies the selected samples to `device`, scaled to [-1, 1].
    fn batch(&self, indices: &[usize], device: &Device) -> candle_core::Result<(Tensor, Tensor)> {
        let mut pixels = Vec::with_capacity(indices.len() * IMAGE_BYTES);
        let mut labels = Vec::with_capacity(indices.len());
        for &i in indices {
            pixels.extend_from_slice(self.data.image(i));
            labels.push(self.data.labels[i] as u32);
        }

        let images = Tensor::from_vec(pixels, (indices.len(), CHANNELS, HEIGHT, WIDTH), device)?
            .to_dtype(DType::F32)?
            .affine(2.0 / 255.0, -1.0)?;
        let labels = Tensor::from_vec(labels, indices.len(), device)?;
        Ok((images, labels))
    }
}

impl Trainer for CandleTrainer {
    fn framework(&self) -> FrameworkKind {
        FrameworkKind::Candle
    }

    fn device_label(&self) -> String {
        "cuda:0".to_string()
    }

    #[cfg(feature = "candle")]
    fn train(&mut self, plan: &TrainingPlan, monitor: &SystemMonitor) -> Result<TrainingOutcome> {
        let device = Device::new_cuda(0)?;
        let varmap = VarMap::new();
        let model = ConvNet::new(VarBuilder::from_varmap(&varmap, DType::F32, &device))?;
        let mut sgd = SGD::new(varmap.all_vars(), plan.learning_rate)?;

        let mut order: Vec<usize> = (0..self.data.len()).collect();
        let mut rng = rand::thread_rng();
        let mut outcome = TrainingOutcome {
            train_samples: self.data.len(),
            ..TrainingOutcome::default()
        };

        for epoch in 1..=plan.epochs {
            order.shuffle(&mut rng);

            let mut total_loss = 0f32;
            let mut batches = 0usize;
            for indices in order.chunks(plan.batch_size) {
                let (images, labels) = self.batch(indices, &device)?;
                let logits = model.forward(&images)?;
                let loss = loss::cross_entropy(&logits, &labels)?;
                sgd.backward_step(&loss)?;

                total_loss += loss.to_scalar::<f32>()?;
                batches += 1;
            }

            println!("Epoch [{}/{}]", epoch, plan.epochs);
            let mean_loss = total_loss / batches.max(1) as f32;
            tracing::debug!("Epoch {} mean loss {:.4}", epoch, mean_loss);
            monitor.log_stats(&format!("Epoch {}", epoch));

            outcome.epochs_completed = epoch;
            outcome.final_loss = Some(mean_loss);
        }

        Ok(outcome)
    }

    #[cfg(not(feature = "candle"))]
    fn train(&mut self, _plan: &TrainingPlan, _monitor: &SystemMonitor) -> Result<TrainingOutcome> {
        Err(BenchError::FrameworkMissingError {
            framework: FrameworkKind::Candle.display_name().to_string(),
        })
    }
}

#[cfg(all(test, feature = "candle"))]
mod tests {
    use super::*;

    #[test]
    fn test_forward_produces_class_logits() {
        let varmap = VarMap::new();
        let model = ConvNet::new(VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu)).unwrap();

        let input = Tensor::zeros((2, CHANNELS, HEIGHT, WIDTH), DType::F32, &Device::Cpu).unwrap();
        let logits = model.forward(&input).unwrap();
        assert_eq!(logits.dims(), &[2, CLASSES]);
    }

    #[test]
    fn test_batch_is_scaled_to_unit_range() {
        let data = CifarSplit {
            images: [vec![0u8; IMAGE_BYTES], vec![255u8; IMAGE_BYTES]].concat(),
            labels: vec![3, 7],
        };
        let trainer = CandleTrainer::new(data);
        let (images, labels) = trainer.batch(&[1, 0], &Device::Cpu).unwrap();

        let flat: Vec<f32> = images.flatten_all().unwrap().to_vec1().unwrap();
        assert_eq!(flat[0], 1.0);
        assert_eq!(flat[IMAGE_BYTES], -1.0);
        assert_eq!(labels.to_vec1::<u32>().unwrap(), vec![7, 3]);
    }

    #[tokio::test]
    async fn test_probe_reports_version() {
        use crate::adapters::process::SystemRunner;

        let info = CandleProbe
            .load(&SystemRunner::new(), &FrameworkOptions::default())
            .await
            .unwrap();
        assert_eq!(info.kind, FrameworkKind::Candle);
        assert!(!info.version.is_empty());
    }
}
