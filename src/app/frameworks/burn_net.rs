//! Burn: the mode 2 build report and the auto-device CIFAR-10 benchmark.

use super::nvidia_gpus;
use crate::app::cifar::CifarSplit;
use crate::domain::model::{
    FrameworkInfo, FrameworkKind, FrameworkOptions, TrainingOutcome, TrainingPlan,
};
use crate::domain::ports::{CommandRunner, FrameworkProbe, Trainer};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use async_trait::async_trait;

#[cfg(feature = "burn")]
use crate::app::cifar::{CHANNELS, CLASSES, HEIGHT, IMAGE_BYTES, WIDTH};
#[cfg(feature = "burn")]
use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
#[cfg(feature = "burn")]
use burn::module::{AutodiffModule, Module};
#[cfg(feature = "burn")]
use burn::nn::{
    conv::{Conv2d, Conv2dConfig},
    loss::CrossEntropyLossConfig,
    pool::{MaxPool2d, MaxPool2dConfig},
    Linear, LinearConfig,
};
#[cfg(feature = "burn")]
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
#[cfg(feature = "burn")]
use burn::tensor::backend::{AutodiffBackend, Backend};
#[cfg(feature = "burn")]
use burn::tensor::{activation::relu, ElementConversion, Int, Tensor, TensorData};
#[cfg(feature = "burn")]
use rand::seq::SliceRandom;

#[cfg(not(feature = "burn"))]
use crate::utils::error::BenchError;

pub const VERSION: &str = match option_env!("GPUBENCH_BURN_VERSION") {
    Some(version) => version,
    None => "unknown",
};

pub const LEARNING_RATE: f64 = 1e-3;
pub const VALIDATION_SPLIT: f32 = 0.2;

#[derive(Debug, Default, Clone, Copy)]
pub struct BurnProbe;

#[async_trait]
impl FrameworkProbe for BurnProbe {
    fn kind(&self) -> FrameworkKind {
        FrameworkKind::Burn
    }

    #[cfg(feature = "burn")]
    async fn load(&self, runner: &dyn CommandRunner, options: &FrameworkOptions) -> Result<FrameworkInfo> {
        use crate::app::frameworks::host_cpu;
        use crate::domain::model::BuildInfo;

        tracing::debug!("Loading Burn {} (log level {})", VERSION, options.log_level);

        let mut devices = vec![host_cpu()];
        let mut backends = vec!["ndarray".to_string()];

        #[cfg(feature = "cuda")]
        {
            backends.push("cuda".to_string());
            devices.extend(crate::app::frameworks::nvidia_gpus(runner).await?);
        }
        #[cfg(not(feature = "cuda"))]
        let _ = runner;

        Ok(FrameworkInfo {
            kind: FrameworkKind::Burn,
            version: VERSION.to_string(),
            build: BuildInfo {
                cuda_version: option_env!("GPUBENCH_BUILD_CUDA_VERSION").map(str::to_string),
                cudnn_version: option_env!("GPUBENCH_BUILD_CUDNN_VERSION").map(str::to_string),
                backends,
            },
            devices,
        })
    }

    #[cfg(not(feature = "burn"))]
    async fn load(&self, _runner: &dyn CommandRunner, _options: &FrameworkOptions) -> Result<FrameworkInfo> {
        Err(BenchError::FrameworkMissingError {
            framework: FrameworkKind::Burn.display_name().to_string(),
        })
    }
}

#[cfg(feature = "burn")]
#[derive(Module, Debug)]
pub struct ConvNet<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    pool: MaxPool2d,
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
}

#[cfg(feature = "burn")]
impl<B: Backend> ConvNet<B> {
    pub fn new(device: &B::Device) -> Self {
        Self {
            conv1: Conv2dConfig::new([CHANNELS, 64], [3, 3]).init(device),
            conv2: Conv2dConfig::new([64, 128], [3, 3]).init(device),
            conv3: Conv2dConfig::new([128, 256], [3, 3]).init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            fc1: LinearConfig::new(256 * 2 * 2, 1024).init(device),
            fc2: LinearConfig::new(1024, 512).init(device),
            fc3: LinearConfig::new(512, CLASSES).init(device),
        }
    }

    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.pool.forward(relu(self.conv1.forward(images)));
        let x = self.pool.forward(relu(self.conv2.forward(x)));
        let x = self.pool.forward(relu(self.conv3.forward(x)));

        let [batch, channels, height, width] = x.dims();
        let x = x.reshape([batch, channels * height * width]);

        let x = relu(self.fc1.forward(x));
        let x = relu(self.fc2.forward(x));
        self.fc3.forward(x)
    }
}

/// Copies the selected samples to `device`, scaled to [0, 1].
#[cfg(feature = "burn")]
fn batch<B: Backend>(
    split: &CifarSplit,
    indices: &[usize],
    device: &B::Device,
) -> (Tensor<B, 4>, Tensor<B, 1, Int>) {
    let mut pixels = Vec::with_capacity(indices.len() * IMAGE_BYTES);
    let mut labels = Vec::with_capacity(indices.len());
    for &i in indices {
        pixels.extend(split.image(i).iter().map(|&p| p as f32 / 255.0));
        labels.push(split.labels[i] as i64);
    }

    let images = Tensor::<B, 4>::from_data(
        TensorData::new(pixels, [indices.len(), CHANNELS, HEIGHT, WIDTH]),
        device,
    );
    let targets = Tensor::<B, 1, Int>::from_data(TensorData::new(labels, [indices.len()]), device);
    (images, targets)
}

#[cfg(feature = "burn")]
fn accuracy<B: Backend>(
    model: &ConvNet<B>,
    split: &CifarSplit,
    batch_size: usize,
    device: &B::Device,
) -> Option<f32> {
    if split.is_empty() {
        return None;
    }

    let indices: Vec<usize> = (0..split.len()).collect();
    let mut correct = 0i64;
    for chunk in indices.chunks(batch_size) {
        let (images, targets) = batch::<B>(split, chunk, device);
        let predicted = model.forward(images).argmax(1).squeeze::<1>(1);
        correct += predicted
            .equal(targets)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();
    }
    Some(correct as f32 / split.len() as f32)
}

/// Adam over the training split, reporting loss and held-out accuracy each
/// epoch.
#[cfg(feature = "burn")]
pub fn fit<B: AutodiffBackend>(
    device: &B::Device,
    train: &CifarSplit,
    valid: &CifarSplit,
    plan: &TrainingPlan,
    monitor: &SystemMonitor,
) -> TrainingOutcome {
    let mut model = ConvNet::<B>::new(device);
    let mut optim = AdamConfig::new().init::<B, ConvNet<B>>();
    let loss_fn = CrossEntropyLossConfig::new().init::<B>(device);

    let batch_size = plan.batch_size.max(1);
    let mut order: Vec<usize> = (0..train.len()).collect();
    let mut rng = rand::thread_rng();
    let mut outcome = TrainingOutcome {
        train_samples: train.len(),
        ..TrainingOutcome::default()
    };

    for epoch in 1..=plan.epochs {
        order.shuffle(&mut rng);

        let mut losses = Vec::new();
        for indices in order.chunks(batch_size) {
            let (images, targets) = batch::<B>(train, indices, device);
            let logits = model.forward(images);
            let loss = loss_fn.forward(logits, targets);
            let loss_detached = loss.clone().detach();

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(plan.learning_rate, model, grads);

            let loss_val: f32 = loss_detached
                .into_data()
                .to_vec::<f32>()
                .unwrap_or_default()
                .into_iter()
                .next()
                .unwrap_or(0.0);
            losses.push(loss_val);
        }

        let avg_loss = if losses.is_empty() {
            0.0
        } else {
            losses.iter().sum::<f32>() / losses.len() as f32
        };
        let val_accuracy = accuracy(&model.valid(), valid, batch_size, device);

        println!(
            "Epoch {}/{} - loss: {:.4} - val_accuracy: {:.4}",
            epoch,
            plan.epochs,
            avg_loss,
            val_accuracy.unwrap_or(0.0)
        );
        monitor.log_stats(&format!("Epoch {}", epoch));

        outcome.epochs_completed = epoch;
        outcome.final_loss = Some(avg_loss);
        outcome.validation_accuracy = val_accuracy;
    }

    outcome
}

/// Trains on CUDA device 0 when this build has the `cuda` feature and the
/// host has a GPU, otherwise on the NdArray CPU backend.
pub struct BurnTrainer {
    data: CifarSplit,
    use_gpu: bool,
}

impl BurnTrainer {
    pub fn new(data: CifarSplit, gpu_visible: bool) -> Self {
        let use_gpu = cfg!(feature = "cuda") && gpu_visible;
        Self { data, use_gpu }
    }

    /// Picks the device for this build. A failed GPU query falls back to the
    /// CPU backend; without `cuda` nothing is queried.
    pub async fn detect(data: CifarSplit, runner: &dyn CommandRunner) -> Self {
        if !cfg!(feature = "cuda") {
            return Self::new(data, false);
        }

        let gpu_visible = match nvidia_gpus(runner).await {
            Ok(gpus) => {
                tracing::info!("{} GPU(s) visible", gpus.len());
                !gpus.is_empty()
            }
            Err(e) => {
                tracing::warn!("GPU query failed, training on the CPU: {}", e);
                false
            }
        };
        Self::new(data, gpu_visible)
    }
}

impl Trainer for BurnTrainer {
    fn framework(&self) -> FrameworkKind {
        FrameworkKind::Burn
    }

    fn device_label(&self) -> String {
        if self.use_gpu {
            "cuda:0".to_string()
        } else {
            "ndarray:cpu".to_string()
        }
    }

    #[cfg(feature = "burn")]
    fn train(&mut self, plan: &TrainingPlan, monitor: &SystemMonitor) -> Result<TrainingOutcome> {
        let (train, valid) = self.data.clone().split_tail(plan.validation_split);
        tracing::info!(
            "Burn split: {} train / {} validation samples",
            train.len(),
            valid.len()
        );

        #[cfg(feature = "cuda")]
        {
            if self.use_gpu {
                let device = burn::backend::cuda::CudaDevice::new(0);
                return Ok(fit::<Autodiff<burn::backend::Cuda>>(
                    &device, &train, &valid, plan, monitor,
                ));
            }
        }

        Ok(fit::<Autodiff<NdArray>>(
            &NdArrayDevice::Cpu,
            &train,
            &valid,
            plan,
            monitor,
        ))
    }

    #[cfg(not(feature = "burn"))]
    fn train(&mut self, _plan: &TrainingPlan, _monitor: &SystemMonitor) -> Result<TrainingOutcome> {
        Err(BenchError::FrameworkMissingError {
            framework: FrameworkKind::Burn.display_name().to_string(),
        })
    }
}

#[cfg(all(test, feature = "burn"))]
mod tests {
    use super::*;

    type TestBackend = NdArray;

    fn tiny_split(samples: usize) -> CifarSplit {
        CifarSplit {
            images: (0..samples)
                .flat_map(|i| vec![(i * 25) as u8; IMAGE_BYTES])
                .collect(),
            labels: (0..samples).map(|i| (i % CLASSES) as u8).collect(),
        }
    }

    #[test]
    fn test_forward_produces_class_logits() {
        let device = NdArrayDevice::Cpu;
        let model = ConvNet::<TestBackend>::new(&device);
        let images = Tensor::<TestBackend, 4>::zeros([3, CHANNELS, HEIGHT, WIDTH], &device);
        assert_eq!(model.forward(images).dims(), [3, CLASSES]);
    }

    #[test]
    fn test_batch_scales_to_unit_interval() {
        let split = tiny_split(2);
        let (images, targets) = batch::<TestBackend>(&split, &[1], &NdArrayDevice::Cpu);
        let pixels = images.into_data().to_vec::<f32>().unwrap();
        assert!((pixels[0] - 25.0 / 255.0).abs() < 1e-6);
        assert_eq!(targets.into_data().to_vec::<i64>().unwrap(), vec![1]);
    }

    #[test]
    fn test_fit_reports_validation_accuracy() {
        let (train, valid) = tiny_split(10).split_tail(VALIDATION_SPLIT);
        let plan = TrainingPlan {
            epochs: 1,
            batch_size: 4,
            learning_rate: LEARNING_RATE,
            validation_split: VALIDATION_SPLIT,
            worker_threads: 1,
        };

        let outcome = fit::<Autodiff<TestBackend>>(
            &NdArrayDevice::Cpu,
            &train,
            &valid,
            &plan,
            &SystemMonitor::new(false),
        );

        assert_eq!(outcome.epochs_completed, 1);
        assert_eq!(outcome.train_samples, 8);
        let accuracy = outcome.validation_accuracy.unwrap();
        assert!((0.0..=1.0).contains(&accuracy));
    }

    #[test]
    fn test_cpu_fallback_without_gpu() {
        let trainer = BurnTrainer::new(CifarSplit::default(), false);
        assert_eq!(trainer.device_label(), "ndarray:cpu");
    }

    struct BrokenDriver {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl CommandRunner for BrokenDriver {
        async fn output(
            &self,
            program: &str,
            _args: &[&str],
        ) -> std::result::Result<crate::domain::ports::CommandOutput, crate::utils::error::ProcessError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(crate::utils::error::ProcessError::Failed {
                program: program.to_string(),
                status: Some(9),
                stderr: "NVIDIA-SMI has failed because it couldn't communicate with the NVIDIA driver"
                    .to_string(),
            })
        }

        async fn interactive(
            &self,
            program: &str,
            args: &[&str],
        ) -> std::result::Result<(), crate::utils::error::ProcessError> {
            self.output(program, args).await.map(|_| ())
        }
    }

    #[tokio::test]
    async fn test_failed_gpu_query_trains_on_cpu() {
        let runner = BrokenDriver {
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let trainer = BurnTrainer::detect(tiny_split(2), &runner).await;
        assert_eq!(trainer.device_label(), "ndarray:cpu");

        let queried = runner.calls.load(std::sync::atomic::Ordering::SeqCst);
        if cfg!(feature = "cuda") {
            assert_eq!(queried, 1);
        } else {
            assert_eq!(queried, 0);
        }
    }

    #[tokio::test]
    async fn test_probe_reports_build() {
        use crate::adapters::process::SystemRunner;

        let info = BurnProbe
            .load(&SystemRunner::new(), &FrameworkOptions::default())
            .await
            .unwrap();
        assert_eq!(info.kind, FrameworkKind::Burn);
        assert!(info.build.backends.contains(&"ndarray".to_string()));
    }
}
