//! Reader for the CIFAR-10 binary distribution.
//!
//! Each `*.bin` file holds 10 000 records of one label byte followed by
//! 3 072 pixel bytes (red, green and blue planes of a 32x32 image).

use crate::config::toml_config::CIFAR10_URL;
use crate::utils::error::{BenchError, Result};
use std::fs;
use std::path::Path;

pub const CHANNELS: usize = 3;
pub const HEIGHT: usize = 32;
pub const WIDTH: usize = 32;
pub const CLASSES: usize = 10;
pub const IMAGE_BYTES: usize = CHANNELS * HEIGHT * WIDTH;
pub const RECORD_BYTES: usize = 1 + IMAGE_BYTES;

pub const TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
pub const TEST_FILE: &str = "test_batch.bin";

/// Raw images (CHW, u8) and their labels.
#[derive(Debug, Clone, Default)]
pub struct CifarSplit {
    pub images: Vec<u8>,
    pub labels: Vec<u8>,
}

impl CifarSplit {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn image(&self, index: usize) -> &[u8] {
        &self.images[index * IMAGE_BYTES..(index + 1) * IMAGE_BYTES]
    }

    /// Holds out the last `fraction` of the samples, in order, as a
    /// validation split.
    pub fn split_tail(self, fraction: f32) -> (CifarSplit, CifarSplit) {
        let fraction = fraction.clamp(0.0, 1.0);
        let held_out = (self.len() as f32 * fraction).round() as usize;
        let keep = self.len() - held_out;

        let mut images = self.images;
        let mut labels = self.labels;
        let valid = CifarSplit {
            images: images.split_off(keep * IMAGE_BYTES),
            labels: labels.split_off(keep),
        };
        (CifarSplit { images, labels }, valid)
    }

    fn extend_from_records(&mut self, file: &Path, bytes: &[u8]) -> Result<()> {
        if bytes.len() % RECORD_BYTES != 0 {
            return Err(BenchError::UnparseableOutputError {
                tool: file.display().to_string(),
                detail: format!(
                    "{} bytes is not a whole number of {}-byte records",
                    bytes.len(),
                    RECORD_BYTES
                ),
            });
        }

        for record in bytes.chunks_exact(RECORD_BYTES) {
            let label = record[0];
            if label as usize >= CLASSES {
                return Err(BenchError::UnparseableOutputError {
                    tool: file.display().to_string(),
                    detail: format!("label {} out of range", label),
                });
            }
            self.labels.push(label);
            self.images.extend_from_slice(&record[1..]);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cifar10 {
    pub train: CifarSplit,
    pub test: CifarSplit,
}

impl Cifar10 {
    /// Loads the five training batches (required) and the test batch
    /// (optional) from `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut dataset = Cifar10::default();

        for name in TRAIN_FILES {
            let path = dir.join(name);
            let bytes = fs::read(&path).map_err(|_| BenchError::DatasetMissingError {
                path: path.display().to_string(),
                url: CIFAR10_URL.to_string(),
            })?;
            dataset.train.extend_from_records(&path, &bytes)?;
        }

        let test_path = dir.join(TEST_FILE);
        match fs::read(&test_path) {
            Ok(bytes) => dataset.test.extend_from_records(&test_path, &bytes)?,
            Err(e) => tracing::warn!("No test batch at {}: {}", test_path.display(), e),
        }

        tracing::info!(
            "Loaded CIFAR-10 from {}: {} train / {} test images",
            dir.display(),
            dataset.train.len(),
            dataset.test.len()
        );
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(label: u8, fill: u8) -> Vec<u8> {
        let mut bytes = vec![label];
        bytes.extend(std::iter::repeat(fill).take(IMAGE_BYTES));
        bytes
    }

    fn write_batches(dir: &Path, per_file: usize) {
        for (i, name) in TRAIN_FILES.iter().enumerate() {
            let bytes: Vec<u8> = (0..per_file)
                .flat_map(|j| record(((i + j) % CLASSES) as u8, i as u8))
                .collect();
            fs::write(dir.join(name), bytes).unwrap();
        }
    }

    #[test]
    fn test_load_dir_reads_all_training_batches() {
        let dir = TempDir::new().unwrap();
        write_batches(dir.path(), 4);

        let data = Cifar10::load_dir(dir.path()).unwrap();
        assert_eq!(data.train.len(), 20);
        assert_eq!(data.train.images.len(), 20 * IMAGE_BYTES);
        assert!(data.test.is_empty());
        assert_eq!(data.train.image(4)[0], 1);
    }

    #[test]
    fn test_missing_batch_names_download_url() {
        let dir = TempDir::new().unwrap();
        let err = Cifar10::load_dir(dir.path()).unwrap_err();
        match err {
            BenchError::DatasetMissingError { path, url } => {
                assert!(path.ends_with("data_batch_1.bin"));
                assert_eq!(url, CIFAR10_URL);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_truncated_batch_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_batches(dir.path(), 2);
        fs::write(dir.path().join(TRAIN_FILES[2]), vec![0u8; RECORD_BYTES + 7]).unwrap();
        assert!(Cifar10::load_dir(dir.path()).is_err());
    }

    #[test]
    fn test_split_tail_holds_out_last_fifth() {
        let split = CifarSplit {
            images: (0..10).flat_map(|i| vec![i as u8; IMAGE_BYTES]).collect(),
            labels: (0..10).collect(),
        };
        let (train, valid) = split.split_tail(0.2);
        assert_eq!(train.len(), 8);
        assert_eq!(valid.labels, vec![8, 9]);
        assert_eq!(valid.image(0)[0], 8);
    }
}
