// Application layer: the CIFAR-10 reader, the framework integrations and the
// installer workflow.

#[cfg(feature = "cli")]
pub mod bench;
pub mod cifar;
pub mod frameworks;
pub mod installer;

pub use cifar::{Cifar10, CifarSplit};
pub use frameworks::{BurnProbe, BurnTrainer, CandleProbe, CandleTrainer};
pub use installer::{Catalogue, Channel, Installer};
