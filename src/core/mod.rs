pub mod benchmark;
pub mod dispatch;
pub mod probe;
pub mod report;
pub mod viewer;

pub use crate::domain::model::{FrameworkInfo, Mode, ProfileArtifact, Variant};
pub use crate::domain::ports::{CommandRunner, FrameworkProbe, Profiler, Trainer};
pub use crate::utils::error::Result;
