use crate::domain::ports::{Profiler, ProfilerSession};
use crate::utils::error::{BenchError, Result};
use pprof::protos::Message;

/// Sampling profiler backed by `pprof`; sessions encode to the pprof protobuf format.
#[derive(Debug, Clone)]
pub struct PprofProfiler {
    frequency: i32,
}

impl PprofProfiler {
    pub fn new(frequency: i32) -> Self {
        Self { frequency }
    }
}

impl Profiler for PprofProfiler {
    fn start(&self) -> Result<Box<dyn ProfilerSession>> {
        tracing::debug!("Starting profiler at {} Hz", self.frequency);
        let guard = pprof::ProfilerGuardBuilder::default()
            .frequency(self.frequency)
            .blocklist(&["libc", "libgcc", "pthread", "vdso"])
            .build()?;
        Ok(Box::new(PprofSession { guard }))
    }
}

struct PprofSession {
    guard: pprof::ProfilerGuard<'static>,
}

impl ProfilerSession for PprofSession {
    fn finish(self: Box<Self>) -> Result<Vec<u8>> {
        let report = self.guard.report().build()?;
        let profile = report.pprof()?;

        let mut content = Vec::new();
        profile
            .encode(&mut content)
            .map_err(|e| BenchError::IoError(std::io::Error::other(e)))?;
        Ok(content)
    }
}
