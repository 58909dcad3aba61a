// Adapters layer: concrete implementations for external systems (processes,
// the sampling profiler, http downloads).

pub mod http;
pub mod process;
pub mod profiler;

pub use http::HttpFetcher;
pub use process::SystemRunner;
pub use profiler::PprofProfiler;
