// Domain layer: core models and ports (interfaces) shared by the probe, the
// reporters and the benchmark harness.

pub mod model;
pub mod ports;
