//! Fourier transform plans, the process-wide plan registry and the
//! loop-level execution policy shared by the plane-field engine.

pub mod exec;
mod plan;
mod registry;

pub use exec::ExecPolicy;
pub use plan::FourierPlans;
pub use registry::{PlanKey, TransformRegistry};

pub use rustfft::num_complex::Complex;
