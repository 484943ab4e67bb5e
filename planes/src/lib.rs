//! Scalar fields on a periodic Cartesian plane with dual physical/spectral
//! representations, the differential operator bank built on top of them,
//! and the 3/2-rule dealiasing used for nonlinear products.

pub mod dealias;
pub mod operators;
mod ops;
mod plane_data;

pub use operators::{Axis, OperatorMode, PlaneOperators, build_difference, kernel_operator};
pub use plane_data::{PlaneData, Representation};

pub use transforms::{Complex, ExecPolicy, FourierPlans, TransformRegistry, exec};
