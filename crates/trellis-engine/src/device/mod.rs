//! GPU device management.
//!
//! Creates the wgpu Instance/Adapter/Device/Queue for hosts that do not bring
//! their own. Surfaces and presentation are out of scope.

mod gpu;

pub use gpu::{Gpu, GpuInit};
