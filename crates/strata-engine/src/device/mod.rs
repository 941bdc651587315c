//! GPU device, surface and composition backend.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the window Surface (swapchain)
//! - [`GpuBackend`]: canvas surfaces as textures, composited with one
//!   pipeline per blend mode

mod backend;
mod gpu;
mod init;
mod pipeline;
mod surface;

pub use backend::GpuBackend;
pub use gpu::{Gpu, GpuFrame};
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
