//! Windows and their run loop.
//!
//! A [`Window`] pairs a [`Host`] (platform window and events) with a
//! presentation [`Backend`](crate::surface::Backend) and drives the app's
//! draw and update cadences on the calling thread.

mod handle;
mod host;
mod native;
mod runtime;

pub use handle::StopHandle;
pub use host::{HeadlessHost, Host};
pub use native::NativeHost;
pub use runtime::{Window, WindowConfig, WindowState};
