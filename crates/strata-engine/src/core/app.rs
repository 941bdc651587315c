use crate::input::EngineEvent;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    /// Stop the window at the next tick boundary.
    Exit,
}

/// Application contract driven by [`Window::start`](crate::window::Window::start).
///
/// All hooks run on the thread that called `start`, one at a time.
pub trait App {
    /// One-time setup before the first tick. An error stops the window and
    /// is returned from `start`.
    fn on_load(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called at the draw cadence, before composition. Mutate the background
    /// buffer, layers and sprites here.
    fn on_draw(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;

    /// Called at the update cadence with the seconds elapsed since the
    /// previous update tick.
    fn on_update(&mut self, ctx: &mut FrameCtx<'_>, elapsed: f32) -> AppControl {
        let _ = (ctx, elapsed);
        AppControl::Continue
    }

    /// Called for each event addressed to the window, at tick boundaries.
    fn on_event(&mut self, ctx: &mut FrameCtx<'_>, event: &EngineEvent) -> AppControl {
        let _ = (ctx, event);
        AppControl::Continue
    }
}
