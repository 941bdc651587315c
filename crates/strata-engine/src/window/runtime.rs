use std::sync::Arc;
use std::time::Duration;

use crate::canvas::Canvas;
use crate::coords::Point;
use crate::core::{App, AppControl, FrameCtx, Sprites};
use crate::device::{GpuBackend, GpuInit};
use crate::error::{EngineError, Result};
use crate::input::{EngineEvent, EventKind};
use crate::resources::{Resource, ResourceId, ResourceTracker};
use crate::scene::Scene;
use crate::surface::{Backend, BlendMode, SoftwareBackend};
use crate::time::{Cadence, FrameTime, PacingConfig, SystemTimer, Timer};

use super::handle::{StopHandle, WindowResource};
use super::host::{HeadlessHost, Host};
use super::native::NativeHost;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    /// Initial top-left position in physical screen pixels.
    pub position: Point,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Logical render resolution. Defaults to the pixel size.
    pub logical_width: Option<u32>,
    pub logical_height: Option<u32>,
    pub gpu: GpuInit,
    pub pacing: PacingConfig,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "strata".to_string(),
            position: Point::new(100, 100),
            pixel_width: 1280,
            pixel_height: 720,
            logical_width: None,
            logical_height: None,
            gpu: GpuInit::default(),
            pacing: PacingConfig::default(),
        }
    }
}

impl WindowConfig {
    /// Resolution the scene is composed at.
    pub fn logical_size(&self) -> (u32, u32) {
        (
            self.logical_width.unwrap_or(self.pixel_width),
            self.logical_height.unwrap_or(self.pixel_height),
        )
    }
}

/// Lifecycle of a [`Window`]. Transitions only move forward.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WindowState {
    Created,
    Loaded,
    Running,
    Stopped,
}

/// A window with its scene, presentation backend and run loop.
///
/// Created hidden. [`start`](Self::start) loads the app, shows the window and
/// runs the draw and update cadences on the calling thread until a stop is
/// requested, then releases every surface and the presentation context.
pub struct Window {
    state: WindowState,
    id: ResourceId,
    host: Box<dyn Host>,
    backend: Box<dyn Backend>,
    timer: Box<dyn Timer>,
    scene: Scene,
    tracker: Arc<ResourceTracker>,
    resource: Arc<WindowResource>,
    stop: StopHandle,
    pacing: PacingConfig,
    events: Vec<EngineEvent>,
    shut_down: bool,
}

impl Window {
    /// Creates a native window presented through wgpu.
    pub fn create(config: WindowConfig, tracker: Arc<ResourceTracker>) -> Result<Self> {
        let (logical_width, logical_height) = config.logical_size();
        validate_size(logical_width, logical_height)?;

        let host = NativeHost::new(&config).map_err(|e| EngineError::creation("window", e))?;
        let native = host.window().ok_or_else(|| EngineError::ResourceCreation {
            what: "window",
            reason: "host has no native window".to_string(),
        })?;

        let backend = pollster::block_on(GpuBackend::new(
            native,
            logical_width,
            logical_height,
            config.gpu.clone(),
        ))
        .map_err(|e| EngineError::creation("presentation context", e))?;

        Self::with_parts(
            config,
            tracker,
            Box::new(host),
            Box::new(backend),
            Box::new(SystemTimer::new()),
        )
    }

    /// Creates a window without a display, composed on the CPU.
    ///
    /// The composed frame is available through [`Backend::read_frame`].
    pub fn headless(config: WindowConfig, tracker: Arc<ResourceTracker>) -> Result<Self> {
        let (logical_width, logical_height) = config.logical_size();
        let backend = SoftwareBackend::new(logical_width, logical_height)?;
        let host = HeadlessHost::new(config.pixel_width, config.pixel_height);
        Self::with_parts(
            config,
            tracker,
            Box::new(host),
            Box::new(backend),
            Box::new(SystemTimer::new()),
        )
    }

    /// Assembles a window from explicit parts and registers it with
    /// `tracker`.
    pub fn with_parts(
        config: WindowConfig,
        tracker: Arc<ResourceTracker>,
        host: Box<dyn Host>,
        backend: Box<dyn Backend>,
        timer: Box<dyn Timer>,
    ) -> Result<Self> {
        let (logical_width, logical_height) = config.logical_size();
        validate_size(logical_width, logical_height)?;
        let (scene_width, scene_height) = scene_extent(logical_width, logical_height)?;
        let scene = Scene::new(scene_width, scene_height)?;

        let id = host.native_id().unwrap_or_else(|| tracker.allocate_id());
        let stop = StopHandle::new();
        let resource = WindowResource::new(id, stop.clone());
        tracker.register(resource.clone())?;

        log::info!(
            "window {id}: created \"{}\" ({}x{} px, logical {logical_width}x{logical_height})",
            config.title,
            config.pixel_width,
            config.pixel_height
        );

        Ok(Self {
            state: WindowState::Created,
            id,
            host,
            backend,
            timer,
            scene,
            tracker,
            resource,
            stop,
            pacing: config.pacing,
            events: Vec::new(),
            shut_down: false,
        })
    }

    #[inline]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.host.is_visible()
    }

    /// Requests a stop. Takes effect at the next tick boundary.
    pub fn stop(&self) {
        self.stop.request();
    }

    /// Handle for stopping the window from hooks or other threads.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn background_mut(&mut self) -> &mut Canvas {
        self.scene.background_mut().canvas_mut()
    }

    /// Allocates and appends a layer. Returns its index.
    pub fn add_layer(&mut self, width: i32, height: i32, blend: BlendMode) -> Result<usize> {
        if self.state == WindowState::Stopped {
            return Err(EngineError::InvalidState("window is stopped"));
        }
        self.scene.add_layer(width, height, blend, self.backend.as_mut())
    }

    /// Sprite collection bound to this window's backend.
    pub fn sprites(&mut self) -> Sprites<'_> {
        Sprites::new(self.scene.sprites_mut(), self.backend.as_mut())
    }

    /// Runs the window until it is stopped.
    ///
    /// `draw_rate` and `update_rate` are ticks per second and must be finite
    /// and positive; they are checked before anything else happens. The
    /// window is shut down when this returns, with or without an error.
    pub fn start<A>(&mut self, app: &mut A, draw_rate: f64, update_rate: f64) -> Result<()>
    where
        A: App + ?Sized,
    {
        if self.state != WindowState::Created {
            return Err(EngineError::InvalidState("window can only be started once"));
        }
        let now = self.timer.now();
        let mut draw = Cadence::new("draw", draw_rate, now, &self.pacing)?;
        let mut update = Cadence::new("update", update_rate, now, &self.pacing)?;

        let result = self.run(app, &mut draw, &mut update);
        if let Err(e) = &result {
            log::error!("window {}: stopped with error: {e}", self.id);
        }
        self.shutdown();
        result
    }

    fn run<A>(&mut self, app: &mut A, draw: &mut Cadence, update: &mut Cadence) -> Result<()>
    where
        A: App + ?Sized,
    {
        let now = self.timer.now();
        let load_time = FrameTime {
            dt: 0.0,
            now,
            frame_index: 0,
        };
        app.on_load(&mut self.ctx(load_time))
            .map_err(EngineError::Hook)?;
        self.state = WindowState::Loaded;

        self.host.show();
        self.state = WindowState::Running;
        log::info!(
            "window {}: running (draw {:?}, update {:?})",
            self.id,
            draw.interval(),
            update.interval()
        );

        // Scheduled time the last pacer sleep aimed for. A finished sleep
        // counts as having reached it, even when the primitive's granularity
        // woke the thread up to one unit early.
        let mut wake = self.timer.now();
        loop {
            if self.stop.is_requested() {
                break;
            }
            let now = self.timer.now();
            let at = now.max(wake);

            self.collect_events(now);
            self.deliver_events(app, at, draw.frame_index());
            if self.stop.is_requested() {
                break;
            }

            self.run_updates(app, update, at);
            if self.stop.is_requested() {
                break;
            }

            if draw.is_due(at) {
                self.draw_frame(app, draw, at)?;
                if draw.is_due(at) {
                    draw.resync(at);
                }
            }
            if self.stop.is_requested() {
                break;
            }

            // One pacer call per wake, on the cadence that is due first.
            let next = if draw.next_due() <= update.next_due() {
                &mut *draw
            } else {
                &mut *update
            };
            let target = next.next_due();
            let wait = target.saturating_sub(self.timer.now().max(wake));
            wake = target;
            if !wait.is_zero() {
                next.pacer_mut().sleep(wait, self.timer.as_mut());
            }
        }
        Ok(())
    }

    /// Pumps the host and routes its events through the tracker.
    fn collect_events(&mut self, now: Duration) {
        self.host.pump_events(now, self.id, &mut self.events);
        for event in self.events.drain(..) {
            self.tracker.dispatch(&event);
        }
    }

    /// Hands queued events to the app. Their `FrameTime` carries the index
    /// of the draw tick that comes next.
    fn deliver_events<A>(&mut self, app: &mut A, now: Duration, frame_index: u64)
    where
        A: App + ?Sized,
    {
        for event in self.resource.drain() {
            if let EventKind::Resized { width, height } = event.kind {
                self.backend.resize_target(width, height);
            }
            let time = FrameTime {
                dt: 0.0,
                now,
                frame_index,
            };
            let control = app.on_event(&mut self.ctx(time), &event);
            if control == AppControl::Exit || event.is_close_request() {
                log::debug!("window {}: stop requested by {:?}", self.id, event.kind);
                self.stop.request();
                break;
            }
        }
    }

    fn run_updates<A>(&mut self, app: &mut A, update: &mut Cadence, now: Duration)
    where
        A: App + ?Sized,
    {
        let mut ticks = 0;
        while update.is_due(now) && !self.stop.is_requested() {
            if ticks == self.pacing.max_catch_up {
                log::warn!(
                    "window {}: update cadence {:?} behind, dropping missed ticks",
                    self.id,
                    now.saturating_sub(update.next_due())
                );
                update.resync(now);
                break;
            }
            let time = update.tick();
            if app.on_update(&mut self.ctx(time), time.dt) == AppControl::Exit {
                self.stop.request();
                break;
            }
            ticks += 1;
        }
    }

    fn draw_frame<A>(&mut self, app: &mut A, draw: &mut Cadence, now: Duration) -> Result<()>
    where
        A: App + ?Sized,
    {
        let time = draw.tick_at(now);
        self.scene.begin_draw(self.backend.as_mut())?;
        if app.on_draw(&mut self.ctx(time)) == AppControl::Exit {
            self.stop.request();
        }
        self.scene.compose(self.backend.as_mut())
    }

    fn ctx(&mut self, time: FrameTime) -> FrameCtx<'_> {
        FrameCtx::new(time, self.id, &mut self.scene, self.backend.as_mut(), &self.stop)
    }

    /// Releases every surface, the presentation context and the native
    /// window, and leaves the tracker. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.scene.release(self.backend.as_mut());
        self.backend.shutdown();
        self.host.close();

        let resource: Arc<dyn Resource> = self.resource.clone();
        self.tracker.unregister(&resource);
        self.resource.destroy();

        self.state = WindowState::Stopped;
        log::info!("window {}: shut down", self.id);
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("viewport", &self.backend.viewport())
            .finish_non_exhaustive()
    }
}

fn validate_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(EngineError::dimensions(width as i64, height as i64));
    }
    Ok(())
}

fn scene_extent(width: u32, height: u32) -> Result<(i32, i32)> {
    match (i32::try_from(width), i32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(EngineError::dimensions(width as i64, height as i64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Pixel;
    use crate::time::ManualTimer;

    struct Counter {
        draws: u32,
        updates: u32,
        stop_after_draws: u32,
    }

    impl App for Counter {
        fn on_draw(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
            self.draws += 1;
            ctx.background_mut().fill(Pixel::rgb(0, 0, 200));
            if self.draws >= self.stop_after_draws {
                AppControl::Exit
            } else {
                AppControl::Continue
            }
        }

        fn on_update(&mut self, _ctx: &mut FrameCtx<'_>, _elapsed: f32) -> AppControl {
            self.updates += 1;
            AppControl::Continue
        }
    }

    fn config() -> WindowConfig {
        WindowConfig {
            pixel_width: 8,
            pixel_height: 8,
            logical_width: Some(4),
            logical_height: Some(4),
            ..WindowConfig::default()
        }
    }

    fn window(tracker: &Arc<ResourceTracker>) -> (Window, ManualTimer) {
        let timer = ManualTimer::new();
        let w = Window::with_parts(
            config(),
            tracker.clone(),
            Box::new(HeadlessHost::new(8, 8)),
            Box::new(SoftwareBackend::new(4, 4).unwrap()),
            Box::new(timer.clone()),
        )
        .unwrap();
        (w, timer)
    }

    #[test]
    fn logical_size_defaults_to_pixels() {
        let c = WindowConfig {
            pixel_width: 10,
            pixel_height: 20,
            ..WindowConfig::default()
        };
        assert_eq!(c.logical_size(), (10, 20));
        assert_eq!(config().logical_size(), (4, 4));
    }

    #[test]
    fn runs_until_exit_then_shuts_down() {
        let tracker = ResourceTracker::new();
        let (mut w, _timer) = window(&tracker);
        assert_eq!(w.state(), WindowState::Created);
        assert_eq!(tracker.len(), 1);

        let mut app = Counter {
            draws: 0,
            updates: 0,
            stop_after_draws: 3,
        };
        w.start(&mut app, 10.0, 20.0).unwrap();

        assert_eq!(app.draws, 3);
        assert!(app.updates >= 5);
        assert_eq!(w.state(), WindowState::Stopped);
        assert_eq!(w.backend().live_surfaces(), 0);
        assert!(tracker.is_empty());
    }

    #[test]
    fn invalid_rates_leave_window_created() {
        let tracker = ResourceTracker::new();
        let (mut w, _timer) = window(&tracker);
        let mut app = Counter {
            draws: 0,
            updates: 0,
            stop_after_draws: 1,
        };
        assert!(matches!(
            w.start(&mut app, 0.0, 60.0),
            Err(EngineError::InvalidRate { name: "draw", .. })
        ));
        assert!(matches!(
            w.start(&mut app, 60.0, f64::NAN),
            Err(EngineError::InvalidRate { name: "update", .. })
        ));
        assert_eq!(w.state(), WindowState::Created);
        assert_eq!(app.draws, 0);
    }

    #[test]
    fn second_start_is_rejected() {
        let tracker = ResourceTracker::new();
        let (mut w, _timer) = window(&tracker);
        let mut app = Counter {
            draws: 0,
            updates: 0,
            stop_after_draws: 1,
        };
        w.start(&mut app, 30.0, 30.0).unwrap();
        assert!(matches!(
            w.start(&mut app, 30.0, 30.0),
            Err(EngineError::InvalidState(_))
        ));
        assert!(w.add_layer(2, 2, BlendMode::Alpha).is_err());
    }

    #[test]
    fn zero_logical_size_is_rejected() {
        let tracker = ResourceTracker::new();
        let cfg = WindowConfig {
            logical_width: Some(0),
            ..config()
        };
        let r = Window::with_parts(
            cfg,
            tracker.clone(),
            Box::new(HeadlessHost::new(8, 8)),
            Box::new(SoftwareBackend::new(4, 4).unwrap()),
            Box::new(ManualTimer::new()),
        );
        assert!(matches!(r, Err(EngineError::InvalidDimensions { .. })));
        assert!(tracker.is_empty());
    }

    #[test]
    fn drop_releases_everything() {
        let tracker = ResourceTracker::new();
        {
            let (mut w, _timer) = window(&tracker);
            w.add_layer(2, 2, BlendMode::Additive).unwrap();
            assert_eq!(tracker.len(), 1);
        }
        assert!(tracker.is_empty());
    }
}
