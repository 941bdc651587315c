use std::sync::Arc;
use std::time::Duration;

use strata_engine::canvas::{Pixel, Sprite};
use strata_engine::core::{App, AppControl, FrameCtx};
use strata_engine::input::{ButtonState, EngineEvent, EventKind, Key};
use strata_engine::resources::ResourceTracker;
use strata_engine::surface::{BlendMode, SoftwareBackend};
use strata_engine::time::{ManualTimer, PacingConfig, Timer};
use strata_engine::window::{HeadlessHost, Window, WindowConfig, WindowState};
use strata_engine::{EngineError, Result};

const RED: Pixel = Pixel::rgb(255, 0, 0);

fn config(w: u32, h: u32) -> WindowConfig {
    WindowConfig {
        title: "scenario".to_string(),
        pixel_width: w,
        pixel_height: h,
        ..WindowConfig::default()
    }
}

fn window_with_host(
    tracker: &Arc<ResourceTracker>,
    host: HeadlessHost,
    w: u32,
    h: u32,
) -> Result<(Window, ManualTimer)> {
    let timer = ManualTimer::new();
    let window = Window::with_parts(
        config(w, h),
        tracker.clone(),
        Box::new(host),
        Box::new(SoftwareBackend::new(w, h)?),
        Box::new(timer.clone()),
    )?;
    Ok((window, timer))
}

fn window(tracker: &Arc<ResourceTracker>, w: u32, h: u32) -> (Window, ManualTimer) {
    window_with_host(tracker, HeadlessHost::new(w, h), w, h).unwrap()
}

/// Paints the origin red in the first draw, then reads the background
/// surface back from the update tick that follows it.
#[derive(Default)]
struct RedOrigin {
    draws: u32,
    surface: Option<Vec<Pixel>>,
}

impl App for RedOrigin {
    fn on_draw(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        self.draws += 1;
        if self.draws == 1 {
            ctx.background_mut().set_pixel(0, 0, RED);
        }
        AppControl::Continue
    }

    fn on_update(&mut self, ctx: &mut FrameCtx<'_>, _elapsed: f32) -> AppControl {
        if self.draws == 0 {
            return AppControl::Continue;
        }
        self.surface = ctx
            .background()
            .canvas()
            .surface()
            .and_then(|id| ctx.backend().read_surface(id));
        AppControl::Exit
    }
}

#[test]
fn red_pixel_reaches_background_surface() {
    let tracker = ResourceTracker::new();
    let (mut w, _timer) = window(&tracker, 4, 4);
    let mut app = RedOrigin::default();

    // Updates at twice the draw rate: one lands between draw 1 and draw 2.
    w.start(&mut app, 60.0, 120.0).unwrap();

    assert_eq!(app.draws, 1);
    let mut expected = vec![Pixel::TRANSPARENT; 16];
    expected[0] = RED;
    assert_eq!(app.surface, Some(expected));

    let frame = w.backend().read_frame().unwrap();
    assert_eq!(frame[0], RED);
    assert!(frame[1..].iter().all(|p| *p == Pixel::TRANSPARENT));
}

/// Records the timer at every draw and stops after four.
struct PacedDraws {
    timer: ManualTimer,
    at: Vec<Duration>,
}

impl App for PacedDraws {
    fn on_draw(&mut self, _ctx: &mut FrameCtx<'_>) -> AppControl {
        self.at.push(self.timer.now());
        if self.at.len() == 4 {
            AppControl::Exit
        } else {
            AppControl::Continue
        }
    }
}

#[test]
fn pacer_sleeps_once_per_draw_tick() {
    let tracker = ResourceTracker::new();
    let (mut w, timer) = window(&tracker, 2, 2);
    let mut app = PacedDraws {
        timer: timer.clone(),
        at: Vec::new(),
    };

    w.start(&mut app, 60.0, 60.0).unwrap();

    // One sleep ahead of each draw; the loop exits right after the fourth.
    assert_eq!(app.at.len(), 4);
    assert_eq!(timer.sleeps(), 4);

    let interval = Duration::from_secs_f64(1.0 / 60.0);
    for (k, at) in app.at.iter().enumerate() {
        let ideal = interval * (k as u32 + 1);
        let off = if *at > ideal { *at - ideal } else { ideal - *at };
        assert!(off <= Duration::from_millis(1), "draw {k} at {at:?}, ideal {ideal:?}");
    }
    let requested = interval * 4;
    let slept = timer.total_slept();
    let drift = if slept > requested { slept - requested } else { requested - slept };
    assert!(drift < Duration::from_millis(1), "slept {slept:?} for {requested:?}");
}

struct AdditiveGlow {
    layer: Option<usize>,
}

impl App for AdditiveGlow {
    fn on_load(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
        let layer = ctx.add_layer(4, 4, BlendMode::Additive)?;
        if let Some(l) = ctx.layer_mut(layer) {
            l.canvas_mut().fill(Pixel::rgb(100, 0, 0));
        }
        self.layer = Some(layer);
        Ok(())
    }

    fn on_draw(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        ctx.background_mut().fill(Pixel::rgb(50, 0, 0));
        AppControl::Exit
    }
}

#[test]
fn additive_layer_sums_with_background() {
    let tracker = ResourceTracker::new();
    let (mut w, _timer) = window(&tracker, 4, 4);
    let mut app = AdditiveGlow { layer: None };

    w.start(&mut app, 30.0, 30.0).unwrap();

    assert_eq!(app.layer, Some(0));
    let frame = w.backend().read_frame().unwrap();
    assert!(frame.iter().all(|p| p.r == 150 && p.g == 0 && p.b == 0));
}

#[derive(Default)]
struct Churn {
    live_after: usize,
    len_after: usize,
}

impl App for Churn {
    fn on_load(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
        let mut sprites = ctx.sprites_mut();
        sprites.add(Sprite::new(3, 3)?)?;
        sprites.remove_at(0)?;
        sprites.add(Sprite::new(2, 5)?)?;
        self.len_after = sprites.len();
        self.live_after = ctx.backend().live_surfaces();
        Ok(())
    }

    fn on_draw(&mut self, _ctx: &mut FrameCtx<'_>) -> AppControl {
        AppControl::Exit
    }
}

#[test]
fn add_remove_add_leaves_no_stale_surface() {
    let tracker = ResourceTracker::new();
    let (mut w, _timer) = window(&tracker, 4, 4);
    let mut app = Churn::default();

    w.start(&mut app, 60.0, 60.0).unwrap();

    assert_eq!(app.len_after, 1);
    assert_eq!(app.live_after, 1);
    assert_eq!(w.backend().live_surfaces(), 0);
}

#[derive(Default)]
struct Recorder {
    events: Vec<EventKind>,
    /// Draws completed and the frame index the event reported.
    event_frames: Vec<(u32, u64)>,
    draws: u32,
}

impl App for Recorder {
    fn on_draw(&mut self, _ctx: &mut FrameCtx<'_>) -> AppControl {
        self.draws += 1;
        AppControl::Continue
    }

    fn on_event(&mut self, ctx: &mut FrameCtx<'_>, event: &EngineEvent) -> AppControl {
        self.events.push(event.kind.clone());
        self.event_frames.push((self.draws, ctx.time.frame_index));
        AppControl::Continue
    }
}

#[test]
fn host_events_are_routed_and_close_stops() {
    let tracker = ResourceTracker::new();
    let host = HeadlessHost::new(4, 4)
        .with_event(
            Duration::from_millis(30),
            EventKind::Key {
                key: Key::Char('a'),
                state: ButtonState::Pressed,
                repeat: false,
            },
        )
        .with_event(Duration::from_millis(60), EventKind::Resized { width: 8, height: 8 })
        .with_event(Duration::from_millis(100), EventKind::CloseRequested);
    let (mut w, timer) = window_with_host(&tracker, host, 4, 4).unwrap();
    let mut app = Recorder::default();

    w.start(&mut app, 60.0, 60.0).unwrap();

    assert_eq!(app.events.len(), 3);
    assert!(matches!(app.events[0], EventKind::Key { key: Key::Char('a'), .. }));
    assert_eq!(app.events[2], EventKind::CloseRequested);
    assert!(app.draws >= 4);
    // Each event carries the index of the draw that follows it.
    assert!(app.event_frames.iter().all(|&(draws, index)| index == u64::from(draws)));
    assert!(app.event_frames[0].0 > 0);
    assert!(timer.now() >= Duration::from_millis(100));
    assert_eq!(w.state(), WindowState::Stopped);
    assert!(tracker.is_empty());
}

struct DestroyViaTracker {
    tracker: Arc<ResourceTracker>,
    updates: u32,
}

impl App for DestroyViaTracker {
    fn on_draw(&mut self, _ctx: &mut FrameCtx<'_>) -> AppControl {
        AppControl::Continue
    }

    fn on_update(&mut self, ctx: &mut FrameCtx<'_>, _elapsed: f32) -> AppControl {
        self.updates += 1;
        if self.updates == 3 {
            assert!(self.tracker.destroy(ctx.window_id()));
        }
        AppControl::Continue
    }
}

#[test]
fn destroying_the_window_resource_stops_the_loop() {
    let tracker = ResourceTracker::new();
    let (mut w, _timer) = window(&tracker, 2, 2);
    let mut app = DestroyViaTracker {
        tracker: tracker.clone(),
        updates: 0,
    };

    w.start(&mut app, 10.0, 100.0).unwrap();

    assert_eq!(app.updates, 3);
    assert_eq!(w.state(), WindowState::Stopped);
}

#[test]
fn stop_from_another_thread_before_start() {
    let tracker = ResourceTracker::new();
    let (mut w, _timer) = window(&tracker, 2, 2);
    let handle = w.stop_handle();
    std::thread::spawn(move || handle.request()).join().unwrap();

    let mut app = Recorder::default();
    w.start(&mut app, 60.0, 60.0).unwrap();

    assert_eq!(app.draws, 0);
    assert_eq!(w.state(), WindowState::Stopped);
    assert!(!w.is_visible());
}

struct Stall {
    timer: ManualTimer,
    updates: u32,
    elapsed: Vec<f32>,
    draw_dt: Option<f32>,
}

impl App for Stall {
    fn on_draw(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        self.draw_dt = Some(ctx.time.dt);
        AppControl::Exit
    }

    fn on_update(&mut self, _ctx: &mut FrameCtx<'_>, elapsed: f32) -> AppControl {
        self.updates += 1;
        self.elapsed.push(elapsed);
        if self.updates == 1 {
            self.timer.advance(Duration::from_secs(1));
        }
        AppControl::Continue
    }
}

#[test]
fn stalled_update_catches_up_a_bounded_number_of_ticks() {
    let tracker = ResourceTracker::new();
    let (mut w, timer) = window(&tracker, 2, 2);
    let mut app = Stall {
        timer,
        updates: 0,
        elapsed: Vec::new(),
        draw_dt: None,
    };

    w.start(&mut app, 10.0, 50.0).unwrap();

    let max_catch_up = PacingConfig::default().max_catch_up;
    assert_eq!(app.updates, 1 + max_catch_up);
    assert!(app.elapsed.iter().all(|dt| (dt - 0.02).abs() < 1e-4));
    // Draw delta is clamped to the configured maximum.
    assert_eq!(app.draw_dt, Some(0.25));
}

struct FailingLoad;

impl App for FailingLoad {
    fn on_load(&mut self, _ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
        anyhow::bail!("missing asset")
    }

    fn on_draw(&mut self, _ctx: &mut FrameCtx<'_>) -> AppControl {
        panic!("draw after failed load");
    }
}

#[test]
fn load_failure_is_reported_and_stops_the_window() {
    let tracker = ResourceTracker::new();
    let (mut w, _timer) = window(&tracker, 2, 2);

    let err = w.start(&mut FailingLoad, 60.0, 60.0).unwrap_err();

    assert!(matches!(err, EngineError::Hook(_)));
    assert!(err.to_string().contains("missing asset"));
    assert_eq!(w.state(), WindowState::Stopped);
    assert!(tracker.is_empty());
}

#[test]
fn headless_window_composes_at_logical_resolution() {
    let tracker = ResourceTracker::new();
    let mut cfg = config(64, 32);
    cfg.logical_width = Some(8);
    cfg.logical_height = Some(4);
    let mut w = Window::headless(cfg, tracker.clone()).unwrap();
    let mut app = AdditiveGlow { layer: None };

    // Layer is 4x4 but stretched over the 8x4 target.
    w.start(&mut app, 1000.0, 1000.0).unwrap();

    let frame = w.backend().read_frame().unwrap();
    assert_eq!(frame.len(), 8 * 4);
    assert!(frame.iter().all(|p| p.r == 150));
}

#[test]
fn teardown_destroys_windows_still_registered() {
    let tracker = ResourceTracker::new();
    let (a, _) = window(&tracker, 2, 2);
    let (b, _) = window(&tracker, 2, 2);
    assert_ne!(a.id(), b.id());
    assert_eq!(tracker.len(), 2);

    tracker.teardown();
    assert!(tracker.is_empty());
    assert!(matches!(
        Window::headless(config(2, 2), tracker.clone()),
        Err(EngineError::InvalidState(_))
    ));
}
