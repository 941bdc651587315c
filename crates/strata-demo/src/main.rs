use anyhow::Result;

use strata_engine::canvas::{Canvas, Pixel, Sprite};
use strata_engine::coords::Vec2;
use strata_engine::core::{App, AppControl, FrameCtx};
use strata_engine::input::{ButtonState, EngineEvent, EventKind, Key};
use strata_engine::logging::{LoggingConfig, init_logging};
use strata_engine::resources::ResourceTracker;
use strata_engine::surface::BlendMode;
use strata_engine::window::{Window, WindowConfig};

const LOGICAL_W: u32 = 320;
const LOGICAL_H: u32 = 180;

struct Demo {
    glow: usize,
    phase: f32,
    paused: bool,
}

impl Demo {
    fn new() -> Self {
        Self {
            glow: 0,
            phase: 0.0,
            paused: false,
        }
    }
}

impl App for Demo {
    fn on_load(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        self.glow = ctx.add_layer(LOGICAL_W as i32, LOGICAL_H as i32, BlendMode::Additive)?;
        if let Some(layer) = ctx.layer_mut(self.glow) {
            paint_glow(layer.canvas_mut());
        }

        let colors = [
            Pixel::rgb(230, 70, 70),
            Pixel::rgb(70, 200, 90),
            Pixel::rgb(80, 120, 240),
        ];
        let mut sprites = ctx.sprites_mut();
        for (i, color) in colors.into_iter().enumerate() {
            let mut sprite = Sprite::new(24, 24)?.with_z_order(i as i32);
            paint_diamond(sprite.canvas_mut(), color);
            sprites.add(sprite)?;
        }

        log::info!("demo: loaded {} sprites", sprites.len());
        Ok(())
    }

    fn on_draw(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let t = ctx.time.now.as_secs_f32();
        paint_gradient(ctx.background_mut(), t);
        AppControl::Continue
    }

    fn on_update(&mut self, ctx: &mut FrameCtx<'_>, elapsed: f32) -> AppControl {
        if self.paused {
            return AppControl::Continue;
        }
        self.phase += elapsed;

        let centre = Vec2::new(LOGICAL_W as f32 / 2.0 - 12.0, LOGICAL_H as f32 / 2.0 - 12.0);
        let phase = self.phase;
        let mut sprites = ctx.sprites_mut();
        for (i, sprite) in sprites.iter_mut().enumerate() {
            let angle = phase * 1.5 + i as f32 * std::f32::consts::TAU / 3.0;
            sprite.position = centre + Vec2::new(angle.cos() * 60.0, angle.sin() * 40.0);
            sprite.rotation = phase * 90.0 * (i as f32 + 1.0);
            // Nearer sprites (lower on screen) draw on top.
            sprite.z_order = ((angle.sin() * 100.0) as i32).into();
        }
        AppControl::Continue
    }

    fn on_event(&mut self, _ctx: &mut FrameCtx<'_>, event: &EngineEvent) -> AppControl {
        match &event.kind {
            EventKind::Key {
                key: Key::Escape,
                state: ButtonState::Pressed,
                ..
            } => AppControl::Exit,
            EventKind::Key {
                key: Key::Space,
                state: ButtonState::Pressed,
                repeat: false,
            } => {
                self.paused = !self.paused;
                log::info!("demo: paused = {}", self.paused);
                AppControl::Continue
            }
            _ => AppControl::Continue,
        }
    }
}

fn paint_gradient(canvas: &mut Canvas, t: f32) {
    let (w, h) = (canvas.width(), canvas.height());
    let shift = ((t * 0.5).sin() * 0.5 + 0.5) * 80.0;
    for y in 0..h {
        for x in 0..w {
            let fx = x as f32 / w as f32;
            let fy = y as f32 / h as f32;
            let i = canvas.index(x, y);
            canvas.pixels_mut()[i] = Pixel::rgb(
                (fx * 60.0 + shift) as u8,
                (fy * 50.0) as u8,
                (90.0 + fy * 80.0) as u8,
            );
        }
    }
}

fn paint_glow(canvas: &mut Canvas) {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let (cx, cy) = (w / 2.0, h / 2.0);
    let radius = h * 0.45;
    for y in 0..canvas.height() {
        for x in 0..canvas.width() {
            let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            let k = (1.0 - d / radius).clamp(0.0, 1.0);
            let v = (k * k * 90.0) as u8;
            canvas.set_pixel(x, y, Pixel::rgba(v, v / 2, v / 3, 255));
        }
    }
}

fn paint_diamond(canvas: &mut Canvas, color: Pixel) {
    let size = canvas.width().min(canvas.height()) as i32;
    let half = size / 2;
    for y in 0..size {
        for x in 0..size {
            let inside = (x - half).abs() + (y - half).abs() <= half;
            let p = if inside { color } else { Pixel::TRANSPARENT };
            canvas.set_pixel(x as u32, y as u32, p);
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let tracker = ResourceTracker::new();
    let config = WindowConfig {
        title: "strata demo".to_string(),
        pixel_width: LOGICAL_W * 4,
        pixel_height: LOGICAL_H * 4,
        logical_width: Some(LOGICAL_W),
        logical_height: Some(LOGICAL_H),
        ..WindowConfig::default()
    };

    let mut window = Window::create(config, tracker.clone())?;
    let mut demo = Demo::new();
    window.start(&mut demo, 60.0, 120.0)?;

    drop(window);
    tracker.teardown();
    Ok(())
}
