use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key as WinitKey, NamedKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window as WinitWindow, WindowAttributes, WindowId};

use crate::input::{ButtonState, EngineEvent, EventKind, Key, MouseButton};
use crate::resources::ResourceId;

use super::host::Host;
use super::runtime::WindowConfig;

/// Pumps allowed while waiting for the platform to hand out the window.
const CREATE_PUMP_LIMIT: usize = 64;

/// `winit` window driven by non-blocking event pumping.
///
/// The run loop stays in control: every tick it pumps pending platform
/// events with a zero timeout instead of handing the thread to `winit`.
pub struct NativeHost {
    event_loop: EventLoop<()>,
    state: HostState,
    visible: bool,
    closed: bool,
}

struct HostState {
    attrs: WindowAttributes,
    window: Option<Arc<WinitWindow>>,
    create_error: Option<anyhow::Error>,
    pending: Vec<EventKind>,
    pointer: (f32, f32),
}

impl NativeHost {
    /// Creates the platform window, initially hidden.
    pub fn new(config: &WindowConfig) -> Result<Self> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;

        let attrs = WinitWindow::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(config.pixel_width, config.pixel_height))
            .with_position(PhysicalPosition::new(config.position.x, config.position.y))
            .with_visible(false);

        let mut host = Self {
            event_loop,
            state: HostState {
                attrs,
                window: None,
                create_error: None,
                pending: Vec::new(),
                pointer: (0.0, 0.0),
            },
            visible: false,
            closed: false,
        };

        for _ in 0..CREATE_PUMP_LIMIT {
            if let PumpStatus::Exit(code) =
                host.event_loop.pump_app_events(Some(Duration::ZERO), &mut host.state)
            {
                return Err(anyhow!("event loop exited with code {code} during window creation"));
            }
            if let Some(err) = host.state.create_error.take() {
                return Err(err);
            }
            if host.state.window.is_some() {
                break;
            }
        }

        let window = host
            .state
            .window
            .clone()
            .context("platform did not create the window")?;
        log::info!(
            "native host: created window {:?} ({}x{})",
            window.id(),
            config.pixel_width,
            config.pixel_height
        );
        Ok(host)
    }

    /// Shared handle for the presentation backend.
    pub fn window(&self) -> Option<Arc<WinitWindow>> {
        self.state.window.clone()
    }
}

impl Host for NativeHost {
    fn native_id(&self) -> Option<ResourceId> {
        self.state
            .window
            .as_ref()
            .map(|w| ResourceId(u64::from(w.id())))
    }

    fn show(&mut self) {
        if let Some(window) = &self.state.window {
            window.set_visible(true);
            window.request_redraw();
            self.visible = true;
        }
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn inner_size(&self) -> (u32, u32) {
        self.state
            .window
            .as_ref()
            .map(|w| {
                let size = w.inner_size();
                (size.width, size.height)
            })
            .unwrap_or((0, 0))
    }

    fn pump_events(&mut self, now: Duration, target: ResourceId, out: &mut Vec<EngineEvent>) {
        if self.closed {
            return;
        }
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.state);
        if let PumpStatus::Exit(code) = status {
            log::debug!("native host: event loop exited ({code})");
            self.state.pending.push(EventKind::CloseRequested);
        }
        out.extend(
            self.state
                .pending
                .drain(..)
                .map(|kind| EngineEvent::new(now, target, kind)),
        );
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.visible = false;
        if let Some(window) = self.state.window.take() {
            window.set_visible(false);
            log::debug!("native host: closed window {:?}", window.id());
        }
        self.state.pending.clear();
    }
}

impl std::fmt::Debug for NativeHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeHost")
            .field("window", &self.state.window.as_ref().map(|w| w.id()))
            .field("visible", &self.visible)
            .field("closed", &self.closed)
            .finish()
    }
}

impl ApplicationHandler for HostState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match event_loop.create_window(self.attrs.clone()) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(e) => self.create_error = Some(anyhow::Error::new(e).context("failed to create window")),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window.as_ref().is_none_or(|w| w.id() != window_id) {
            return;
        }
        if let Some(kind) = translate(&event, &mut self.pointer) {
            self.pending.push(kind);
        }
    }
}

/// Converts a `winit` window event. Pointer buttons report the last known
/// cursor position, tracked in `pointer`.
fn translate(event: &WindowEvent, pointer: &mut (f32, f32)) -> Option<EventKind> {
    match event {
        WindowEvent::CloseRequested => Some(EventKind::CloseRequested),

        WindowEvent::Resized(size) => Some(EventKind::Resized {
            width: size.width,
            height: size.height,
        }),

        WindowEvent::Focused(f) => Some(EventKind::Focused(*f)),

        WindowEvent::CursorMoved { position, .. } => {
            *pointer = (position.x as f32, position.y as f32);
            Some(EventKind::PointerMoved {
                x: pointer.0,
                y: pointer.1,
            })
        }

        WindowEvent::MouseInput { state, button, .. } => Some(EventKind::PointerButton {
            button: map_mouse_button(*button),
            state: map_state(*state),
            x: pointer.0,
            y: pointer.1,
        }),

        WindowEvent::KeyboardInput { event, .. } => Some(EventKind::Key {
            key: map_key(&event.logical_key),
            state: map_state(event.state),
            repeat: event.repeat,
        }),

        _ => None,
    }
}

fn map_state(state: ElementState) -> ButtonState {
    match state {
        ElementState::Pressed => ButtonState::Pressed,
        ElementState::Released => ButtonState::Released,
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Other(3),
        WinitMouseButton::Forward => MouseButton::Other(4),
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(key: &WinitKey) -> Key {
    match key {
        WinitKey::Named(named) => match named {
            NamedKey::Escape => Key::Escape,
            NamedKey::Enter => Key::Enter,
            NamedKey::Space => Key::Space,
            NamedKey::Tab => Key::Tab,
            NamedKey::Backspace => Key::Backspace,
            NamedKey::ArrowUp => Key::ArrowUp,
            NamedKey::ArrowDown => Key::ArrowDown,
            NamedKey::ArrowLeft => Key::ArrowLeft,
            NamedKey::ArrowRight => Key::ArrowRight,
            _ => Key::Unknown,
        },
        WinitKey::Character(text) => match text.chars().next() {
            Some(' ') => Key::Space,
            Some(c) => Key::Char(c),
            None => Key::Unknown,
        },
        _ => Key::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;

    #[test]
    fn maps_named_and_character_keys() {
        assert_eq!(map_key(&WinitKey::Named(NamedKey::Escape)), Key::Escape);
        assert_eq!(map_key(&WinitKey::Named(NamedKey::ArrowLeft)), Key::ArrowLeft);
        assert_eq!(map_key(&WinitKey::Named(NamedKey::F1)), Key::Unknown);
        assert_eq!(map_key(&WinitKey::Character("q".into())), Key::Char('q'));
        assert_eq!(map_key(&WinitKey::Character(" ".into())), Key::Space);
    }

    #[test]
    fn translates_simple_window_events() {
        let mut pointer = (0.0, 0.0);
        assert_eq!(
            translate(&WindowEvent::CloseRequested, &mut pointer),
            Some(EventKind::CloseRequested)
        );
        assert_eq!(
            translate(&WindowEvent::Resized(PhysicalSize::new(640, 480)), &mut pointer),
            Some(EventKind::Resized {
                width: 640,
                height: 480
            })
        );
        assert_eq!(
            translate(&WindowEvent::Focused(true), &mut pointer),
            Some(EventKind::Focused(true))
        );
        assert_eq!(translate(&WindowEvent::Occluded(true), &mut pointer), None);
    }

    #[test]
    fn maps_extra_mouse_buttons() {
        assert_eq!(map_mouse_button(WinitMouseButton::Left), MouseButton::Left);
        assert_eq!(map_mouse_button(WinitMouseButton::Other(9)), MouseButton::Other(9));
    }
}
