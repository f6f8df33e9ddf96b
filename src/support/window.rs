use derive_builder::Builder;
use log::debug;
use serde::Deserialize;
use snafu::{ResultExt, Snafu};
use std::{
    any::Any,
    panic::{self, UnwindSafe},
};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent as WinitEvent},
    event_loop::{ControlFlow, EventLoop},
    platform::desktop::EventLoopExtDesktop,
    window::{Window as WinitHandle, WindowBuilder},
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to initialize the window system: {}", message))]
    InitWindowSystem { message: String },

    #[snafu(display("Failed to create window '{}': {}", title, source))]
    CreateWindow {
        title: String,
        source: winit::error::OsError,
    },

    #[snafu(display("Invalid window settings: {}", message))]
    InvalidSettings { message: String },
}

#[derive(Debug, Clone, PartialEq, Builder, Deserialize)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            width: 800,
            height: 600,
            resizable: true,
        }
    }
}

impl WindowSettingsBuilder {
    pub fn finish(&self) -> Result<WindowSettings> {
        self.build()
            .map_err(|message| Error::InvalidSettings { message })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    FramebufferResized { width: u32, height: u32 },
    CloseRequested,
}

/// The surface an application shell drives its poll loop against.
///
/// `destroy` releases the window itself and `terminate` tears down the
/// windowing system behind it. Callers invoke each at most once, in that order.
pub trait Window {
    fn should_close(&self) -> bool;
    fn set_should_close(&mut self, should_close: bool);

    /// Processes every pending window-system event, handing the relevant ones
    /// to `handler`, then returns.
    fn poll_events(&mut self, handler: &mut dyn FnMut(WindowEvent));

    fn framebuffer_size(&self) -> (u32, u32);
    fn destroy(&mut self);
    fn terminate(&mut self);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("unknown error"))
}

/// Runs a window-system initializer that reports failure by panicking and
/// turns the panic into an error.
fn catch_init<T>(init: impl FnOnce() -> T + UnwindSafe) -> Result<T> {
    let hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let result = panic::catch_unwind(init);
    panic::set_hook(hook);

    result.map_err(|payload| Error::InitWindowSystem {
        message: panic_message(payload.as_ref()),
    })
}

pub struct WinitWindow {
    event_loop: Option<EventLoop<()>>,
    window: Option<WinitHandle>,
    should_close: bool,
}

impl WinitWindow {
    pub fn new(settings: &WindowSettings) -> Result<Self> {
        let event_loop = catch_init(EventLoop::<()>::new)?;
        let window = WindowBuilder::new()
            .with_title(&settings.title)
            .with_inner_size(PhysicalSize::new(settings.width, settings.height))
            .with_resizable(settings.resizable)
            .build(&event_loop)
            .context(CreateWindow {
                title: settings.title.as_str(),
            })?;

        Ok(Self {
            event_loop: Some(event_loop),
            window: Some(window),
            should_close: false,
        })
    }
}

impl Window for WinitWindow {
    fn should_close(&self) -> bool {
        self.should_close
    }

    fn set_should_close(&mut self, should_close: bool) {
        self.should_close = should_close;
    }

    fn poll_events(&mut self, handler: &mut dyn FnMut(WindowEvent)) {
        let (event_loop, window) = match (self.event_loop.as_mut(), self.window.as_ref()) {
            (Some(event_loop), Some(window)) => (event_loop, window),
            _ => return,
        };

        let window_id = window.id();
        let should_close = &mut self.should_close;

        event_loop.run_return(|event, _, control_flow| {
            *control_flow = ControlFlow::Poll;
            match event {
                Event::WindowEvent {
                    window_id: id,
                    event,
                } if id == window_id => match event {
                    WinitEvent::CloseRequested => {
                        *should_close = true;
                        handler(WindowEvent::CloseRequested);
                    }
                    WinitEvent::KeyboardInput {
                        input:
                            KeyboardInput {
                                virtual_keycode: Some(VirtualKeyCode::Escape),
                                state: ElementState::Pressed,
                                ..
                            },
                        ..
                    } => {
                        *should_close = true;
                        handler(WindowEvent::CloseRequested);
                    }
                    WinitEvent::Resized(PhysicalSize { width, height }) => {
                        handler(WindowEvent::FramebufferResized { width, height });
                    }
                    _ => {}
                },
                Event::MainEventsCleared => *control_flow = ControlFlow::Exit,
                _ => {}
            }
        });
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.window
            .as_ref()
            .map(|window| {
                let size = window.inner_size();
                (size.width, size.height)
            })
            .unwrap_or((0, 0))
    }

    fn destroy(&mut self) {
        if self.window.take().is_some() {
            debug!("Window destroyed");
        }
    }

    fn terminate(&mut self) {
        if self.event_loop.take().is_some() {
            debug!("Window system terminated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_sample_window() {
        let settings = WindowSettings::default();
        assert_eq!(settings.width, 800);
        assert_eq!(settings.height, 600);
        assert!(settings.resizable);
        assert!(settings.title.is_empty());
    }

    #[test]
    fn builder_fills_unset_fields_from_defaults() {
        let settings = WindowSettingsBuilder::default()
            .title("Sample")
            .height(720u32)
            .finish()
            .unwrap();

        assert_eq!(settings.title, "Sample");
        assert_eq!(settings.width, 800);
        assert_eq!(settings.height, 720);
        assert!(settings.resizable);
    }

    #[test]
    fn window_system_panics_become_errors() {
        let error = catch_init(|| -> u32 { panic!("Failed to open display") }).unwrap_err();

        assert!(matches!(error, Error::InitWindowSystem { .. }));
        assert_eq!(
            error.to_string(),
            "Failed to initialize the window system: Failed to open display"
        );
    }

    #[test]
    fn formatted_panic_messages_are_kept() {
        let error = catch_init(|| -> u32 { panic!("no {} available", "display") }).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Failed to initialize the window system: no display available"
        );
    }

    #[test]
    fn successful_initializers_pass_through() {
        assert_eq!(catch_init(|| 7u32).unwrap(), 7);
    }
}
