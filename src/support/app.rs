use crate::{
    backend::{Backend, BackendRegistry},
    logger::{self, Sink},
};
use log::{debug, info, warn};
use snafu::{ensure, Backtrace, IntoError, NoneError, ResultExt, Snafu};
use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to install log sinks: {}", source))]
    InstallLogSinks { source: logger::Error },

    #[snafu(display("Cannot run an app that is already {}", state))]
    InvalidState {
        state: LifecycleState,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to start the {} backend", name))]
    StartBackend { name: String, backtrace: Backtrace },

    #[snafu(display("The window has already been released"))]
    WindowReleased { backtrace: Backtrace },

    #[snafu(display("{}", message))]
    Application { message: String, backtrace: Backtrace },
}

impl Error {
    /// An error raised by application code from inside a lifecycle method.
    pub fn application(message: impl Into<String>) -> Self {
        Application {
            message: message.into(),
        }
        .into_error(NoneError)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub revision: u32,
}

impl AppVersion {
    pub const fn new(major: u32, minor: u32, patch: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            revision,
        }
    }
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.patch, self.revision
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeEventArgs {
    pub width: u32,
    pub height: u32,
}

impl ResizeEventArgs {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Running,
    ShutDown,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Running => "running",
            LifecycleState::ShutDown => "shut down",
        };
        f.write_str(name)
    }
}

/// An application driven by [`AppHost`].
///
/// The host calls `on_init`, then starts the backends, then `on_startup`,
/// then stops the backends, then `on_shutdown`. `on_resize` is invoked by the
/// application itself while its loop is running.
pub trait App: Sized + 'static {
    fn name(&self) -> &str;
    fn version(&self) -> AppVersion;

    fn on_init(&mut self, _: &mut BackendRegistry<Self>) -> Result<()> {
        Ok(())
    }

    fn on_startup(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_resize(&mut self, _: &ResizeEventArgs) {}

    fn on_shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

pub struct AppBuilder<A: App> {
    app: A,
    sinks: Vec<Sink>,
    backends: Vec<Box<dyn Backend>>,
}

impl<A: App> AppBuilder<A> {
    pub fn log_to(mut self, sink: Sink) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn use_backend<B: Backend>(mut self, backend: B) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    /// Installs the configured log sinks, if any, and hands the app to a host.
    pub fn build(self) -> Result<AppHost<A>> {
        if !self.sinks.is_empty() {
            logger::install(&self.sinks).context(InstallLogSinks {})?;
        }

        Ok(AppHost {
            app: self.app,
            backends: self.backends,
            registry: BackendRegistry::new(),
            state: LifecycleState::Uninitialized,
        })
    }
}

pub struct AppHost<A: App> {
    app: A,
    backends: Vec<Box<dyn Backend>>,
    registry: BackendRegistry<A>,
    state: LifecycleState,
}

impl<A: App> AppHost<A> {
    pub fn build(app: A) -> AppBuilder<A> {
        AppBuilder {
            app,
            sinks: Vec::new(),
            backends: Vec::new(),
        }
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn backends(&self) -> impl Iterator<Item = &dyn Backend> {
        self.backends.iter().map(|backend| backend.as_ref())
    }

    /// Drives the app through its whole lifecycle. Any error ends the run on
    /// the spot, without invoking later lifecycle methods.
    pub fn run(&mut self) -> Result<()> {
        ensure!(
            self.state == LifecycleState::Uninitialized,
            InvalidState { state: self.state }
        );

        info!(
            "Starting {} (version {})",
            self.app.name(),
            self.app.version()
        );

        self.app.on_init(&mut self.registry)?;
        self.state = LifecycleState::Initialized;

        let started = self.start_backends()?;

        self.state = LifecycleState::Running;
        self.app.on_startup()?;

        self.stop_backends(&started);
        self.app.on_shutdown()?;
        self.state = LifecycleState::ShutDown;

        info!("{} shut down", self.app.name());
        Ok(())
    }

    fn start_backends(&mut self) -> Result<Vec<usize>> {
        let mut started = Vec::with_capacity(self.backends.len());
        for (index, backend) in self.backends.iter_mut().enumerate() {
            match self.registry.start(&self.app, backend.as_mut()) {
                Some(true) => {
                    info!("Started {} backend", backend.name());
                    started.push(index);
                }
                Some(false) => {
                    return StartBackend {
                        name: backend.name(),
                    }
                    .fail();
                }
                None => warn!(
                    "No start callback registered for the {} backend, skipping it",
                    backend.name()
                ),
            }
        }
        Ok(started)
    }

    fn stop_backends(&mut self, started: &[usize]) {
        for &index in started.iter().rev() {
            let backend = self.backends[index].as_mut();
            if self.registry.stop(&self.app, backend) {
                debug!("Stopped {} backend", backend.name());
            } else {
                debug!("{} backend has no stop callback", backend.name());
            }
        }
    }
}
