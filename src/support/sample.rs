use crate::{
    app::{App, AppVersion, ResizeEventArgs, Result, WindowReleased},
    backend::{Backend, BackendRegistry},
    window::{Window, WindowEvent},
};
use log::{debug, info, warn};
use snafu::OptionExt;

#[cfg(feature = "directx12")]
use crate::backend::DirectX12Backend;
#[cfg(feature = "vulkan")]
use crate::backend::VulkanBackend;

pub const APP_NAME: &str = "My LiteFX App";
pub const APP_VERSION: AppVersion = AppVersion::new(1, 0, 0, 0);

/// The application shell: owns the window, registers the compiled-in
/// backends and polls window events until the window is closed.
pub struct SampleApp<W: Window> {
    window: Option<W>,
    adapter_id: Option<u32>,
    last_resize: Option<ResizeEventArgs>,
    resize_count: usize,
}

impl<W: Window + 'static> SampleApp<W> {
    pub fn new(window: W, adapter_id: Option<u32>) -> Self {
        Self {
            window: Some(window),
            adapter_id,
            last_resize: None,
            resize_count: 0,
        }
    }

    pub fn adapter_id(&self) -> Option<u32> {
        self.adapter_id
    }

    /// `None` once the window has been released by shutdown.
    pub fn window(&self) -> Option<&W> {
        self.window.as_ref()
    }

    pub fn window_mut(&mut self) -> Option<&mut W> {
        self.window.as_mut()
    }

    pub fn framebuffer_size(&self) -> Option<(u32, u32)> {
        self.window.as_ref().map(W::framebuffer_size)
    }

    /// The most recent resize the shell handled.
    pub fn last_resize(&self) -> Option<ResizeEventArgs> {
        self.last_resize
    }

    pub fn resize_count(&self) -> usize {
        self.resize_count
    }
}

#[cfg_attr(not(any(feature = "vulkan", feature = "directx12")), allow(dead_code))]
fn start_backend<W: Window + 'static, B: Backend>(app: &SampleApp<W>, backend: &mut B) -> bool {
    let (width, height) = app.framebuffer_size().unwrap_or_default();
    match app.adapter_id() {
        Some(adapter) => debug!(
            "Starting {} backend on adapter {} with a {}x{} framebuffer",
            backend.name(),
            adapter,
            width,
            height
        ),
        None => debug!(
            "Starting {} backend on the default adapter with a {}x{} framebuffer",
            backend.name(),
            width,
            height
        ),
    }

    // Adapter lookup, surface and device creation belong here.
    true
}

#[cfg(feature = "directx12")]
fn start_directx12<W: Window + 'static>(
    app: &SampleApp<W>,
    backend: &mut DirectX12Backend,
) -> bool {
    if !backend.warns_on_missing_root_signature() {
        debug!("Shader programs without a root signature will not be reported");
    }
    start_backend(app, backend)
}

#[cfg_attr(not(any(feature = "vulkan", feature = "directx12")), allow(dead_code))]
fn stop_backend<W: Window + 'static, B: Backend>(_: &SampleApp<W>, backend: &mut B) {
    // Release the device and everything created from it here.
    debug!("Stopping {} backend", backend.name());
}

impl<W: Window + 'static> App for SampleApp<W> {
    fn name(&self) -> &str {
        APP_NAME
    }

    fn version(&self) -> AppVersion {
        APP_VERSION
    }

    #[allow(unused_variables)]
    fn on_init(&mut self, backends: &mut BackendRegistry<Self>) -> Result<()> {
        #[cfg(feature = "vulkan")]
        {
            backends.on_backend_start::<VulkanBackend, _>(start_backend::<W, VulkanBackend>);
            backends.on_backend_stop::<VulkanBackend, _>(stop_backend::<W, VulkanBackend>);
        }

        #[cfg(feature = "directx12")]
        {
            backends.on_backend_start::<DirectX12Backend, _>(start_directx12::<W>);
            backends.on_backend_stop::<DirectX12Backend, _>(stop_backend::<W, DirectX12Backend>);
        }

        Ok(())
    }

    fn on_startup(&mut self) -> Result<()> {
        let mut resizes = Vec::new();
        loop {
            let window = self.window.as_mut().context(WindowReleased {})?;
            if window.should_close() {
                break;
            }

            window.poll_events(&mut |event| match event {
                WindowEvent::FramebufferResized { width, height } => {
                    resizes.push(ResizeEventArgs::new(width, height));
                }
                WindowEvent::CloseRequested => info!("Window close requested"),
            });

            for args in resizes.drain(..) {
                self.on_resize(&args);
            }

            // Per-frame rendering goes here.
        }
        Ok(())
    }

    fn on_resize(&mut self, args: &ResizeEventArgs) {
        debug!("Framebuffer resized to {}x{}", args.width, args.height);
        self.last_resize = Some(*args);
        self.resize_count += 1;
    }

    fn on_shutdown(&mut self) -> Result<()> {
        match self.window.take() {
            Some(mut window) => {
                window.destroy();
                window.terminate();
                info!("Window released");
            }
            None => warn!("Shutdown requested after the window was already released"),
        }
        Ok(())
    }
}
