//! Windowing shim
//!
//! The bootstrap needs very little from a windowing library: one window, the
//! instance extensions that window needs, raw handles for a surface, and a way
//! to poll events until the user closes it. `WinitShim` provides that on top
//! of winit's pump-events API so the caller keeps control of the loop.

use crate::backend::extensions::ptr_names_to_strings;
use crate::config::WindowConfig;
use crate::error::BootstrapError;
use raw_window_handle::{
    HasRawDisplayHandle, HasRawWindowHandle, RawDisplayHandle, RawWindowHandle,
};
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    error::OsError,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowAttributes, WindowId},
};

/// How long the platform gets to let us create a window
const WINDOW_CREATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest a single pump may block while waiting for the window
const WINDOW_CREATE_STEP: Duration = Duration::from_millis(10);

/// What the bootstrap needs from a windowing library.
///
/// Dropping a window destroys it; dropping the system shuts the library down.
/// Windows must be dropped before the system that made them.
pub trait WindowSystem {
    type Window;

    fn create_window(&mut self, config: &WindowConfig) -> Result<Self::Window, BootstrapError>;

    /// Instance extensions needed to present to `window`
    fn required_instance_extensions(
        &self,
        window: &Self::Window,
    ) -> Result<Vec<String>, BootstrapError>;

    fn surface_handles(&self, window: &Self::Window) -> (RawDisplayHandle, RawWindowHandle);

    fn poll_events(&mut self);

    fn should_close(&self, window: &Self::Window) -> bool;
}

/// winit-backed windowing system
pub struct WinitShim {
    event_loop: EventLoop<()>,
    handler: ShimHandler,
    poll_timeout: Duration,
    exited: bool,
}

/// A winit window that logs its own destruction
pub struct ShimWindow {
    window: Window,
}

#[derive(Default)]
struct ShimHandler {
    pending: Option<WindowAttributes>,
    created: Option<Result<Window, OsError>>,
    close_requested: Vec<WindowId>,
}

impl WinitShim {
    pub fn new(config: &WindowConfig) -> Result<Self, BootstrapError> {
        let event_loop =
            EventLoop::new().map_err(|e| BootstrapError::WindowingInit(e.to_string()))?;

        Ok(Self {
            event_loop,
            handler: ShimHandler::default(),
            poll_timeout: Duration::from_millis(config.poll_timeout_ms),
            exited: false,
        })
    }

    fn pump(&mut self, timeout: Duration) {
        if let PumpStatus::Exit(code) = self
            .event_loop
            .pump_app_events(Some(timeout), &mut self.handler)
        {
            log::info!("Event loop exited with code {}", code);
            self.exited = true;
        }
    }
}

impl WindowSystem for WinitShim {
    type Window = ShimWindow;

    fn create_window(&mut self, config: &WindowConfig) -> Result<ShimWindow, BootstrapError> {
        // No client API: winit never attaches a GL context to its windows
        self.handler.pending = Some(
            Window::default_attributes()
                .with_title(&config.title)
                .with_inner_size(PhysicalSize::new(config.width, config.height))
                .with_resizable(config.resizable),
        );

        // Windows can only be created from inside the event loop
        let created = pump_until(WINDOW_CREATE_TIMEOUT, WINDOW_CREATE_STEP, |step| {
            self.pump(step);
            match self.handler.created.take() {
                Some(created) => Some(created.map_err(|e| e.to_string())),
                None if self.exited => Some(Err(
                    "event loop exited before the window was created".to_string(),
                )),
                None => None,
            }
        });
        self.handler.pending = None;

        match created {
            Some(Ok(window)) => {
                log::info!(
                    "Created window '{}' ({}x{})",
                    config.title,
                    config.width,
                    config.height
                );
                Ok(ShimWindow { window })
            }
            Some(Err(reason)) => Err(BootstrapError::WindowCreation(reason)),
            None => Err(BootstrapError::WindowCreation(format!(
                "platform did not allow window creation within {:?}",
                WINDOW_CREATE_TIMEOUT
            ))),
        }
    }

    fn required_instance_extensions(
        &self,
        window: &ShimWindow,
    ) -> Result<Vec<String>, BootstrapError> {
        let names = ash_window::enumerate_required_extensions(window.window.raw_display_handle())
            .map_err(BootstrapError::RequiredExtensions)?;

        // SAFETY: ash-window hands out static extension name constants
        Ok(unsafe { ptr_names_to_strings(names) })
    }

    fn surface_handles(&self, window: &ShimWindow) -> (RawDisplayHandle, RawWindowHandle) {
        (
            window.window.raw_display_handle(),
            window.window.raw_window_handle(),
        )
    }

    fn poll_events(&mut self) {
        self.pump(self.poll_timeout);
    }

    fn should_close(&self, window: &ShimWindow) -> bool {
        self.exited || self.handler.close_requested.contains(&window.window.id())
    }
}

impl Drop for WinitShim {
    fn drop(&mut self) {
        log::info!("Shutting down windowing system...");
    }
}

impl Drop for ShimWindow {
    fn drop(&mut self) {
        log::info!("Destroying window...");
    }
}

/// Call `pump_once` with `step` until it yields a value or `limit` has passed.
/// Always pumps at least once.
fn pump_until<T>(
    limit: Duration,
    step: Duration,
    mut pump_once: impl FnMut(Duration) -> Option<T>,
) -> Option<T> {
    let start = Instant::now();
    loop {
        if let Some(done) = pump_once(step) {
            return Some(done);
        }
        if start.elapsed() >= limit {
            return None;
        }
    }
}

impl ShimHandler {
    fn create_pending(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(attributes) = self.pending.take() {
            self.created = Some(event_loop.create_window(attributes));
        }
    }
}

impl ApplicationHandler for ShimHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            log::info!("Close requested, shutting down...");
            self.close_requested.push(id);
        }
    }

    // Some platforms only resume once; later creations happen here
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }
}
