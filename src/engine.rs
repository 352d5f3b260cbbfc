// =============================================================================
// ENGINE BOOTSTRAP
// =============================================================================
//
// Brings the engine up in a fixed order and tears it down in reverse:
//
//   windowing -> window -> instance -> (surface) -> physical device
//             -> queue family -> logical device + queue -> event loop
//
// Every step either succeeds or returns a BootstrapError. Resources are owned
// values, so an early return drops exactly what was acquired so far, newest
// first, and nothing else.
//
// Known gaps: the first physical device is used without any
// scoring, and the first graphics family is used without checking whether it
// can present to the surface.

use crate::backend::{
    check_extension_support, find_graphics_queue_family, DeviceApi, DeviceDesc, GraphicsApi,
    InstanceApi, InstanceDesc, PhysicalDeviceInfo,
};
use crate::config::{Config, WindowConfig};
use crate::error::BootstrapError;
use crate::window::WindowSystem;
use ash::vk;

type InstanceOf<G> = <G as GraphicsApi>::Instance;
type SurfaceOf<G> = <InstanceOf<G> as InstanceApi>::Surface;
type DeviceOf<G> = <InstanceOf<G> as InstanceApi>::Device;
type QueueOf<G> = <DeviceOf<G> as DeviceApi>::Queue;

/// Where the engine is in its lifetime. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Uninitialized,
    WindowingReady,
    InstanceReady,
    SurfaceReady,
    DeviceSelected,
    DeviceReady,
    Running,
    ShuttingDown,
    Terminated,
}

/// The stages a run has passed through, oldest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    history: Vec<Stage>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            history: vec![Stage::Uninitialized],
        }
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Stage {
        self.history[self.history.len() - 1]
    }

    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    fn advance(&mut self, next: Stage) {
        let current = self.current();
        debug_assert!(next > current, "stage went backwards: {:?} -> {:?}", current, next);
        log::debug!("Stage: {:?} -> {:?}", current, next);
        self.history.push(next);
    }

    /// Record the jump to ShuttingDown. Call before anything is released.
    fn fail(&mut self, err: BootstrapError) -> BootstrapError {
        log::debug!("{:?} failed: {}", self.current(), err);
        self.advance(Stage::ShuttingDown);
        err
    }

    /// Fail before anything was acquired
    pub fn abort(&mut self, err: BootstrapError) -> BootstrapError {
        let err = self.fail(err);
        self.advance(Stage::Terminated);
        err
    }
}

/// Process exit code for the outcome of a run
pub fn exit_code<T>(result: &Result<T, BootstrapError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => -1,
    }
}

/// Bootstrap, poll until the window closes, then tear down.
///
/// `lifecycle` ends in `Stage::Terminated` whether or not this succeeds.
pub fn launch<W, G, F>(
    init_windowing: F,
    api: &G,
    config: &Config,
    lifecycle: &mut Lifecycle,
) -> Result<(), BootstrapError>
where
    W: WindowSystem,
    G: GraphicsApi,
    F: FnOnce(&WindowConfig) -> Result<W, BootstrapError>,
{
    let engine = Engine::bootstrap(init_windowing, api, config, lifecycle)?;
    engine.run(lifecycle);
    Ok(())
}

/// A fully bootstrapped engine.
///
/// IMPORTANT: Field order matters for Drop! Fields drop top to bottom, which
/// must be the reverse of creation order.
pub struct Engine<W: WindowSystem, G: GraphicsApi> {
    queue: QueueOf<G>,
    device: DeviceOf<G>,
    surface: Option<SurfaceOf<G>>,
    instance: InstanceOf<G>,
    window: W::Window,
    windowing: W,

    gpu: PhysicalDeviceInfo,
    queue_family_index: u32,
}

impl<W: WindowSystem, G: GraphicsApi> Engine<W, G> {
    pub fn bootstrap<F>(
        init_windowing: F,
        api: &G,
        config: &Config,
        lifecycle: &mut Lifecycle,
    ) -> Result<Self, BootstrapError>
    where
        F: FnOnce(&WindowConfig) -> Result<W, BootstrapError>,
    {
        let result = Self::acquire(lifecycle, init_windowing, api, config);

        // `acquire` recorded ShuttingDown, then released what it held on return
        if result.is_err() {
            lifecycle.advance(Stage::Terminated);
        }
        result
    }

    fn acquire<F>(
        lifecycle: &mut Lifecycle,
        init_windowing: F,
        api: &G,
        config: &Config,
    ) -> Result<Self, BootstrapError>
    where
        F: FnOnce(&WindowConfig) -> Result<W, BootstrapError>,
    {
        // Locals drop in reverse declaration order on early return; every
        // error goes through `fail` first so ShuttingDown precedes the release
        let mut windowing = init_windowing(&config.window).map_err(|e| lifecycle.fail(e))?;
        let window = windowing
            .create_window(&config.window)
            .map_err(|e| lifecycle.fail(e))?;
        lifecycle.advance(Stage::WindowingReady);

        let instance =
            create_instance(api, &windowing, &window, config).map_err(|e| lifecycle.fail(e))?;
        lifecycle.advance(Stage::InstanceReady);

        let surface = if config.debug.create_surface {
            let (display, raw_window) = windowing.surface_handles(&window);
            let surface = instance
                .create_surface(display, raw_window)
                .map_err(|e| lifecycle.fail(BootstrapError::SurfaceCreation(e)))?;
            log::info!("Window surface created");
            lifecycle.advance(Stage::SurfaceReady);
            Some(surface)
        } else {
            None
        };

        let (physical_device, gpu) =
            pick_physical_device(&instance).map_err(|e| lifecycle.fail(e))?;
        lifecycle.advance(Stage::DeviceSelected);

        let queue_family_index =
            match find_graphics_queue_family(&instance.queue_family_flags(physical_device)) {
                Some(index) => index,
                None => {
                    return Err(lifecycle.fail(BootstrapError::NoGraphicsQueueFamily {
                        device: gpu.name.clone(),
                    }))
                }
            };
        log::info!("Using queue family {} for graphics", queue_family_index);

        let (device, queue) = create_logical_device(&instance, physical_device, queue_family_index)
            .map_err(|e| lifecycle.fail(e))?;
        lifecycle.advance(Stage::DeviceReady);

        Ok(Self {
            queue,
            device,
            surface,
            instance,
            window,
            windowing,
            gpu,
            queue_family_index,
        })
    }

    /// Poll window events until a close is requested, then tear down
    pub fn run(mut self, lifecycle: &mut Lifecycle) {
        lifecycle.advance(Stage::Running);
        log::info!(
            "Running on {} (queue family {})",
            self.gpu.name,
            self.queue_family_index
        );
        log::debug!("Graphics queue: {:?}", self.queue);

        while !self.windowing.should_close(&self.window) {
            self.windowing.poll_events();
        }

        self.shutdown(lifecycle);
    }

    fn shutdown(self, lifecycle: &mut Lifecycle) {
        lifecycle.advance(Stage::ShuttingDown);

        let Self {
            device,
            surface,
            instance,
            window,
            windowing,
            ..
        } = self;

        drop(device);
        drop(surface);
        drop(instance);
        drop(window);
        drop(windowing);

        lifecycle.advance(Stage::Terminated);
    }
}

fn create_instance<W, G>(
    api: &G,
    windowing: &W,
    window: &W::Window,
    config: &Config,
) -> Result<G::Instance, BootstrapError>
where
    W: WindowSystem,
    G: GraphicsApi,
{
    let required = windowing.required_instance_extensions(window)?;

    log::info!("--- Required instance extensions ({}) ---", required.len());
    for name in &required {
        log::info!("  {}", name);
    }

    if config.debug.verify_extensions {
        let available = api
            .available_instance_extensions()
            .map_err(BootstrapError::ExtensionEnumeration)?;

        log::info!("--- Available instance extensions ({}) ---", available.len());
        for name in &available {
            log::debug!("  {}", name);
        }

        check_extension_support(&required, &available)?;
    }

    let desc = InstanceDesc {
        application_name: config.application.name.clone(),
        application_version: config.application_version(),
        engine_name: config.application.engine_name.clone(),
        engine_version: config.engine_version(),
        api_version: config.api_version(),
        enabled_extensions: required,
        enabled_layers: Vec::new(),
    };

    let instance = api
        .create_instance(&desc)
        .map_err(BootstrapError::InstanceCreation)?;

    log::info!("Vulkan instance successfully created!");
    Ok(instance)
}

/// First device in enumeration order, no scoring
fn pick_physical_device<I: InstanceApi>(
    instance: &I,
) -> Result<(I::PhysicalDevice, PhysicalDeviceInfo), BootstrapError> {
    let devices = instance
        .enumerate_physical_devices()
        .map_err(BootstrapError::DeviceEnumeration)?;
    log::info!("Found {} physical device(s)", devices.len());

    let physical_device = *devices.first().ok_or(BootstrapError::NoPhysicalDevice)?;
    let info = instance.physical_device_info(physical_device);

    log::info!("Selected GPU: {}", info.name);
    log::info!(
        "API Version: {}.{}.{} ({:?})",
        vk::api_version_major(info.api_version),
        vk::api_version_minor(info.api_version),
        vk::api_version_patch(info.api_version),
        info.device_type
    );

    Ok((physical_device, info))
}

fn create_logical_device<I: InstanceApi>(
    instance: &I,
    physical_device: I::PhysicalDevice,
    queue_family_index: u32,
) -> Result<(I::Device, <I::Device as DeviceApi>::Queue), BootstrapError> {
    let desc = DeviceDesc::single_queue(queue_family_index);

    let device = instance
        .create_device(physical_device, &desc)
        .map_err(BootstrapError::DeviceCreation)?;
    let queue = device.queue(queue_family_index, 0);

    log::info!("Logical device created");
    Ok((device, queue))
}
