// Test doubles for the windowing shim and the graphics API
//
// Every call, including each Drop, is appended to a shared log so tests can
// assert on ordering and on what was never called.

use super::{DeviceApi, DeviceDesc, GraphicsApi, InstanceApi, InstanceDesc, PhysicalDeviceInfo};
use crate::config::WindowConfig;
use crate::error::BootstrapError;
use crate::window::WindowSystem;
use ash::vk;
use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, XlibDisplayHandle, XlibWindowHandle,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateWindow,
    RequiredExtensions,
    PollEvents,
    DestroyWindow,
    TerminateWindowing,
    EnumerateExtensions,
    CreateInstance(InstanceDesc),
    DestroyInstance,
    CreateSurface,
    DestroySurface,
    EnumeratePhysicalDevices,
    PhysicalDeviceInfo(usize),
    QueueFamilies(usize),
    CreateDevice(usize, DeviceDesc),
    GetQueue(u32, u32),
    DestroyDevice,
}

#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn contains(&self, call: &Call) -> bool {
        self.0.borrow().contains(call)
    }

    pub fn count(&self, call: &Call) -> usize {
        self.0.borrow().iter().filter(|c| *c == call).count()
    }

    /// Only the creation/destruction calls, in order
    pub fn lifecycle(&self) -> Vec<Call> {
        self.0
            .borrow()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::CreateWindow
                        | Call::DestroyWindow
                        | Call::TerminateWindowing
                        | Call::CreateInstance(_)
                        | Call::DestroyInstance
                        | Call::CreateSurface
                        | Call::DestroySurface
                        | Call::CreateDevice(..)
                        | Call::DestroyDevice
                )
            })
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Windowing
// ---------------------------------------------------------------------------

pub struct FakeWindowing {
    pub log: CallLog,
    pub fail_window: bool,
    pub fail_required_extensions: bool,
    pub required_extensions: Vec<String>,
    /// Close is requested after this many polls
    pub polls_until_close: usize,
    polls: usize,
}

pub struct FakeWindow {
    log: CallLog,
}

impl FakeWindowing {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            fail_window: false,
            fail_required_extensions: false,
            required_extensions: vec![
                "VK_KHR_surface".to_string(),
                "VK_KHR_xcb_surface".to_string(),
            ],
            polls_until_close: 3,
            polls: 0,
        }
    }
}

impl WindowSystem for FakeWindowing {
    type Window = FakeWindow;

    fn create_window(&mut self, config: &WindowConfig) -> Result<FakeWindow, BootstrapError> {
        if self.fail_window {
            return Err(BootstrapError::WindowCreation(format!(
                "no display for '{}'",
                config.title
            )));
        }
        self.log.push(Call::CreateWindow);
        Ok(FakeWindow {
            log: self.log.clone(),
        })
    }

    fn required_instance_extensions(
        &self,
        _window: &FakeWindow,
    ) -> Result<Vec<String>, BootstrapError> {
        self.log.push(Call::RequiredExtensions);
        if self.fail_required_extensions {
            return Err(BootstrapError::RequiredExtensions(
                vk::Result::ERROR_EXTENSION_NOT_PRESENT,
            ));
        }
        Ok(self.required_extensions.clone())
    }

    fn surface_handles(&self, _window: &FakeWindow) -> (RawDisplayHandle, RawWindowHandle) {
        (
            RawDisplayHandle::Xlib(XlibDisplayHandle::empty()),
            RawWindowHandle::Xlib(XlibWindowHandle::empty()),
        )
    }

    fn poll_events(&mut self) {
        self.log.push(Call::PollEvents);
        self.polls += 1;
    }

    fn should_close(&self, _window: &FakeWindow) -> bool {
        self.polls >= self.polls_until_close
    }
}

impl Drop for FakeWindowing {
    fn drop(&mut self) {
        self.log.push(Call::TerminateWindowing);
    }
}

impl Drop for FakeWindow {
    fn drop(&mut self) {
        self.log.push(Call::DestroyWindow);
    }
}

// ---------------------------------------------------------------------------
// Graphics API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FakeGpu {
    pub name: String,
    pub queue_families: Vec<vk::QueueFlags>,
}

impl FakeGpu {
    pub fn new(name: &str, queue_families: &[vk::QueueFlags]) -> Self {
        Self {
            name: name.to_string(),
            queue_families: queue_families.to_vec(),
        }
    }
}

pub struct FakeApi {
    pub log: CallLog,
    pub available_extensions: Vec<String>,
    pub instance_error: Option<vk::Result>,
    pub surface_error: Option<vk::Result>,
    pub device_error: Option<vk::Result>,
    pub gpus: Vec<FakeGpu>,
}

impl FakeApi {
    /// One GPU with a single graphics-capable family; every windowing extension available
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            available_extensions: vec![
                "VK_KHR_surface".to_string(),
                "VK_KHR_xcb_surface".to_string(),
                "VK_EXT_debug_utils".to_string(),
            ],
            instance_error: None,
            surface_error: None,
            device_error: None,
            gpus: vec![FakeGpu::new("Fake GPU", &[vk::QueueFlags::GRAPHICS])],
        }
    }
}

impl GraphicsApi for FakeApi {
    type Instance = FakeInstance;

    fn available_instance_extensions(&self) -> Result<Vec<String>, vk::Result> {
        self.log.push(Call::EnumerateExtensions);
        Ok(self.available_extensions.clone())
    }

    fn create_instance(&self, desc: &InstanceDesc) -> Result<FakeInstance, vk::Result> {
        if let Some(err) = self.instance_error {
            return Err(err);
        }
        self.log.push(Call::CreateInstance(desc.clone()));
        Ok(FakeInstance {
            log: self.log.clone(),
            gpus: self.gpus.clone(),
            surface_error: self.surface_error,
            device_error: self.device_error,
        })
    }
}

pub struct FakeInstance {
    log: CallLog,
    gpus: Vec<FakeGpu>,
    surface_error: Option<vk::Result>,
    device_error: Option<vk::Result>,
}

impl InstanceApi for FakeInstance {
    type PhysicalDevice = usize;
    type Surface = FakeSurface;
    type Device = FakeDevice;

    fn enumerate_physical_devices(&self) -> Result<Vec<usize>, vk::Result> {
        self.log.push(Call::EnumeratePhysicalDevices);
        Ok((0..self.gpus.len()).collect())
    }

    fn physical_device_info(&self, physical_device: usize) -> PhysicalDeviceInfo {
        self.log.push(Call::PhysicalDeviceInfo(physical_device));
        PhysicalDeviceInfo {
            name: self.gpus[physical_device].name.clone(),
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            api_version: vk::API_VERSION_1_3,
        }
    }

    fn queue_family_flags(&self, physical_device: usize) -> Vec<vk::QueueFlags> {
        self.log.push(Call::QueueFamilies(physical_device));
        self.gpus[physical_device].queue_families.clone()
    }

    fn create_surface(
        &self,
        _display: RawDisplayHandle,
        _window: RawWindowHandle,
    ) -> Result<FakeSurface, vk::Result> {
        if let Some(err) = self.surface_error {
            return Err(err);
        }
        self.log.push(Call::CreateSurface);
        Ok(FakeSurface {
            log: self.log.clone(),
        })
    }

    fn create_device(
        &self,
        physical_device: usize,
        desc: &DeviceDesc,
    ) -> Result<FakeDevice, vk::Result> {
        if let Some(err) = self.device_error {
            return Err(err);
        }
        self.log.push(Call::CreateDevice(physical_device, desc.clone()));
        Ok(FakeDevice {
            log: self.log.clone(),
        })
    }
}

impl Drop for FakeInstance {
    fn drop(&mut self) {
        self.log.push(Call::DestroyInstance);
    }
}

pub struct FakeSurface {
    log: CallLog,
}

impl Drop for FakeSurface {
    fn drop(&mut self) {
        self.log.push(Call::DestroySurface);
    }
}

pub struct FakeDevice {
    log: CallLog,
}

impl DeviceApi for FakeDevice {
    type Queue = (u32, u32);

    fn queue(&self, queue_family_index: u32, queue_index: u32) -> (u32, u32) {
        self.log.push(Call::GetQueue(queue_family_index, queue_index));
        (queue_family_index, queue_index)
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.log.push(Call::DestroyDevice);
    }
}
