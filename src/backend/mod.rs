// Backend module - Vulkan abstraction layer
//
// Design: the bootstrap talks to the GPU through three small traits so the
// sequencing and teardown can be exercised without a driver. `device` holds
// the ash implementation; `fake` holds recording doubles for tests.
//
// Every owned handle (instance, surface, device) releases itself in Drop.

pub mod device;
pub mod extensions;

#[cfg(test)]
pub mod fake;

pub use device::{find_graphics_queue_family, VulkanApi};
pub use extensions::check_extension_support;

use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

/// Everything needed to create an instance
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDesc {
    pub application_name: String,
    pub application_version: u32,
    pub engine_name: String,
    pub engine_version: u32,
    pub api_version: u32,
    pub enabled_extensions: Vec<String>,
    pub enabled_layers: Vec<String>,
}

/// Everything needed to create a logical device.
///
/// Device features are always zero-initialized.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDesc {
    pub queue_family_index: u32,
    pub queue_priorities: Vec<f32>,
    pub enabled_extensions: Vec<String>,
}

impl DeviceDesc {
    /// One queue of `queue_family_index` at priority 1.0, nothing else enabled
    pub fn single_queue(queue_family_index: u32) -> Self {
        Self {
            queue_family_index,
            queue_priorities: vec![1.0],
            enabled_extensions: Vec::new(),
        }
    }
}

/// Entry point of a graphics API: what exists before an instance does
pub trait GraphicsApi {
    type Instance: InstanceApi;

    fn available_instance_extensions(&self) -> Result<Vec<String>, vk::Result>;

    fn create_instance(&self, desc: &InstanceDesc) -> Result<Self::Instance, vk::Result>;
}

/// An owned instance. Dropping it destroys the instance, so anything created
/// from it must be dropped first.
pub trait InstanceApi {
    type PhysicalDevice: Copy + std::fmt::Debug;
    type Surface;
    type Device: DeviceApi;

    fn enumerate_physical_devices(&self) -> Result<Vec<Self::PhysicalDevice>, vk::Result>;

    fn physical_device_info(&self, physical_device: Self::PhysicalDevice) -> PhysicalDeviceInfo;

    fn queue_family_flags(&self, physical_device: Self::PhysicalDevice) -> Vec<vk::QueueFlags>;

    fn create_surface(
        &self,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> Result<Self::Surface, vk::Result>;

    fn create_device(
        &self,
        physical_device: Self::PhysicalDevice,
        desc: &DeviceDesc,
    ) -> Result<Self::Device, vk::Result>;
}

/// An owned logical device
pub trait DeviceApi {
    type Queue: Copy + std::fmt::Debug;

    fn queue(&self, queue_family_index: u32, queue_index: u32) -> Self::Queue;
}

/// Properties of a physical device worth logging
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalDeviceInfo {
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub api_version: u32,
}
