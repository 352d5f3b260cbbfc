// Vulkan backend - ash implementation of the backend traits
//
// Responsibilities:
// - Loading the Vulkan library
// - Instance creation (no layers, windowing extensions only)
// - Physical device and queue family queries
// - Surface creation from raw window handles
// - Logical device + queue creation
//
// Each owned handle destroys itself in Drop. Nothing here enforces the
// device-before-instance order; the owner declares fields accordingly.

use super::extensions::{extension_names, fixed_cstr_to_string};
use super::{DeviceApi, DeviceDesc, GraphicsApi, InstanceApi, InstanceDesc, PhysicalDeviceInfo};
use crate::error::BootstrapError;
use ash::{extensions::khr, vk, Entry};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::CString;

/// Return the first queue family that supports graphics work.
///
/// Presentation support is not considered.
pub fn find_graphics_queue_family(families: &[vk::QueueFlags]) -> Option<u32> {
    families
        .iter()
        .position(|flags| flags.contains(vk::QueueFlags::GRAPHICS))
        .map(|i| i as u32)
}

/// Loaded Vulkan library
pub struct VulkanApi {
    entry: Entry,
}

impl VulkanApi {
    pub fn load() -> Result<Self, BootstrapError> {
        let entry = unsafe { Entry::load() }.map_err(|e| BootstrapError::Loader(e.to_string()))?;
        Ok(Self { entry })
    }
}

impl GraphicsApi for VulkanApi {
    type Instance = VulkanInstance;

    fn available_instance_extensions(&self) -> Result<Vec<String>, vk::Result> {
        #[allow(unused_unsafe)]
        let properties = unsafe { self.entry.enumerate_instance_extension_properties(None) }?;
        Ok(extension_names(&properties))
    }

    fn create_instance(&self, desc: &InstanceDesc) -> Result<VulkanInstance, vk::Result> {
        let app_name = to_cstring(&desc.application_name)?;
        let engine_name = to_cstring(&desc.engine_name)?;

        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(desc.application_version)
            .engine_name(&engine_name)
            .engine_version(desc.engine_version)
            .api_version(desc.api_version);

        let extensions = desc
            .enabled_extensions
            .iter()
            .map(|name| to_cstring(name))
            .collect::<Result<Vec<_>, _>>()?;
        let extension_ptrs: Vec<_> = extensions.iter().map(|name| name.as_ptr()).collect();

        let layers = desc
            .enabled_layers
            .iter()
            .map(|name| to_cstring(name))
            .collect::<Result<Vec<_>, _>>()?;
        let layer_ptrs: Vec<_> = layers.iter().map(|name| name.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs);

        let instance = unsafe { self.entry.create_instance(&create_info, None) }?;
        let surface_loader = khr::Surface::new(&self.entry, &instance);

        Ok(VulkanInstance {
            entry: self.entry.clone(),
            instance,
            surface_loader,
        })
    }
}

/// Vulkan instance with automatic cleanup
pub struct VulkanInstance {
    entry: Entry,
    instance: ash::Instance,
    surface_loader: khr::Surface,
}

impl InstanceApi for VulkanInstance {
    type PhysicalDevice = vk::PhysicalDevice;
    type Surface = VulkanSurface;
    type Device = VulkanDevice;

    fn enumerate_physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>, vk::Result> {
        unsafe { self.instance.enumerate_physical_devices() }
    }

    fn physical_device_info(&self, physical_device: vk::PhysicalDevice) -> PhysicalDeviceInfo {
        let props = unsafe { self.instance.get_physical_device_properties(physical_device) };
        PhysicalDeviceInfo {
            name: fixed_cstr_to_string(&props.device_name),
            device_type: props.device_type,
            api_version: props.api_version,
        }
    }

    fn queue_family_flags(&self, physical_device: vk::PhysicalDevice) -> Vec<vk::QueueFlags> {
        let families = unsafe {
            self.instance
                .get_physical_device_queue_family_properties(physical_device)
        };
        families.iter().map(|family| family.queue_flags).collect()
    }

    fn create_surface(
        &self,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> Result<VulkanSurface, vk::Result> {
        let surface = unsafe {
            ash_window::create_surface(&self.entry, &self.instance, display, window, None)
        }?;

        Ok(VulkanSurface {
            loader: self.surface_loader.clone(),
            surface,
        })
    }

    fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        desc: &DeviceDesc,
    ) -> Result<VulkanDevice, vk::Result> {
        let queue_create_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(desc.queue_family_index)
            .queue_priorities(&desc.queue_priorities)
            .build();

        let extensions = desc
            .enabled_extensions
            .iter()
            .map(|name| to_cstring(name))
            .collect::<Result<Vec<_>, _>>()?;
        let extension_ptrs: Vec<_> = extensions.iter().map(|name| name.as_ptr()).collect();

        // Zeroed: nothing beyond core behaviour is requested
        let features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(std::slice::from_ref(&queue_create_info))
            .enabled_extension_names(&extension_ptrs)
            .enabled_features(&features);

        let device = unsafe {
            self.instance
                .create_device(physical_device, &create_info, None)
        }?;

        Ok(VulkanDevice { device })
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        log::info!("Destroying Vulkan instance...");
        unsafe { self.instance.destroy_instance(None) };
    }
}

/// Window surface; must be dropped before its instance
pub struct VulkanSurface {
    loader: khr::Surface,
    surface: vk::SurfaceKHR,
}

impl Drop for VulkanSurface {
    fn drop(&mut self) {
        log::info!("Destroying window surface...");
        unsafe { self.loader.destroy_surface(self.surface, None) };
    }
}

/// Logical device; must be dropped before its instance
pub struct VulkanDevice {
    device: ash::Device,
}

impl DeviceApi for VulkanDevice {
    type Queue = vk::Queue;

    fn queue(&self, queue_family_index: u32, queue_index: u32) -> vk::Queue {
        unsafe { self.device.get_device_queue(queue_family_index, queue_index) }
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        log::info!("Destroying Vulkan device...");
        let _ = unsafe { self.device.device_wait_idle() };
        unsafe { self.device.destroy_device(None) };
    }
}

/// Names with interior NULs can never match a driver string
fn to_cstring(name: &str) -> Result<CString, vk::Result> {
    CString::new(name).map_err(|_| vk::Result::ERROR_INITIALIZATION_FAILED)
}
