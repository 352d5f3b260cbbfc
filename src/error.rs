// Bootstrap errors
//
// Every failure is fatal: the caller unwinds with `?`, owned handles release
// themselves on the way out, and main turns the error into exit code -1.

use ash::vk;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The windowing library could not be initialized
    #[error("Failed to initialize windowing system: {0}")]
    WindowingInit(String),

    /// The window could not be created
    #[error("Failed to create window: {0}")]
    WindowCreation(String),

    /// A platform extension the window needs is not offered by the driver
    #[error("Required extension not supported: {0}")]
    MissingExtension(String),

    #[error("Failed to create Vulkan instance! ({0})")]
    InstanceCreation(vk::Result),

    #[error("Failed to find GPUs with Vulkan support!")]
    NoPhysicalDevice,

    #[error("Failed to find a graphics queue family on {device}!")]
    NoGraphicsQueueFamily { device: String },

    #[error("Failed to create logical device! ({0})")]
    DeviceCreation(vk::Result),

    #[error("Failed to load Vulkan library: {0}. Is Vulkan installed?")]
    Loader(String),

    /// The windowing system could not say which instance extensions it needs
    #[error("Failed to query required instance extensions ({0})")]
    RequiredExtensions(vk::Result),

    #[error("Failed to enumerate instance extensions ({0})")]
    ExtensionEnumeration(vk::Result),

    #[error("Failed to enumerate physical devices ({0})")]
    DeviceEnumeration(vk::Result),

    #[error("Failed to create window surface ({0})")]
    SurfaceCreation(vk::Result),
}
