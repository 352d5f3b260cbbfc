// Instance extension helpers

use crate::error::BootstrapError;
use ash::vk;
use std::ffi::{c_char, CStr};

/// Check that every required extension is offered by the driver.
///
/// Names are compared exactly. The first missing name is reported.
pub fn check_extension_support(
    required: &[String],
    available: &[String],
) -> Result<(), BootstrapError> {
    match required.iter().find(|name| !available.contains(*name)) {
        Some(missing) => Err(BootstrapError::MissingExtension(missing.clone())),
        None => Ok(()),
    }
}

/// Names out of `vk::ExtensionProperties` as owned strings
pub fn extension_names(properties: &[vk::ExtensionProperties]) -> Vec<String> {
    properties
        .iter()
        .map(|props| fixed_cstr_to_string(&props.extension_name))
        .collect()
}

/// Read a NUL-terminated name out of one of Vulkan's fixed-size char arrays
pub fn fixed_cstr_to_string(chars: &[c_char]) -> String {
    // SAFETY: the driver always NUL-terminates within the array
    unsafe { CStr::from_ptr(chars.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

/// Convert the pointer list handed out by ash-window
///
/// # Safety
/// Every pointer must reference a valid NUL-terminated string.
pub unsafe fn ptr_names_to_strings(names: &[*const c_char]) -> Vec<String> {
    names
        .iter()
        .map(|&ptr| CStr::from_ptr(ptr).to_string_lossy().into_owned())
        .collect()
}
