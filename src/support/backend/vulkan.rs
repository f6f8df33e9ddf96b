use super::Backend;
use ash::extensions::khr::Surface;
use std::{any::Any, ffi::CStr};

#[cfg(target_os = "windows")]
use ash::extensions::khr::Win32Surface;

#[cfg(target_os = "macos")]
use ash::extensions::mvk::MacOSSurface;

#[cfg(all(unix, not(target_os = "android"), not(target_os = "macos")))]
use ash::extensions::khr::{WaylandSurface, XlibSurface};

pub const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

#[cfg(target_os = "windows")]
fn platform_surface_extensions() -> Vec<&'static CStr> {
    vec![Win32Surface::name()]
}

#[cfg(target_os = "macos")]
fn platform_surface_extensions() -> Vec<&'static CStr> {
    vec![MacOSSurface::name()]
}

#[cfg(all(unix, not(target_os = "android"), not(target_os = "macos")))]
fn platform_surface_extensions() -> Vec<&'static CStr> {
    vec![XlibSurface::name(), WaylandSurface::name()]
}

#[cfg(any(target_os = "android", not(any(target_os = "windows", unix))))]
fn platform_surface_extensions() -> Vec<&'static CStr> {
    Vec::new()
}

/// Instance extensions a window surface on this platform needs.
pub fn surface_extension_names() -> Vec<String> {
    std::iter::once(Surface::name())
        .chain(platform_surface_extensions())
        .map(|name| name.to_string_lossy().into_owned())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VulkanBackend {
    required_extensions: Vec<String>,
    validation_layers: Vec<String>,
}

impl VulkanBackend {
    pub fn new(required_extensions: Vec<String>) -> Self {
        let validation_layers = if cfg!(feature = "validation") {
            vec![VALIDATION_LAYER.to_string()]
        } else {
            Vec::new()
        };

        Self {
            required_extensions,
            validation_layers,
        }
    }

    pub fn required_extensions(&self) -> &[String] {
        &self.required_extensions
    }

    pub fn validation_layers(&self) -> &[String] {
        &self.validation_layers
    }
}

impl Backend for VulkanBackend {
    fn name(&self) -> &str {
        "Vulkan"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_extensions_start_with_the_generic_surface() {
        let names = surface_extension_names();
        assert_eq!(names.first().map(String::as_str), Some("VK_KHR_surface"));
    }

    #[test]
    fn validation_layers_follow_the_feature() {
        let backend = VulkanBackend::new(surface_extension_names());
        assert_eq!(
            backend.validation_layers().is_empty(),
            !cfg!(feature = "validation")
        );
        assert!(!backend.required_extensions().is_empty());
    }
}
