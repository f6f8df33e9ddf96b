pub use self::registry::BackendRegistry;

#[cfg(feature = "directx12")]
pub use self::directx12::DirectX12Backend;
#[cfg(feature = "vulkan")]
pub use self::vulkan::{surface_extension_names, VulkanBackend};

#[cfg(feature = "directx12")]
pub mod directx12;
pub mod registry;
#[cfg(feature = "vulkan")]
pub mod vulkan;

use std::any::{Any, TypeId};

/// A graphics API implementation the host can start and stop.
///
/// Callbacks are keyed by the concrete backend type, so implementors only need
/// to expose themselves as `Any` for the registry to hand them back typed.
pub trait Backend: Any {
    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub fn backend_type_id(backend: &dyn Backend) -> TypeId {
    backend.as_any().type_id()
}
