use super::Backend;
use std::any::Any;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectX12Backend {
    suppress_missing_root_signature_warning: bool,
}

impl DirectX12Backend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shader programs without an explicit root signature are reflected
    /// silently instead of logging a warning for each one.
    pub fn suppress_missing_root_signature_warning(mut self) -> Self {
        self.suppress_missing_root_signature_warning = true;
        self
    }

    pub fn warns_on_missing_root_signature(&self) -> bool {
        !self.suppress_missing_root_signature_warning
    }
}

impl Backend for DirectX12Backend {
    fn name(&self) -> &str {
        "DirectX 12"
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
    fn missing_root_signatures_warn_by_default() {
        assert!(DirectX12Backend::new().warns_on_missing_root_signature());
    }

    #[test]
    fn warning_can_be_suppressed() {
        let backend = DirectX12Backend::new().suppress_missing_root_signature_warning();
        assert!(!backend.warns_on_missing_root_signature());
        assert_eq!(backend.name(), "DirectX 12");
    }
}
