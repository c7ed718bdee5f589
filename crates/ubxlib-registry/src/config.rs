/// Controls registry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// When true, registering an identity twice returns
    /// `RegistryError::AlreadyRegistered`; otherwise the second
    /// registration is logged and ignored.
    pub fail_on_duplicate: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            fail_on_duplicate: false,
        }
    }
}
