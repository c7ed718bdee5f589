//! Identity-keyed constructor table for typed UBX frames.
//!
//! Declare which response types a session expects to decode, then let the
//! transaction engine turn received payloads into typed frames. Identities
//! without a registration surface as [`RegistryError::NotRegistered`], kept
//! apart from payloads that fail to decode.

pub mod config;
pub mod error;
pub mod registry;

pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use registry::FrameRegistry;
