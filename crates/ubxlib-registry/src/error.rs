use ubxlib_frame::{Cid, FrameError};

/// Errors that can occur while building frames from the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No frame type registered for the identity.
    #[error("frame {0} not registered")]
    NotRegistered(Cid),

    /// A frame type is registered but the payload does not decode.
    #[error("failed to decode {cid}: {source}")]
    Decode {
        cid: Cid,
        #[source]
        source: FrameError,
    },

    /// A different frame type already claims the identity.
    #[error("frame {0} already registered")]
    AlreadyRegistered(Cid),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
