//! Typed UBX message catalog.
//!
//! Each module defines the request and response frames of one message
//! family. Poll requests share their identity with the response, so only
//! response types are registered for decoding; see [`register_all`].
//!
//! ```
//! use ubxlib_messages::{mon_ver::MonVerPoll, register_all};
//! use ubxlib_registry::FrameRegistry;
//! use ubxlib_frame::UbxFrame;
//!
//! let mut registry = FrameRegistry::new();
//! register_all(&mut registry).unwrap();
//! assert!(registry.contains(MonVerPoll::default().cid()));
//! ```

mod macros;

pub mod ack;
pub mod cfg_gnss;
pub mod cfg_prt;
pub mod cfg_rate;
pub mod cfg_rst;
pub mod cfg_valget;
pub mod cfg_valset;
pub mod esf_status;
pub mod mga;
pub mod mon_ver;

use tracing::debug;
use ubxlib_registry::FrameRegistry;

pub use ack::{AckAck, AckNak};
pub use cfg_gnss::{CfgGnss, CfgGnssPoll, GnssSystem};
pub use cfg_prt::{CfgPrt, CfgPrtPoll};
pub use cfg_rate::{CfgRate, CfgRatePoll};
pub use cfg_rst::CfgRst;
pub use cfg_valget::{CfgValGet, CfgValGetPoll, Layer};
pub use cfg_valset::CfgValSet;
pub use esf_status::{EsfStatus, EsfStatusPoll, SensorStatus};
pub use mga::{MgaAckData0, MgaIniTimeUtc, UtcTime};
pub use mon_ver::{MonVer, MonVerPoll};

/// Register every response type in this catalog.
pub fn register_all(registry: &mut FrameRegistry) -> ubxlib_registry::Result<()> {
    registry.register::<AckAck>()?;
    registry.register::<AckNak>()?;
    registry.register::<MgaAckData0>()?;
    registry.register::<CfgValGet>()?;
    registry.register::<CfgPrt>()?;
    registry.register::<CfgGnss>()?;
    registry.register::<CfgRate>()?;
    registry.register::<MonVer>()?;
    registry.register::<EsfStatus>()?;
    debug!(count = registry.len(), "registered message catalog");
    Ok(())
}
