//! Client-side UBX protocol stack for u-blox GNSS receivers.
//!
//! ubxlib talks to a receiver over a serial line or a gpsd control socket,
//! frames and parses UBX traffic, and runs request/response transactions
//! with bounded retries.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte transports (serial line behind `serial`, gpsd socket)
//! - [`frame`]: checksum, field codec, frame envelope, UBX and NMEA parsers
//! - [`registry`]: identity-keyed constructors for typed frames
//! - [`messages`]: the UBX message catalogue
//! - [`engine`]: poll, set, set_mga and fire-and-forget transactions
//! - [`logging`]: optional stderr subscriber (behind `logging`)
//!
//! ```no_run
//! use ubxlib::engine::{Engine, EngineConfig};
//! use ubxlib::messages::{MonVer, MonVerPoll};
//! use ubxlib::transport::GpsdTransport;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = GpsdTransport::connect(Default::default())?;
//! let mut engine = Engine::new(transport, ubxlib::registry()?, EngineConfig::default())?;
//! let version = engine.poll_as::<MonVer>(&MonVerPoll::default())?;
//! println!("{}", version.sw_version()?);
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use ubxlib_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use ubxlib_frame::*;
}

/// Re-export registry types.
pub mod registry {
    pub use ubxlib_registry::*;
}

/// Re-export message definitions.
pub mod messages {
    pub use ubxlib_messages::*;
}

/// Re-export engine types.
pub mod engine {
    pub use ubxlib_engine::*;
}

#[cfg(feature = "logging")]
pub mod logging;

/// A registry holding every message type in [`messages`].
pub fn registry() -> ubxlib_registry::Result<ubxlib_registry::FrameRegistry> {
    let mut registry = ubxlib_registry::FrameRegistry::new();
    ubxlib_messages::register_all(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn registry_knows_the_catalogue() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), 9);
        assert!(registry.contains(messages::cfg_rate::CFG_RATE));
        assert!(registry.contains(messages::mon_ver::MON_VER));
    }
}
