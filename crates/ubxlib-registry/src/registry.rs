use std::any::TypeId;
use std::collections::HashMap;

use tracing::{debug, warn};
use ubxlib_frame::{Cid, Prototype, UbxFrame};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};

type Constructor = fn() -> Box<dyn UbxFrame>;

struct Entry {
    type_id: TypeId,
    type_name: &'static str,
    construct: Constructor,
}

fn construct<T: Prototype>() -> Box<dyn UbxFrame> {
    Box::new(T::default())
}

/// Identity-keyed table of frame constructors.
///
/// One registry serves one engine session. It is handed to the engine at
/// construction; tests build a fresh one to start from an empty table.
pub struct FrameRegistry {
    entries: HashMap<Cid, Entry>,
    config: RegistryConfig,
}

impl FrameRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
        }
    }

    /// Register a frame type under its identity.
    ///
    /// The first registration for an identity wins. Registering the same
    /// type again is a no-op; a different type for a taken identity is
    /// logged and ignored unless `fail_on_duplicate` is set.
    pub fn register<T: Prototype>(&mut self) -> Result<()> {
        let cid = T::CID;
        let type_name = std::any::type_name::<T>();

        if let Some(existing) = self.entries.get(&cid) {
            if existing.type_id == TypeId::of::<T>() {
                debug!(%cid, type_name, "frame already registered");
                return Ok(());
            }
            if self.config.fail_on_duplicate {
                return Err(RegistryError::AlreadyRegistered(cid));
            }
            warn!(
                %cid,
                registered = existing.type_name,
                ignored = type_name,
                "identity already registered, keeping first type"
            );
            return Ok(());
        }

        debug!(%cid, type_name, "registering frame");
        self.entries.insert(
            cid,
            Entry {
                type_id: TypeId::of::<T>(),
                type_name,
                construct: construct::<T>,
            },
        );
        Ok(())
    }

    /// Construct a default instance of the type registered for `cid`.
    pub fn build(&self, cid: Cid) -> Result<Box<dyn UbxFrame>> {
        let entry = self
            .entries
            .get(&cid)
            .ok_or(RegistryError::NotRegistered(cid))?;
        Ok((entry.construct)())
    }

    /// Construct the type registered for `cid` and decode `payload` into it.
    pub fn build_with_data(&self, cid: Cid, payload: &[u8]) -> Result<Box<dyn UbxFrame>> {
        let mut frame = self.build(cid)?;
        frame
            .unpack(payload)
            .map_err(|source| RegistryError::Decode { cid, source })?;
        Ok(frame)
    }

    /// Check if an identity has a registered type.
    pub fn contains(&self, cid: Cid) -> bool {
        self.entries.contains_key(&cid)
    }

    /// Registered identities in ascending order.
    pub fn cids(&self) -> Vec<Cid> {
        let mut cids: Vec<Cid> = self.entries.keys().copied().collect();
        cids.sort_unstable();
        cids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all registrations.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for FrameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRegistry")
            .field("cids", &self.cids())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use ubxlib_frame::{Field, FieldKind, FieldSet, FrameError, RawFrame};

    use super::*;

    #[derive(Debug)]
    struct Rate {
        fields: FieldSet,
    }

    impl Default for Rate {
        fn default() -> Self {
            let mut fields = FieldSet::new();
            for name in ["measRate", "navRate", "timeRef"] {
                fields.add(Field::new(name, FieldKind::U2)).unwrap();
            }
            Self { fields }
        }
    }

    impl UbxFrame for Rate {
        fn cid(&self) -> Cid {
            Self::CID
        }

        fn fields(&self) -> &FieldSet {
            &self.fields
        }

        fn fields_mut(&mut self) -> &mut FieldSet {
            &mut self.fields
        }
    }

    impl Prototype for Rate {
        const CID: Cid = Cid::new(0x06, 0x08);
    }

    #[derive(Debug, Default)]
    struct Impostor {
        fields: FieldSet,
    }

    impl UbxFrame for Impostor {
        fn cid(&self) -> Cid {
            Self::CID
        }

        fn fields(&self) -> &FieldSet {
            &self.fields
        }

        fn fields_mut(&mut self) -> &mut FieldSet {
            &mut self.fields
        }
    }

    impl Prototype for Impostor {
        const CID: Cid = Cid::new(0x06, 0x08);
    }

    #[test]
    fn build_registered_frame() {
        let mut registry = FrameRegistry::new();
        registry.register::<Rate>().unwrap();

        let frame = registry.build(Cid::new(0x06, 0x08)).unwrap();
        assert_eq!(frame.cid(), Rate::CID);
        assert_eq!(frame.fields().len(), 3);
    }

    #[test]
    fn build_with_data_decodes_payload() {
        let mut registry = FrameRegistry::new();
        registry.register::<Rate>().unwrap();

        let frame = registry
            .build_with_data(Rate::CID, &[0xE8, 0x03, 0x01, 0x00, 0x01, 0x00])
            .unwrap();
        assert_eq!(frame.fields().get_u("measRate").unwrap(), 1000);
        assert_eq!(frame.fields().get_u("navRate").unwrap(), 1);
        assert_eq!(frame.fields().get_u("timeRef").unwrap(), 1);

        let rate = frame
            .into_any()
            .downcast::<Rate>()
            .expect("should downcast to the registered type");
        assert_eq!(rate.fields.get_u("measRate").unwrap(), 1000);
    }

    #[test]
    fn unregistered_identity_is_distinct_from_decode_failure() {
        let mut registry = FrameRegistry::new();
        assert!(matches!(
            registry.build(Rate::CID),
            Err(RegistryError::NotRegistered(cid)) if cid == Rate::CID
        ));

        registry.register::<Rate>().unwrap();
        let result = registry.build_with_data(Rate::CID, &[0xE8, 0x03]);
        assert!(matches!(
            result,
            Err(RegistryError::Decode {
                source: FrameError::Truncated { .. },
                ..
            })
        ));
    }

    #[test]
    fn duplicate_registration_keeps_first_type() {
        let mut registry = FrameRegistry::new();
        registry.register::<Rate>().unwrap();
        registry.register::<Rate>().unwrap();
        registry.register::<Impostor>().unwrap();

        assert_eq!(registry.len(), 1);
        let frame = registry.build(Rate::CID).unwrap();
        assert!(frame.as_ref().as_any().is::<Rate>());
    }

    #[test]
    fn strict_duplicate_registration_fails() {
        let mut registry = FrameRegistry::with_config(RegistryConfig {
            fail_on_duplicate: true,
        });
        registry.register::<Rate>().unwrap();
        registry.register::<Rate>().unwrap();
        assert!(matches!(
            registry.register::<Impostor>(),
            Err(RegistryError::AlreadyRegistered(_))
        ));
    }

    #[test]
    fn clear_resets_to_empty() {
        let mut registry = FrameRegistry::new();
        registry.register::<Rate>().unwrap();
        registry.register::<RawProbe>().unwrap();
        assert_eq!(registry.cids(), vec![Rate::CID, RawProbe::CID]);

        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.contains(Rate::CID));
    }

    #[derive(Debug)]
    struct RawProbe(RawFrame);

    impl Default for RawProbe {
        fn default() -> Self {
            Self(RawFrame::new(Self::CID, Vec::new()))
        }
    }

    impl UbxFrame for RawProbe {
        fn cid(&self) -> Cid {
            Self::CID
        }

        fn fields(&self) -> &FieldSet {
            self.0.fields()
        }

        fn fields_mut(&mut self) -> &mut FieldSet {
            self.0.fields_mut()
        }
    }

    impl Prototype for RawProbe {
        const CID: Cid = Cid::new(0x0A, 0x04);
    }
}
