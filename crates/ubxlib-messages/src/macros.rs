/// Implement `UbxFrame` for a struct holding `fields: FieldSet`.
///
/// The `staged` form rebuilds the field set from `Self::schema()` on every
/// decode, for payloads whose shape depends on their content.
macro_rules! ubx_frame {
    ($ty:ident, $cid:expr, $name:literal) => {
        impl ubxlib_frame::UbxFrame for $ty {
            fn cid(&self) -> ubxlib_frame::Cid {
                $cid
            }

            fn name(&self) -> &'static str {
                $name
            }

            fn fields(&self) -> &ubxlib_frame::FieldSet {
                &self.fields
            }

            fn fields_mut(&mut self) -> &mut ubxlib_frame::FieldSet {
                &mut self.fields
            }
        }
    };
    ($ty:ident, $cid:expr, $name:literal, staged) => {
        impl ubxlib_frame::UbxFrame for $ty {
            fn cid(&self) -> ubxlib_frame::Cid {
                $cid
            }

            fn name(&self) -> &'static str {
                $name
            }

            fn fields(&self) -> &ubxlib_frame::FieldSet {
                &self.fields
            }

            fn fields_mut(&mut self) -> &mut ubxlib_frame::FieldSet {
                &mut self.fields
            }

            fn unpack(&mut self, payload: &[u8]) -> ubxlib_frame::Result<()> {
                self.fields = Self::schema().decode(payload)?;
                Ok(())
            }
        }
    };
}

/// `Default` from the schema with every repeated group empty.
macro_rules! schema_default {
    ($ty:ident) => {
        impl Default for $ty {
            fn default() -> Self {
                Self {
                    fields: Self::schema().instantiate(&[]),
                }
            }
        }
    };
}

pub(crate) use schema_default;
pub(crate) use ubx_frame;
