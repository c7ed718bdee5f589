//! Staged schemas for payloads whose shape depends on decoded content.
//!
//! A schema is a fixed prefix followed by optional repeated groups. A
//! counted group repeats as many times as an earlier field says; a
//! trailing group repeats while enough bytes remain. Decoding runs stage by
//! stage: decode the prefix, read the count, append that many groups, decode
//! the remainder.
//!
//! ```
//! use ubxlib_frame::{FieldKind, Schema};
//!
//! let schema = Schema::new()
//!     .field("numBlocks", FieldKind::U1)
//!     .counted("numBlocks", &[("id", FieldKind::U1), ("flags", FieldKind::X2)]);
//!
//! let set = schema.decode(&[0x02, 0x07, 0x01, 0x00, 0x09, 0x00, 0x80]).unwrap();
//! assert_eq!(set.get_u("id_1").unwrap(), 9);
//! assert_eq!(set.get_u("flags_1").unwrap(), 0x8000);
//! ```

use tracing::debug;

use crate::error::{FrameError, Result};
use crate::fields::{Field, FieldKind, FieldSet};

type Group = Vec<(&'static str, FieldKind)>;

#[derive(Debug, Clone)]
enum Stage {
    Fixed(Group),
    Counted { count_field: &'static str, group: Group },
    Remaining(Group),
}

/// Declarative field layout with support for repeated groups.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    stages: Vec<Stage>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single fixed field.
    pub fn field(mut self, name: &'static str, kind: FieldKind) -> Self {
        match self.stages.last_mut() {
            Some(Stage::Fixed(group)) => group.push((name, kind)),
            _ => self.stages.push(Stage::Fixed(vec![(name, kind)])),
        }
        self
    }

    /// Append a group repeated `count_field` times. Repeated fields are named
    /// `<name>_<index>`.
    pub fn counted(mut self, count_field: &'static str, group: &[(&'static str, FieldKind)]) -> Self {
        self.stages.push(Stage::Counted {
            count_field,
            group: group.to_vec(),
        });
        self
    }

    /// Append a group repeated while enough bytes remain for another one.
    pub fn remaining(mut self, group: &[(&'static str, FieldKind)]) -> Self {
        self.stages.push(Stage::Remaining(group.to_vec()));
        self
    }

    /// Build an empty field set for packing. `counts` supplies the number of
    /// repetitions for each repeated group in declaration order; missing
    /// entries mean zero. Count fields are set to match.
    pub fn instantiate(&self, counts: &[usize]) -> FieldSet {
        let mut set = FieldSet::new();
        let mut counts = counts.iter().copied();
        for stage in &self.stages {
            match stage {
                Stage::Fixed(group) => push_group(&mut set, group, None),
                Stage::Counted { count_field, group } => {
                    let n = counts.next().unwrap_or(0);
                    // set_u only fails for unknown or non-integer fields
                    if set.set_u(count_field, n as u64).is_err() {
                        debug!(count_field, "count field missing from schema prefix");
                    }
                    for index in 0..n {
                        push_group(&mut set, group, Some(index));
                    }
                }
                Stage::Remaining(group) => {
                    let n = counts.next().unwrap_or(0);
                    for index in 0..n {
                        push_group(&mut set, group, Some(index));
                    }
                }
            }
        }
        set
    }

    /// Decode a payload stage by stage.
    ///
    /// Bytes left after the last stage are ignored; receivers append fields in
    /// newer protocol versions.
    pub fn decode(&self, payload: &[u8]) -> Result<FieldSet> {
        let mut set = FieldSet::new();
        let mut rest = payload;

        for stage in &self.stages {
            match stage {
                Stage::Fixed(group) => {
                    let mut part = FieldSet::new();
                    push_group(&mut part, group, None);
                    rest = part.unpack(rest)?;
                    set.append(part)?;
                }
                Stage::Counted { count_field, group } => {
                    let n = set.get_u(count_field)? as usize;
                    let min: usize = group.iter().map(|(_, kind)| kind.min_size()).sum();
                    let needed = n.saturating_mul(min);
                    if needed > rest.len() {
                        return Err(FrameError::Truncated {
                            field: (*count_field).to_string(),
                            needed,
                            available: rest.len(),
                        });
                    }
                    let mut part = FieldSet::new();
                    for index in 0..n {
                        push_group(&mut part, group, Some(index));
                    }
                    rest = part.unpack(rest)?;
                    set.append(part)?;
                }
                Stage::Remaining(group) => {
                    let min: usize = group.iter().map(|(_, kind)| kind.min_size()).sum();
                    let mut index = 0;
                    while min > 0 && rest.len() >= min {
                        let mut part = FieldSet::new();
                        push_group(&mut part, group, Some(index));
                        rest = part.unpack(rest)?;
                        set.append(part)?;
                        index += 1;
                    }
                }
            }
        }

        if !rest.is_empty() {
            debug!(trailing = rest.len(), "ignoring bytes beyond schema");
        }
        Ok(set)
    }
}

fn push_group(set: &mut FieldSet, group: &[(&'static str, FieldKind)], index: Option<usize>) {
    for (name, kind) in group {
        let name = match index {
            Some(index) => format!("{name}_{index}"),
            None => (*name).to_string(),
        };
        set.push_unchecked(Field::new(name, *kind));
    }
}
