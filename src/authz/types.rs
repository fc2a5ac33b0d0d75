use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::authz::errors::AuthzError;
use crate::authz::PermissionSchema;

/// Tri-state permission value. `Unresolved` means "inherit from the parent
/// group" when stored, and "no applicable setting found" when returned by a
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tri {
    Allow,
    Disallow,
    #[default]
    Unresolved,
}

impl Tri {
    const ALLOW_BITS: u64 = 0b01;
    const DISALLOW_BITS: u64 = 0b10;
    const UNRESOLVED_BITS: u64 = 0b00;

    /// Decode a two-bit storage slot. `0b11` is not a valid encoding.
    pub fn from_bits(bits: u64) -> Option<Self> {
        match bits & 0b11 {
            Self::ALLOW_BITS => Some(Tri::Allow),
            Self::DISALLOW_BITS => Some(Tri::Disallow),
            Self::UNRESOLVED_BITS => Some(Tri::Unresolved),
            _ => None,
        }
    }

    pub fn to_bits(self) -> u64 {
        match self {
            Tri::Allow => Self::ALLOW_BITS,
            Tri::Disallow => Self::DISALLOW_BITS,
            Tri::Unresolved => Self::UNRESOLVED_BITS,
        }
    }

    pub fn is_resolved(self) -> bool {
        self != Tri::Unresolved
    }
}

impl std::fmt::Display for Tri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tri::Allow => "allow",
            Tri::Disallow => "disallow",
            Tri::Unresolved => "unresolved",
        };
        f.write_str(s)
    }
}

// ---------- Schema domain types ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDef {
    pub name: String,
    /// Offset of the operation's two-bit slot in the permission word
    pub bit: u8,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDef {
    pub name: String,
    pub label: Option<String>,
    /// Operations in declaration order
    pub operations: Vec<OperationDef>,
}

impl PermissionDef {
    pub fn operation(&self, name: &str) -> Option<&OperationDef> {
        self.operations.iter().find(|op| op.name == name)
    }
}

/// A `permission` node as read from a document, before validation.
#[derive(Debug, Clone)]
pub struct RawPermission {
    pub name: String,
    pub label: Option<String>,
    pub operations: Vec<RawOperation>,
}

#[derive(Debug, Clone)]
pub struct RawOperation {
    pub name: String,
    /// Kept wide so range checks happen at compile time of the schema
    pub bit: i128,
    pub label: Option<String>,
}

/// Intermediate result from parsing a single KDL document.
#[derive(Debug, Clone, Default)]
pub struct ParsedSchema {
    pub origin: String,
    pub permissions: Vec<RawPermission>,
}

// ---------- Permission storage ----------

/// Per-actor permission storage: one 64-bit word per permission, holding a
/// two-bit tri-state slot for every operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionBits {
    words: HashMap<String, u64>,
}

impl PermissionBits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw words as persisted by the application.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn word(&self, permission: &str) -> u64 {
        self.words.get(permission).copied().unwrap_or(0)
    }

    pub fn get(&self, permission: &str, bit: u8) -> Result<Tri, AuthzError> {
        let word = self.word(permission);
        Tri::from_bits(word.checked_shr(u32::from(bit)).unwrap_or(0)).ok_or_else(|| {
            AuthzError::CorruptPermissionValue {
                permission: permission.to_string(),
                bit,
            }
        })
    }

    pub fn set(&mut self, permission: &str, bit: u8, value: Tri) {
        let shift = u32::from(bit);
        let word = self.words.entry(permission.to_string()).or_insert(0);
        *word &= !(0b11u64 << shift);
        *word |= value.to_bits() << shift;
    }

    /// Set an operation's value by name, looking its slot up in `schema`.
    pub fn set_operation(
        &mut self,
        schema: &PermissionSchema,
        permission: &str,
        operation: &str,
        value: Tri,
    ) -> Result<(), AuthzError> {
        let bit = schema.bit_index_of(permission, operation)?;
        self.set(permission, bit, value);
        Ok(())
    }

    /// Raw words, for persisting back into the application's storage.
    pub fn words(&self) -> impl Iterator<Item = (&str, u64)> {
        self.words.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tri_bit_encoding() {
        assert_eq!(Tri::from_bits(0b00), Some(Tri::Unresolved));
        assert_eq!(Tri::from_bits(0b01), Some(Tri::Allow));
        assert_eq!(Tri::from_bits(0b10), Some(Tri::Disallow));
        assert_eq!(Tri::from_bits(0b11), None);
        // only the low slot is inspected
        assert_eq!(Tri::from_bits(0b0110), Some(Tri::Disallow));
    }

    #[test]
    fn test_tri_round_trips_through_bits() {
        for t in [Tri::Allow, Tri::Disallow, Tri::Unresolved] {
            assert_eq!(Tri::from_bits(t.to_bits()), Some(t));
        }
        assert!(!Tri::Unresolved.is_resolved());
        assert!(Tri::Disallow.is_resolved());
    }

    #[test]
    fn test_tri_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Tri::Allow).unwrap(), "\"allow\"");
        let t: Tri = serde_json::from_str("\"unresolved\"").unwrap();
        assert_eq!(t, Tri::Unresolved);
    }

    #[test]
    fn test_bits_default_unresolved() {
        let bits = PermissionBits::new();
        assert_eq!(bits.get("parts", 0).unwrap(), Tri::Unresolved);
        assert_eq!(bits.get("parts", 62).unwrap(), Tri::Unresolved);
    }

    #[test]
    fn test_bits_set_is_isolated_per_slot() {
        let mut bits = PermissionBits::new();
        bits.set("parts", 0, Tri::Allow);
        bits.set("parts", 2, Tri::Disallow);
        bits.set("users", 0, Tri::Disallow);

        assert_eq!(bits.word("parts"), 0b1001);
        assert_eq!(bits.get("parts", 0).unwrap(), Tri::Allow);
        assert_eq!(bits.get("parts", 2).unwrap(), Tri::Disallow);
        assert_eq!(bits.get("parts", 4).unwrap(), Tri::Unresolved);
        assert_eq!(bits.get("users", 0).unwrap(), Tri::Disallow);

        bits.set("parts", 0, Tri::Unresolved);
        assert_eq!(bits.get("parts", 0).unwrap(), Tri::Unresolved);
        assert_eq!(bits.get("parts", 2).unwrap(), Tri::Disallow);
    }

    #[test]
    fn test_bits_high_slot() {
        let mut bits = PermissionBits::new();
        bits.set("parts", 62, Tri::Disallow);
        assert_eq!(bits.get("parts", 62).unwrap(), Tri::Disallow);
        assert_eq!(bits.word("parts"), 0b10 << 62);
    }

    #[test]
    fn test_bits_corrupt_slot() {
        let bits = PermissionBits::from_words([("parts", 0b1100u64)]);
        let err = bits.get("parts", 2).unwrap_err();
        assert!(matches!(err, AuthzError::CorruptPermissionValue { bit: 2, .. }));
        assert_eq!(bits.get("parts", 0).unwrap(), Tri::Unresolved);
    }
}
