//! Prefixed-hex identifiers for wire entities (`mem_<16-hex>`, `t_<hex>`, …).
//!
//! Each id wraps an opaque `String` rather than a raw `Uuid`, since the wire
//! format names a literal prefix convention per entity kind.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn hex16() -> String {
    let u = Uuid::new_v4();
    u.as_bytes()[..8].iter().map(|b| format!("{b:02x}")).collect()
}

macro_rules! prefixed_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(format!("{}{}", $prefix, hex16()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

prefixed_id!(MemoryId, "mem_");
prefixed_id!(TenantId, "t_");
prefixed_id!(ConstraintId, "con_");
prefixed_id!(LogId, "log_");
prefixed_id!(LinkId, "lnk_");
prefixed_id!(ArtifactId, "tpa_");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_the_right_prefix() {
        assert!(MemoryId::new().as_str().starts_with("mem_"));
        assert!(TenantId::new().as_str().starts_with("t_"));
        assert!(ConstraintId::new().as_str().starts_with("con_"));
        assert!(LogId::new().as_str().starts_with("log_"));
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(MemoryId::new(), MemoryId::new());
    }

    #[test]
    fn ids_roundtrip_through_json() {
        let id = MemoryId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: MemoryId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
