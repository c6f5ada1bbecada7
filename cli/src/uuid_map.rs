//! Deterministic UUIDs for GTS identifiers.
//!
//! The namespace is `uuid5(NAMESPACE_URL, "gts")` and each identifier maps to
//! `uuid5(namespace, canonical_text)`, so the same identifier always yields
//! the same UUID in every implementation.

use gts_core::Identifier;
use uuid::Uuid;

/// Namespace under which all GTS UUIDs are derived.
pub fn gts_namespace() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, b"gts")
}

pub fn identifier_uuid(identifier: &Identifier) -> Uuid {
    Uuid::new_v5(&gts_namespace(), identifier.to_string().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_is_stable() {
        assert_eq!(
            gts_namespace().to_string(),
            "63b06280-5dd6-517d-abc6-5a2127e843c3"
        );
    }

    #[test]
    fn test_known_identifiers() {
        let schema: Identifier = "gts.x.core.events.type.v1~".parse().unwrap();
        assert_eq!(
            identifier_uuid(&schema).to_string(),
            "914ba16d-39d5-518b-9800-490e2144bf98"
        );

        let instance: Identifier = "gts.vendor.app.user.profile.v2.1".parse().unwrap();
        assert_eq!(
            identifier_uuid(&instance).to_string(),
            "1e5f2289-b8aa-5f2d-aa7b-7b82b200a4fb"
        );
    }

    #[test]
    fn test_uses_canonical_text() {
        let padded: Identifier = "  gts.x.core.events.type.v1~ ".parse().unwrap();
        let plain: Identifier = "gts.x.core.events.type.v1~".parse().unwrap();
        assert_eq!(identifier_uuid(&padded), identifier_uuid(&plain));
    }
}
