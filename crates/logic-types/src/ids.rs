//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Runs and sessions are identified by UUID v7 (time-ordered) so that log
//! lines and stored reports sort naturally by creation time. Levels keep
//! their authored numeric id and are not wrapped here.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Unique identifier for one interpreter run.
    RunId
}

define_id! {
    /// Unique identifier for an execution session (one per player view).
    SessionId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_fresh() {
        let a = RunId::new();
        let b = RunId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = SessionId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<SessionId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = RunId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
