//! Type-safe identifiers for registry entities.
//!
//! Every entity kind gets its own newtype wrapping a prefixed string id
//! (e.g. `stream_9f86d081884c7d65...`). Generated ids append a v4 UUID to
//! the kind prefix; ids arriving from clients are stored as-is.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an id from an existing string.
            ///
            /// No validation: ids provided by clients (e.g. scene drafts
            /// carrying their own id) are stored verbatim.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a fresh unique id with this kind's prefix.
            pub fn generate() -> Self {
                Self(format!(
                    concat!($prefix, "_{}"),
                    uuid::Uuid::new_v4().simple()
                ))
            }

            /// Returns the underlying string reference.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
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

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

entity_id!(
    /// Identifier for a detected hardware device.
    DeviceId,
    "device"
);

entity_id!(
    /// Identifier for a scene.
    SceneId,
    "scene"
);

entity_id!(
    /// Identifier for a source feed.
    SourceId,
    "source"
);

entity_id!(
    /// Identifier for a live stream session.
    StreamId,
    "stream"
);

entity_id!(
    /// Identifier for a recording session.
    RecordingId,
    "record"
);

entity_id!(
    /// Identifier assigned to a connected control client.
    ClientId,
    "client"
);
