//! Type-safe identifiers.
//!
//! Students, games and courses are owned by the surrounding platform and
//! reach the engine as opaque strings. Each gets its own newtype so that a
//! game id can never be passed where a student id is expected. Completion
//! records are keyed by [`RecordId`], a UUID v4 minted on append.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an opaque identifier string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a student enrolled on the platform.
    StudentId
);

opaque_id!(
    /// Identifier of an arithmetic game.
    GameId
);

opaque_id!(
    /// Identifier of a course grouping students and games.
    CourseId
);

/// Unique identifier of an activity completion record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct RecordId(uuid::Uuid);

impl RecordId {
    /// Creates a new random `RecordId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `RecordId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn opaque_ids_display_verbatim() {
        let id = StudentId::new("student-7");
        assert_eq!(id.to_string(), "student-7");
        assert_eq!(id.as_str(), "student-7");
    }

    #[test]
    fn opaque_ids_serialize_as_plain_strings() {
        let id = GameId::from("sums");
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"sums\"");
    }

    #[test]
    fn record_ids_are_unique() {
        assert_ne!(RecordId::new(), RecordId::default());
    }

    #[test]
    fn ids_order_lexicographically() {
        let mut ids = vec![CourseId::from("b"), CourseId::from("a")];
        ids.sort();
        assert_eq!(ids, vec![CourseId::from("a"), CourseId::from("b")]);
    }
}
