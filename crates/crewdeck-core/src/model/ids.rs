//! Typed id newtypes for every entity collection.
//!
//! Ids are opaque strings assigned by the persistence collaborator; the
//! newtypes exist so a `TaskId` can never be handed to a project lookup.
//! All of them serialize as bare strings.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw id string.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// The raw id as a string slice.
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
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
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
    /// Identifier of a [`Task`](crate::model::Task).
    TaskId
);
entity_id!(
    /// Identifier of a [`Project`](crate::model::Project).
    ProjectId
);
entity_id!(
    /// Identifier of a [`TeamMember`](crate::model::TeamMember).
    MemberId
);
entity_id!(
    /// Identifier of a [`Department`](crate::model::Department).
    DepartmentId
);
entity_id!(
    /// Identifier of a [`Role`](crate::model::Role).
    RoleId
);
