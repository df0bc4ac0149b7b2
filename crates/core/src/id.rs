// SPDX-License-Identifier: MIT

//! UUID-backed identifiers.
//!
//! Every addressable entity in a tree (jobs, trees, resources) carries a
//! stable [`uuid::Uuid`] per spec — assignment is write-once and identity
//! never changes across iterations or resets.

use uuid::Uuid;

/// Define a newtype ID wrapper around [`Uuid`].
///
/// Generates `new()` for random generation, `from_uuid()`/`parse_str()` for
/// reconstructing an ID from a document, `Display` (hyphenated form), and the
/// trait impls needed to use the ID as a `HashMap` key or XML attribute value.
///
/// ```ignore
/// define_id! {
///     /// Identifier for a job instance.
///     pub struct JobId;
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub uuid::Uuid);

        impl $name {
            /// Generate a new random (v4) identifier.
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID (e.g. one resolved from a parsed document).
            pub fn from_uuid(id: uuid::Uuid) -> Self {
                Self(id)
            }

            /// Parse a hyphenated or simple-hex UUID string.
            pub fn parse_str(s: &str) -> Result<Self, uuid::Error> {
                uuid::Uuid::parse_str(s).map(Self)
            }

            pub fn as_uuid(&self) -> uuid::Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(id: uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_str(s)
            }
        }
    };
}

/// Returns a string slice truncated to at most `n` characters.
///
/// Used for short log-friendly renderings of names and ids.
pub fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        s
    } else {
        &s[..n]
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
