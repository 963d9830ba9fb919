//! Identifier newtypes.
//!
//! Ids are opaque strings assigned by the remote store. Wrapping them keeps a
//! task id from being passed where a user id is expected.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
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

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Document id of a task in the remote store
    TaskId
);

string_id!(
    /// Id of the user owning a task
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_serde() {
        let id = TaskId::from("65f0c1");
        assert_eq!(id.to_string(), "65f0c1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"65f0c1\"");
        let back: TaskId = serde_json::from_str("\"65f0c1\"").unwrap();
        assert_eq!(back, id);
    }
}
