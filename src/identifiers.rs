//! Type-safe identifier wrappers.
//!
//! Newtypes keep application identifiers, cloud device identifiers and
//! pairing request identifiers from being mixed up at compile time.
//!
//! | Type | Origin |
//! |------|--------|
//! | [`AppId`] | Tizen application identifier (`"111299001912"`, `"netflix"`) |
//! | [`CloudDeviceId`] | SmartThings device UUID |
//! | [`PairingRequestId`] | Request id handed out by legacy PIN pairing step 1 |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Macro
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[inline]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
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
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// ============================================================================
// Identifiers
// ============================================================================

string_id!(
    /// Identifier of an application installed on the television.
    AppId
);

string_id!(
    /// Identifier of a device registered with the SmartThings cloud.
    CloudDeviceId
);

string_id!(
    /// Request identifier returned by the first legacy PIN pairing step.
    PairingRequestId
);

// ============================================================================
// Tests
// ============================================================================
