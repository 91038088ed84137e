use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::constants::{FOE_LABEL, FRIEND_LABEL};

/// The two classes an identity can be enrolled under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityClass {
    Foe,
    Friend,
}

impl IdentityClass {
    /// Short label stored with the enrollment in the recognizer.
    pub fn label(self) -> &'static str {
        match self {
            IdentityClass::Foe => FOE_LABEL,
            IdentityClass::Friend => FRIEND_LABEL,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            FOE_LABEL => Some(IdentityClass::Foe),
            FRIEND_LABEL => Some(IdentityClass::Friend),
            _ => None,
        }
    }
}

impl fmt::Display for IdentityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityClass::Foe => write!(f, "foe"),
            IdentityClass::Friend => write!(f, "friend"),
        }
    }
}
