use std::fmt;

use serde::{Deserialize, Serialize};

/// A directory security group, identified by its common name. Matching
/// anywhere in the crate is exact and case-sensitive.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupRef(pub String);

impl GroupRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupRef {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for GroupRef {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
