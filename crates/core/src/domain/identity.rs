use std::fmt;

use serde::{Deserialize, Serialize};

/// Label the directory uses for attributes nobody has filled in yet.
pub const UNASSIGNED_LABEL: &str = "*A definir";

/// Mail addresses are compared exactly as stored. The directory is the
/// source of truth for casing, so no normalization happens here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MailAddress(pub String);

impl MailAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MailAddress {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for MailAddress {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// A person as the directory knows them. Every attribute is optional
/// because real directory records are sparse; accessors paper over the
/// gaps where a display default is wanted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub key: Option<String>,
    pub mail: Option<MailAddress>,
    pub common_name: Option<String>,
    pub account_name: Option<String>,
    pub title: Option<String>,
    pub department: Option<String>,
    pub sector: Option<String>,
    pub phone_number: Option<String>,
    pub mobile_number: Option<String>,
    pub employee_id: Option<String>,
}

impl Identity {
    pub fn title_or_default(&self) -> &str {
        non_blank(self.title.as_deref()).unwrap_or(UNASSIGNED_LABEL)
    }

    pub fn department_or_default(&self) -> &str {
        non_blank(self.department.as_deref()).unwrap_or(UNASSIGNED_LABEL)
    }

    pub fn sector_or_default(&self) -> &str {
        non_blank(self.sector.as_deref()).unwrap_or(UNASSIGNED_LABEL)
    }

    /// Two records describe the same person only when both carry a mail
    /// attribute and the two values are identical.
    pub fn is_same_person(&self, other: &Identity) -> bool {
        match (&self.mail, &other.mail) {
            (Some(own), Some(theirs)) => own == theirs,
            _ => false,
        }
    }

    pub fn display_name(&self) -> &str {
        self.common_name
            .as_deref()
            .or(self.mail.as_ref().map(MailAddress::as_str))
            .or(self.key.as_deref())
            .unwrap_or("(unidentified)")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|raw| !raw.trim().is_empty())
}
