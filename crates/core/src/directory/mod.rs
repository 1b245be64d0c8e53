pub mod fixtures;
mod memory;

pub use memory::{DirectoryEntry, InMemoryDirectory};

use std::collections::BTreeSet;

use crate::domain::group::GroupRef;
use crate::domain::identity::{Identity, MailAddress};
use crate::errors::DirectoryError;

/// How attribute values are compared during a directory search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    Contains,
}

/// The directory capability the rest of the crate is written against.
///
/// Implementations answer questions about people, reporting lines and
/// group membership. All value comparisons are exact and case-sensitive;
/// a miss is `Ok(None)` (or an empty collection), never an error. The
/// error type is reserved for backends that could not answer at all.
pub trait DirectoryClient: Send + Sync {
    fn find_by_key(&self, key: &str) -> Result<Option<Identity>, DirectoryError>;

    fn find_by_mail(&self, mail: &MailAddress) -> Result<Option<Identity>, DirectoryError>;

    /// First record whose named attribute matches `value` under `mode`.
    fn find_by_attribute(
        &self,
        attribute: &str,
        value: &str,
        mode: MatchMode,
    ) -> Result<Option<Identity>, DirectoryError>;

    /// The record the subject's manager link points at, if the link is
    /// set and resolvable.
    fn manager_of(&self, identity: &Identity) -> Result<Option<Identity>, DirectoryError>;

    fn direct_reports(&self, identity: &Identity) -> Result<Vec<Identity>, DirectoryError>;

    /// The subject followed by their direct reports, in one list.
    fn direct_reports_with_self(
        &self,
        identity: &Identity,
    ) -> Result<Vec<Identity>, DirectoryError> {
        let mut roster = vec![identity.clone()];
        roster.extend(self.direct_reports(identity)?);
        Ok(roster)
    }

    fn group_memberships(&self, identity: &Identity) -> Result<BTreeSet<GroupRef>, DirectoryError>;

    /// Whether the subject belongs to the group with exactly this name.
    fn is_member_of(&self, identity: &Identity, group: &str) -> Result<bool, DirectoryError>;

    fn list_by_department(&self, department: &str) -> Result<Vec<Identity>, DirectoryError>;

    /// Every record whose named attribute contains `fragment`.
    fn search_by_attribute(
        &self,
        attribute: &str,
        fragment: &str,
    ) -> Result<Vec<Identity>, DirectoryError>;
}
