use std::collections::BTreeSet;

use crate::directory::DirectoryClient;
use crate::domain::group::GroupRef;
use crate::domain::identity::Identity;
use crate::errors::DirectoryError;

/// Answers group questions on top of a directory. Group names match
/// exactly; a blank name is answered locally without touching the
/// backend.
#[derive(Clone, Debug)]
pub struct GroupMembership<D> {
    directory: D,
}

impl<D: DirectoryClient> GroupMembership<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    pub fn is_member(&self, identity: &Identity, group: &str) -> Result<bool, DirectoryError> {
        if group.trim().is_empty() {
            return Ok(false);
        }
        self.directory.is_member_of(identity, group)
    }

    pub fn groups(&self, identity: &Identity) -> Result<BTreeSet<GroupRef>, DirectoryError> {
        self.directory.group_memberships(identity)
    }
}
