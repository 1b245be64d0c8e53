use crate::directory::DirectoryClient;
use crate::domain::group::GroupRef;
use crate::domain::identity::{Identity, MailAddress};
use crate::errors::DirectoryError;
use crate::membership::GroupMembership;

pub const DEFAULT_AREA_MANAGER_GROUP: &str = "Lider Famiq 1";

/// The organization-wide role anchors: who counts as general manager
/// and HR manager, and how area managers are recognized. Loaded once
/// from configuration and treated as immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleSentinels {
    general_manager_mail: MailAddress,
    hr_manager_mail: Option<MailAddress>,
    area_manager_mail: Option<MailAddress>,
    area_manager_group: GroupRef,
}

impl RoleSentinels {
    pub fn new(general_manager_mail: MailAddress) -> Self {
        Self {
            general_manager_mail,
            hr_manager_mail: None,
            area_manager_mail: None,
            area_manager_group: GroupRef::from(DEFAULT_AREA_MANAGER_GROUP),
        }
    }

    pub fn with_hr_manager(mut self, mail: MailAddress) -> Self {
        self.hr_manager_mail = Some(mail);
        self
    }

    /// Pins area-manager resolution to one person, bypassing the
    /// hierarchy walk entirely.
    pub fn with_area_manager_override(mut self, mail: MailAddress) -> Self {
        self.area_manager_mail = Some(mail);
        self
    }

    pub fn with_area_manager_group(mut self, group: GroupRef) -> Self {
        self.area_manager_group = group;
        self
    }

    pub fn general_manager_mail(&self) -> &MailAddress {
        &self.general_manager_mail
    }

    pub fn hr_manager_mail(&self) -> Option<&MailAddress> {
        self.hr_manager_mail.as_ref()
    }

    pub fn area_manager_mail(&self) -> Option<&MailAddress> {
        self.area_manager_mail.as_ref()
    }

    pub fn area_manager_group(&self) -> &GroupRef {
        &self.area_manager_group
    }

    pub fn is_general_manager(&self, identity: &Identity) -> bool {
        identity.mail.as_ref() == Some(&self.general_manager_mail)
    }

    pub fn is_hr_manager(&self, identity: &Identity) -> bool {
        match (&identity.mail, &self.hr_manager_mail) {
            (Some(mail), Some(sentinel)) => mail == sentinel,
            _ => false,
        }
    }

    /// Whether this person is the pinned area manager. Always false when
    /// no override is configured.
    pub fn is_area_manager_override(&self, identity: &Identity) -> bool {
        match (&identity.mail, &self.area_manager_mail) {
            (Some(mail), Some(sentinel)) => mail == sentinel,
            _ => false,
        }
    }
}

/// Role questions answered against a live directory: sentinel lookups
/// plus group-based area-manager classification.
#[derive(Clone, Debug)]
pub struct RoleClassifier<D> {
    directory: D,
    membership: GroupMembership<D>,
    sentinels: RoleSentinels,
}

impl<D: DirectoryClient + Clone> RoleClassifier<D> {
    pub fn new(directory: D, sentinels: RoleSentinels) -> Self {
        let membership = GroupMembership::new(directory.clone());
        Self { directory, membership, sentinels }
    }
}

impl<D: DirectoryClient> RoleClassifier<D> {
    pub fn sentinels(&self) -> &RoleSentinels {
        &self.sentinels
    }

    /// Mail comparison only; never touches the directory.
    pub fn is_general_manager(&self, identity: &Identity) -> bool {
        self.sentinels.is_general_manager(identity)
    }

    /// Mail comparison only; false when no HR sentinel is configured.
    pub fn is_hr_manager(&self, identity: &Identity) -> bool {
        self.sentinels.is_hr_manager(identity)
    }

    pub fn is_area_manager(&self, identity: &Identity) -> Result<bool, DirectoryError> {
        self.membership.is_member(identity, self.sentinels.area_manager_group.as_str())
    }

    pub fn general_manager(&self) -> Result<Option<Identity>, DirectoryError> {
        self.directory.find_by_mail(&self.sentinels.general_manager_mail)
    }

    pub fn hr_manager(&self) -> Result<Option<Identity>, DirectoryError> {
        match &self.sentinels.hr_manager_mail {
            Some(mail) => self.directory.find_by_mail(mail),
            None => Ok(None),
        }
    }
}
