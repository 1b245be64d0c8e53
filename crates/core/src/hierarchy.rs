use std::collections::HashSet;

use tracing::{debug, warn};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::config::RolesConfig;
use crate::directory::DirectoryClient;
use crate::domain::identity::Identity;
use crate::errors::DirectoryError;
use crate::roles::{RoleClassifier, RoleSentinels};

/// Upper bound on manager-link advances during an area-manager walk.
pub const DEFAULT_MAX_HOPS: u8 = 8;

/// Walks reporting lines: immediate manager, full management chain and
/// the nearest area manager. All traversal is bounded; a chain that runs
/// out, cycles or exceeds its bound yields a shorter answer, never an
/// error.
#[derive(Clone, Debug)]
pub struct HierarchyResolver<D> {
    directory: D,
    roles: RoleClassifier<D>,
    max_hops: u8,
}

impl<D: DirectoryClient + Clone> HierarchyResolver<D> {
    pub fn new(directory: D, sentinels: RoleSentinels) -> Self {
        let roles = RoleClassifier::new(directory.clone(), sentinels);
        Self { directory, roles, max_hops: DEFAULT_MAX_HOPS }
    }

    /// Builds a resolver from the roles section of the configuration,
    /// carrying the sentinel mails and the hop bound.
    pub fn from_config(directory: D, roles: &RolesConfig) -> Self {
        Self::new(directory, roles.sentinels()).with_max_hops(roles.max_hops)
    }
}

impl<D: DirectoryClient> HierarchyResolver<D> {
    pub fn with_max_hops(mut self, max_hops: u8) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn roles(&self) -> &RoleClassifier<D> {
        &self.roles
    }

    pub fn max_hops(&self) -> u8 {
        self.max_hops
    }

    /// The subject's immediate manager, unless that manager is the
    /// general manager; the top of the organization approves through
    /// other routes.
    pub fn manager(&self, identity: &Identity) -> Result<Option<Identity>, DirectoryError> {
        match self.directory.manager_of(identity)? {
            Some(manager) if self.roles.is_general_manager(&manager) => Ok(None),
            other => Ok(other),
        }
    }

    /// The management chain from the subject's immediate manager upward,
    /// nearest first. The walk stops after the general manager, when a
    /// manager link runs out, or when a repeated or unidentifiable
    /// record would otherwise loop forever. Whatever was collected up to
    /// that point is the answer.
    pub fn hierarchy(&self, identity: &Identity) -> Result<Vec<Identity>, DirectoryError> {
        let mut chain = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut next = self.directory.manager_of(identity)?;

        while let Some(manager) = next {
            let Some(marker) = visit_marker(&manager) else {
                warn!(
                    subject = %identity.display_name(),
                    "management chain hit a record with no mail or key, stopping walk"
                );
                break;
            };
            if !visited.insert(marker) {
                warn!(
                    subject = %identity.display_name(),
                    repeated = %manager.display_name(),
                    "management chain cycled, stopping walk"
                );
                break;
            }
            if self.roles.is_general_manager(&manager) {
                chain.push(manager);
                break;
            }
            next = self.directory.manager_of(&manager)?;
            chain.push(manager);
        }

        Ok(chain)
    }

    /// The nearest area manager at or above the subject. When an
    /// override mail is configured it wins outright; otherwise the walk
    /// checks the subject and then up to `max_hops` managers for
    /// membership in the area-manager group. A general manager found by
    /// the walk defers to the HR manager.
    pub fn area_manager(&self, identity: &Identity) -> Result<Option<Identity>, DirectoryError> {
        if let Some(mail) = self.roles.sentinels().area_manager_mail() {
            debug!(area_manager = %mail, "area manager pinned by override");
            return self.directory.find_by_mail(mail);
        }

        let mut current = identity.clone();
        let mut hops: u8 = 0;
        loop {
            if self.roles.is_area_manager(&current)? {
                return self.defer_general_manager(identity, current);
            }
            if hops == self.max_hops {
                warn!(
                    subject = %identity.display_name(),
                    max_hops = self.max_hops,
                    "area manager walk exceeded hop bound"
                );
                return Ok(None);
            }
            match self.directory.manager_of(&current)? {
                Some(manager) => {
                    hops += 1;
                    current = manager;
                }
                None => return Ok(None),
            }
        }
    }

    /// Same as [`area_manager`](Self::area_manager), emitting one audit
    /// event describing the outcome.
    pub fn area_manager_with_audit<S: AuditSink>(
        &self,
        identity: &Identity,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<Option<Identity>, DirectoryError> {
        let result = self.area_manager(identity);
        match &result {
            Ok(Some(found)) => {
                sink.emit(
                    AuditEvent::new(
                        audit.subject_mail.clone(),
                        audit.correlation_id.clone(),
                        "hierarchy.area_manager_resolved",
                        AuditCategory::Hierarchy,
                        audit.actor.clone(),
                        AuditOutcome::Resolved,
                    )
                    .with_metadata("area_manager", found.display_name()),
                );
            }
            Ok(None) => {
                sink.emit(AuditEvent::new(
                    audit.subject_mail.clone(),
                    audit.correlation_id.clone(),
                    "hierarchy.area_manager_absent",
                    AuditCategory::Hierarchy,
                    audit.actor.clone(),
                    AuditOutcome::Absent,
                ));
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit.subject_mail.clone(),
                        audit.correlation_id.clone(),
                        "hierarchy.area_manager_failed",
                        AuditCategory::Hierarchy,
                        audit.actor.clone(),
                        AuditOutcome::Failed,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }

    fn defer_general_manager(
        &self,
        subject: &Identity,
        candidate: Identity,
    ) -> Result<Option<Identity>, DirectoryError> {
        if self.roles.is_general_manager(&candidate) {
            debug!(
                subject = %subject.display_name(),
                "area manager walk reached the general manager, deferring to hr manager"
            );
            return self.roles.hr_manager();
        }
        Ok(Some(candidate))
    }
}

/// Identifies a record during a walk, preferring the mail attribute and
/// falling back to the key. Records carrying neither cannot be told
/// apart and end the walk.
fn visit_marker(identity: &Identity) -> Option<String> {
    if let Some(mail) = &identity.mail {
        return Some(format!("mail:{mail}"));
    }
    identity.key.as_deref().map(|key| format!("key:{key}"))
}
