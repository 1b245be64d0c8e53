use tracing::debug;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::config::RolesConfig;
use crate::directory::DirectoryClient;
use crate::domain::approval::ApprovalChain;
use crate::domain::identity::Identity;
use crate::errors::DirectoryError;
use crate::hierarchy::HierarchyResolver;
use crate::roles::RoleSentinels;

/// Routes a subject's request to its approvers.
///
/// The first seat belongs to the immediate manager, except that people
/// reporting straight to the general manager route to the HR manager
/// instead, and the HR manager routes to nobody. The second seat
/// belongs to the HR manager unless that would duplicate the first seat
/// or the subject sits too close to the top to need one.
#[derive(Clone, Debug)]
pub struct ApprovalChainBuilder<D> {
    directory: D,
    hierarchy: HierarchyResolver<D>,
}

impl<D: DirectoryClient + Clone> ApprovalChainBuilder<D> {
    pub fn new(directory: D, sentinels: RoleSentinels) -> Self {
        let hierarchy = HierarchyResolver::new(directory.clone(), sentinels);
        Self { directory, hierarchy }
    }

    /// Builds the routing side from the roles section of the
    /// configuration, carrying the sentinel mails and the hop bound.
    pub fn from_config(directory: D, roles: &RolesConfig) -> Self {
        Self::new(directory, roles.sentinels()).with_max_hops(roles.max_hops)
    }
}

impl<D: DirectoryClient> ApprovalChainBuilder<D> {
    pub fn with_max_hops(mut self, max_hops: u8) -> Self {
        self.hierarchy = self.hierarchy.with_max_hops(max_hops);
        self
    }

    pub fn hierarchy(&self) -> &HierarchyResolver<D> {
        &self.hierarchy
    }

    pub fn first_approver(&self, identity: &Identity) -> Result<Option<Identity>, DirectoryError> {
        Ok(self.first_approver_with_reason(identity)?.0)
    }

    pub fn second_approver(
        &self,
        identity: &Identity,
    ) -> Result<Option<Identity>, DirectoryError> {
        Ok(self.second_approver_with_reason(identity)?.0)
    }

    pub fn chain(&self, identity: &Identity) -> Result<ApprovalChain, DirectoryError> {
        Ok(ApprovalChain {
            first_approver: self.first_approver(identity)?,
            second_approver: self.second_approver(identity)?,
        })
    }

    /// Same as [`chain`](Self::chain), emitting one audit event per
    /// seat with the resolved approver and the routing reason.
    pub fn chain_with_audit<S: AuditSink>(
        &self,
        identity: &Identity,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<ApprovalChain, DirectoryError> {
        let first = self.first_approver_with_reason(identity);
        emit_seat(sink, audit, "first_approver", &first);
        let (first_approver, _) = first?;

        let second = self.second_approver_with_reason(identity);
        emit_seat(sink, audit, "second_approver", &second);
        let (second_approver, _) = second?;

        Ok(ApprovalChain { first_approver, second_approver })
    }

    fn first_approver_with_reason(
        &self,
        identity: &Identity,
    ) -> Result<(Option<Identity>, &'static str), DirectoryError> {
        let roles = self.hierarchy.roles();
        let manager = self.directory.manager_of(identity)?;
        let hr_manager = roles.hr_manager()?;

        if let Some(hr) = &hr_manager {
            if hr.is_same_person(identity) {
                return Ok((None, "subject_is_hr_manager"));
            }
        }

        match manager {
            Some(manager) if roles.is_general_manager(&manager) => {
                debug!(
                    subject = %identity.display_name(),
                    "manager is the general manager, routing first seat to hr manager"
                );
                Ok((hr_manager, "general_manager_deferred_to_hr"))
            }
            Some(manager) => Ok((Some(manager), "manager_link")),
            None => Ok((None, "no_manager")),
        }
    }

    fn second_approver_with_reason(
        &self,
        identity: &Identity,
    ) -> Result<(Option<Identity>, &'static str), DirectoryError> {
        let (first_approver, _) = self.first_approver_with_reason(identity)?;
        let roles = self.hierarchy.roles();

        let Some(general_manager) = roles.general_manager()? else {
            return Ok((None, "general_manager_unresolved"));
        };
        if general_manager.is_same_person(identity) {
            return Ok((None, "subject_is_general_manager"));
        }

        let Some(hr_manager) = roles.hr_manager()? else {
            return Ok((None, "hr_manager_unresolved"));
        };
        if hr_manager.is_same_person(identity) {
            return Ok((None, "subject_is_hr_manager"));
        }
        if let Some(manager) = self.hierarchy.manager(identity)? {
            if hr_manager.is_same_person(&manager) {
                return Ok((None, "hr_manager_is_the_manager"));
            }
        }
        if let Some(first) = &first_approver {
            if first.is_same_person(&hr_manager) {
                return Ok((None, "hr_manager_already_holds_first_seat"));
            }
        }

        Ok((Some(hr_manager), "hr_manager"))
    }
}

fn emit_seat<S: AuditSink>(
    sink: &S,
    audit: &AuditContext,
    seat: &str,
    resolution: &Result<(Option<Identity>, &'static str), DirectoryError>,
) {
    let event = match resolution {
        Ok((Some(approver), reason)) => AuditEvent::new(
            audit.subject_mail.clone(),
            audit.correlation_id.clone(),
            format!("routing.{seat}_resolved"),
            AuditCategory::Routing,
            audit.actor.clone(),
            AuditOutcome::Resolved,
        )
        .with_metadata("approver", approver.display_name())
        .with_metadata("reason", *reason),
        Ok((None, reason)) => AuditEvent::new(
            audit.subject_mail.clone(),
            audit.correlation_id.clone(),
            format!("routing.{seat}_absent"),
            AuditCategory::Routing,
            audit.actor.clone(),
            AuditOutcome::Absent,
        )
        .with_metadata("reason", *reason),
        Err(error) => AuditEvent::new(
            audit.subject_mail.clone(),
            audit.correlation_id.clone(),
            format!("routing.{seat}_failed"),
            AuditCategory::Routing,
            audit.actor.clone(),
            AuditOutcome::Failed,
        )
        .with_metadata("error", error.to_string()),
    };
    sink.emit(event);
}
