use serde::{Deserialize, Serialize};

use crate::domain::identity::Identity;

/// The resolved approval route for one subject: who signs first and who
/// signs after them. Either seat may be empty; an empty seat means the
/// routing rules decided nobody holds it, not that resolution failed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalChain {
    pub first_approver: Option<Identity>,
    pub second_approver: Option<Identity>,
}

impl ApprovalChain {
    pub fn is_empty(&self) -> bool {
        self.first_approver.is_none() && self.second_approver.is_none()
    }

    /// Occupied seats in signing order.
    pub fn approvers(&self) -> impl Iterator<Item = &Identity> {
        self.first_approver.iter().chain(self.second_approver.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::ApprovalChain;
    use crate::domain::identity::{Identity, MailAddress};

    fn named(mail: &str) -> Identity {
        Identity { mail: Some(MailAddress::from(mail)), ..Identity::default() }
    }

    #[test]
    fn empty_chain_reports_no_approvers() {
        let chain = ApprovalChain::default();
        assert!(chain.is_empty());
        assert_eq!(chain.approvers().count(), 0);
    }

    #[test]
    fn approvers_iterate_in_signing_order() {
        let chain = ApprovalChain {
            first_approver: Some(named("jefe@famiq.com.ar")),
            second_approver: Some(named("rrhh@famiq.com.ar")),
        };

        let mails: Vec<&str> = chain
            .approvers()
            .filter_map(|identity| identity.mail.as_ref())
            .map(|mail| mail.as_str())
            .collect();
        assert_eq!(mails, vec!["jefe@famiq.com.ar", "rrhh@famiq.com.ar"]);
    }

    #[test]
    fn single_seat_chain_is_not_empty() {
        let chain = ApprovalChain {
            first_approver: None,
            second_approver: Some(named("rrhh@famiq.com.ar")),
        };
        assert!(!chain.is_empty());
        assert_eq!(chain.approvers().count(), 1);
    }
}
