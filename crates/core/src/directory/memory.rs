use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::directory::{DirectoryClient, MatchMode};
use crate::domain::group::GroupRef;
use crate::domain::identity::{Identity, MailAddress};
use crate::errors::DirectoryError;

/// One seeded directory record: the identity itself plus the links the
/// backend would normally materialize (manager reference and group
/// memberships).
#[derive(Clone, Debug, Default)]
pub struct DirectoryEntry {
    pub identity: Identity,
    pub manager_key: Option<String>,
    pub groups: BTreeSet<GroupRef>,
    pub primary_group: Option<GroupRef>,
}

impl DirectoryEntry {
    pub fn new(identity: Identity) -> Self {
        Self { identity, manager_key: None, groups: BTreeSet::new(), primary_group: None }
    }

    pub fn with_manager(mut self, manager_key: impl Into<String>) -> Self {
        self.manager_key = Some(manager_key.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<GroupRef>) -> Self {
        self.groups.insert(group.into());
        self
    }

    pub fn with_primary_group(mut self, group: impl Into<GroupRef>) -> Self {
        self.primary_group = Some(group.into());
        self
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    entries: Vec<DirectoryEntry>,
    failure: Option<DirectoryError>,
}

/// In-memory directory used by tests and local tooling. Entries are
/// matched with the same exact, case-sensitive semantics a production
/// backend would apply, and `set_failure` turns every call into the
/// given error so outage handling can be exercised.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record, replacing any existing record with the same key.
    pub fn insert(&self, entry: DirectoryEntry) {
        let mut state = self.lock_state();
        let replaced = entry
            .identity
            .key
            .as_deref()
            .and_then(|key| {
                state.entries.iter().position(|other| other.identity.key.as_deref() == Some(key))
            });
        match replaced {
            Some(index) => state.entries[index] = entry,
            None => state.entries.push(entry),
        }
    }

    /// All subsequent calls fail with `error` until cleared with `None`.
    pub fn set_failure(&self, error: Option<DirectoryError>) {
        self.lock_state().failure = error;
    }

    pub fn len(&self) -> usize {
        self.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_state().entries.is_empty()
    }

    fn lock_state(&self) -> MutexGuard<'_, DirectoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn guarded(&self) -> Result<MutexGuard<'_, DirectoryState>, DirectoryError> {
        let state = self.lock_state();
        match &state.failure {
            Some(error) => Err(error.clone()),
            None => Ok(state),
        }
    }
}

/// Resolves an identity back to its stored entry, preferring the key and
/// falling back to the mail. Detached identities resolve to nothing.
fn locate<'a>(entries: &'a [DirectoryEntry], identity: &Identity) -> Option<&'a DirectoryEntry> {
    if let Some(key) = identity.key.as_deref() {
        if let Some(entry) =
            entries.iter().find(|entry| entry.identity.key.as_deref() == Some(key))
        {
            return Some(entry);
        }
    }
    if let Some(mail) = &identity.mail {
        return entries.iter().find(|entry| entry.identity.mail.as_ref() == Some(mail));
    }
    None
}

fn attribute_value<'a>(identity: &'a Identity, attribute: &str) -> Option<&'a str> {
    match attribute.trim().to_ascii_lowercase().as_str() {
        "key" => identity.key.as_deref(),
        "mail" => identity.mail.as_ref().map(MailAddress::as_str),
        "common_name" => identity.common_name.as_deref(),
        "account_name" => identity.account_name.as_deref(),
        "title" => identity.title.as_deref(),
        "department" => identity.department.as_deref(),
        "sector" => identity.sector.as_deref(),
        "phone_number" => identity.phone_number.as_deref(),
        "mobile_number" => identity.mobile_number.as_deref(),
        "employee_id" => identity.employee_id.as_deref(),
        _ => None,
    }
}

fn attribute_matches(identity: &Identity, attribute: &str, value: &str, mode: MatchMode) -> bool {
    match attribute_value(identity, attribute) {
        Some(stored) => match mode {
            MatchMode::Exact => stored == value,
            MatchMode::Contains => stored.contains(value),
        },
        None => false,
    }
}

fn all_groups(entry: &DirectoryEntry) -> BTreeSet<GroupRef> {
    let mut groups = entry.groups.clone();
    if let Some(primary) = &entry.primary_group {
        groups.insert(primary.clone());
    }
    groups
}

impl DirectoryClient for InMemoryDirectory {
    fn find_by_key(&self, key: &str) -> Result<Option<Identity>, DirectoryError> {
        let state = self.guarded()?;
        Ok(state
            .entries
            .iter()
            .find(|entry| entry.identity.key.as_deref() == Some(key))
            .map(|entry| entry.identity.clone()))
    }

    fn find_by_mail(&self, mail: &MailAddress) -> Result<Option<Identity>, DirectoryError> {
        let state = self.guarded()?;
        Ok(state
            .entries
            .iter()
            .find(|entry| entry.identity.mail.as_ref() == Some(mail))
            .map(|entry| entry.identity.clone()))
    }

    fn find_by_attribute(
        &self,
        attribute: &str,
        value: &str,
        mode: MatchMode,
    ) -> Result<Option<Identity>, DirectoryError> {
        let state = self.guarded()?;
        Ok(state
            .entries
            .iter()
            .find(|entry| attribute_matches(&entry.identity, attribute, value, mode))
            .map(|entry| entry.identity.clone()))
    }

    fn manager_of(&self, identity: &Identity) -> Result<Option<Identity>, DirectoryError> {
        let state = self.guarded()?;
        let manager_key = match locate(&state.entries, identity) {
            Some(entry) => entry.manager_key.clone(),
            None => None,
        };
        let Some(manager_key) = manager_key else {
            return Ok(None);
        };
        Ok(state
            .entries
            .iter()
            .find(|entry| entry.identity.key.as_deref() == Some(manager_key.as_str()))
            .map(|entry| entry.identity.clone()))
    }

    fn direct_reports(&self, identity: &Identity) -> Result<Vec<Identity>, DirectoryError> {
        let state = self.guarded()?;
        let Some(subject_key) = locate(&state.entries, identity)
            .and_then(|entry| entry.identity.key.clone())
        else {
            return Ok(Vec::new());
        };
        Ok(state
            .entries
            .iter()
            .filter(|entry| entry.manager_key.as_deref() == Some(subject_key.as_str()))
            .map(|entry| entry.identity.clone())
            .collect())
    }

    fn group_memberships(&self, identity: &Identity) -> Result<BTreeSet<GroupRef>, DirectoryError> {
        let state = self.guarded()?;
        Ok(locate(&state.entries, identity).map(all_groups).unwrap_or_default())
    }

    fn is_member_of(&self, identity: &Identity, group: &str) -> Result<bool, DirectoryError> {
        let state = self.guarded()?;
        let Some(entry) = locate(&state.entries, identity) else {
            return Ok(false);
        };
        let in_primary = entry.primary_group.as_ref().map(GroupRef::as_str) == Some(group);
        Ok(in_primary || entry.groups.iter().any(|member| member.as_str() == group))
    }

    fn list_by_department(&self, department: &str) -> Result<Vec<Identity>, DirectoryError> {
        let state = self.guarded()?;
        Ok(state
            .entries
            .iter()
            .filter(|entry| entry.identity.department.as_deref() == Some(department))
            .map(|entry| entry.identity.clone())
            .collect())
    }

    fn search_by_attribute(
        &self,
        attribute: &str,
        fragment: &str,
    ) -> Result<Vec<Identity>, DirectoryError> {
        let state = self.guarded()?;
        Ok(state
            .entries
            .iter()
            .filter(|entry| {
                attribute_matches(&entry.identity, attribute, fragment, MatchMode::Contains)
            })
            .map(|entry| entry.identity.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{DirectoryEntry, InMemoryDirectory};
    use crate::directory::{DirectoryClient, MatchMode};
    use crate::domain::identity::{Identity, MailAddress};
    use crate::errors::DirectoryError;

    fn entry(key: &str, mail: &str, department: &str) -> DirectoryEntry {
        DirectoryEntry::new(Identity {
            key: Some(key.to_string()),
            mail: Some(MailAddress::from(mail)),
            common_name: Some(key.replace('-', " ")),
            department: Some(department.to_string()),
            ..Identity::default()
        })
    }

    fn seeded() -> InMemoryDirectory {
        let directory = InMemoryDirectory::new();
        directory.insert(
            entry("user-marta", "marta@famiq.com.ar", "Administracion")
                .with_group("Lider Famiq 1"),
        );
        directory.insert(
            entry("user-pablo", "pablo@famiq.com.ar", "Produccion").with_manager("user-marta"),
        );
        directory.insert(
            entry("user-lucia", "lucia@famiq.com.ar", "Produccion").with_manager("user-marta"),
        );
        directory
    }

    #[test]
    fn lookups_are_exact_and_case_sensitive() {
        let directory = seeded();

        let found = directory
            .find_by_mail(&MailAddress::from("pablo@famiq.com.ar"))
            .expect("lookup should succeed");
        assert_eq!(found.and_then(|identity| identity.key), Some("user-pablo".to_string()));

        let wrong_case = directory
            .find_by_mail(&MailAddress::from("Pablo@famiq.com.ar"))
            .expect("lookup should succeed");
        assert!(wrong_case.is_none(), "mail matching must not fold case");
    }

    #[test]
    fn attribute_search_supports_exact_and_contains() {
        let directory = seeded();

        let exact = directory
            .find_by_attribute("department", "Produccion", MatchMode::Exact)
            .expect("search should succeed");
        assert!(exact.is_some());

        let contains = directory
            .search_by_attribute("mail", "lucia")
            .expect("search should succeed");
        assert_eq!(contains.len(), 1);

        let unknown = directory
            .find_by_attribute("shoe_size", "43", MatchMode::Exact)
            .expect("search should succeed");
        assert!(unknown.is_none(), "unknown attributes match nothing");
    }

    #[test]
    fn department_listing_matches_exactly() {
        let directory = seeded();

        let production = directory
            .list_by_department("Produccion")
            .expect("listing should succeed");
        assert_eq!(production.len(), 2);

        let lowercase = directory
            .list_by_department("produccion")
            .expect("listing should succeed");
        assert!(lowercase.is_empty(), "department matching must not fold case");
    }

    #[test]
    fn manager_link_resolves_through_stored_key() {
        let directory = seeded();
        let pablo = directory
            .find_by_key("user-pablo")
            .expect("lookup should succeed")
            .expect("pablo is seeded");

        let manager = directory.manager_of(&pablo).expect("manager lookup should succeed");
        assert_eq!(
            manager.and_then(|identity| identity.mail),
            Some(MailAddress::from("marta@famiq.com.ar"))
        );
    }

    #[test]
    fn dangling_manager_link_resolves_to_nobody() {
        let directory = seeded();
        directory.insert(
            entry("user-orphan", "orphan@famiq.com.ar", "Produccion").with_manager("user-gone"),
        );
        let orphan = directory
            .find_by_key("user-orphan")
            .expect("lookup should succeed")
            .expect("orphan is seeded");

        let manager = directory.manager_of(&orphan).expect("manager lookup should succeed");
        assert!(manager.is_none());
    }

    #[test]
    fn direct_reports_keep_insertion_order_and_prepend_self() {
        let directory = seeded();
        let marta = directory
            .find_by_key("user-marta")
            .expect("lookup should succeed")
            .expect("marta is seeded");

        let reports = directory.direct_reports(&marta).expect("reports lookup should succeed");
        let keys: Vec<Option<&str>> =
            reports.iter().map(|identity| identity.key.as_deref()).collect();
        assert_eq!(keys, vec![Some("user-pablo"), Some("user-lucia")]);

        let roster =
            directory.direct_reports_with_self(&marta).expect("roster lookup should succeed");
        assert_eq!(roster.len(), 3);
        assert_eq!(roster[0].key.as_deref(), Some("user-marta"));
    }

    #[test]
    fn membership_covers_primary_group_and_is_exact() {
        let directory = InMemoryDirectory::new();
        directory.insert(
            entry("user-ines", "ines@famiq.com.ar", "Calidad")
                .with_group("Auditores")
                .with_primary_group("Domain Users"),
        );
        let ines = directory
            .find_by_key("user-ines")
            .expect("lookup should succeed")
            .expect("ines is seeded");

        assert!(directory.is_member_of(&ines, "Auditores").expect("membership should resolve"));
        assert!(directory.is_member_of(&ines, "Domain Users").expect("membership should resolve"));
        assert!(!directory.is_member_of(&ines, "auditores").expect("membership should resolve"));

        let groups = directory.group_memberships(&ines).expect("memberships should resolve");
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn insert_replaces_record_with_same_key() {
        let directory = seeded();
        directory.insert(entry("user-pablo", "pablo.nuevo@famiq.com.ar", "Mantenimiento"));

        assert_eq!(directory.len(), 3);
        let refreshed = directory
            .find_by_key("user-pablo")
            .expect("lookup should succeed")
            .expect("pablo is still present");
        assert_eq!(refreshed.mail, Some(MailAddress::from("pablo.nuevo@famiq.com.ar")));
    }

    #[test]
    fn injected_failure_surfaces_from_every_call() {
        let directory = seeded();
        directory.set_failure(Some(DirectoryError::unavailable("simulated outage")));

        let error = directory
            .find_by_key("user-pablo")
            .expect_err("outage should surface as an error");
        assert_eq!(error, DirectoryError::unavailable("simulated outage"));

        directory.set_failure(None);
        assert!(directory.find_by_key("user-pablo").expect("recovered lookup").is_some());
    }

    #[test]
    fn detached_identity_has_no_links() {
        let directory = seeded();
        let stranger = Identity {
            mail: Some(MailAddress::from("stranger@elsewhere.com")),
            ..Identity::default()
        };

        assert!(directory.manager_of(&stranger).expect("lookup should succeed").is_none());
        assert!(directory.direct_reports(&stranger).expect("lookup should succeed").is_empty());
        assert!(!directory
            .is_member_of(&stranger, "Lider Famiq 1")
            .expect("lookup should succeed"));
    }
}
