use serde::Deserialize;
use thiserror::Error;

use crate::directory::{DirectoryClient, DirectoryEntry, InMemoryDirectory};
use crate::domain::group::GroupRef;
use crate::domain::identity::{Identity, MailAddress};
use crate::errors::DirectoryError;

pub const SEED_GENERAL_MANAGER_MAIL: &str = "gerencia.general@famiq.com.ar";
pub const SEED_HR_MANAGER_MAIL: &str = "rrhh@famiq.com.ar";
pub const SEED_AREA_MANAGER_GROUP: &str = "Lider Famiq 1";

const SEED_AREA_GROUP_MEMBERS: &[&str] =
    &["marta.rinaldi@famiq.com.ar", "hernan.acosta@famiq.com.ar"];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("could not parse org seed fixture: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    people: Vec<SeedPerson>,
}

#[derive(Debug, Deserialize)]
struct SeedPerson {
    key: String,
    mail: String,
    common_name: String,
    account_name: Option<String>,
    title: Option<String>,
    department: Option<String>,
    sector: Option<String>,
    phone_number: Option<String>,
    mobile_number: Option<String>,
    employee_id: Option<String>,
    manager: Option<String>,
    #[serde(default)]
    groups: Vec<String>,
    primary_group: Option<String>,
}

impl SeedPerson {
    fn into_entry(self) -> DirectoryEntry {
        let mut entry = DirectoryEntry::new(Identity {
            key: Some(self.key),
            mail: Some(MailAddress::from(self.mail)),
            common_name: Some(self.common_name),
            account_name: self.account_name,
            title: self.title,
            department: self.department,
            sector: self.sector,
            phone_number: self.phone_number,
            mobile_number: self.mobile_number,
            employee_id: self.employee_id,
        });
        if let Some(manager) = self.manager {
            entry = entry.with_manager(manager);
        }
        for group in self.groups {
            entry = entry.with_group(group);
        }
        if let Some(primary) = self.primary_group {
            entry = entry.with_primary_group(primary);
        }
        entry
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedSummary {
    pub people: usize,
    pub area_group_members: usize,
}

#[derive(Clone, Debug)]
pub struct VerificationCheck {
    pub name: &'static str,
    pub passed: bool,
    pub details: String,
}

#[derive(Clone, Debug, Default)]
pub struct VerificationReport {
    pub checks: Vec<VerificationCheck>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    fn record(&mut self, name: &'static str, passed: bool, details: impl Into<String>) {
        self.checks.push(VerificationCheck { name, passed, details: details.into() });
    }
}

/// Canonical organizational seed used by tests and local tooling.
///
/// The dataset models one small site: a general manager at the top, a
/// human-resources chief, two area managers carried by the
/// `Lider Famiq 1` group, and reporting chains of varying depth under
/// them. Loading it into an [`InMemoryDirectory`] gives every routing
/// rule in the crate something realistic to chew on.
pub struct OrgSeedDataset;

impl OrgSeedDataset {
    /// JSON fixture content for the organizational seed.
    pub const JSON: &'static str = include_str!("../../../../config/fixtures/org_seed.json");

    /// Load the seed dataset into the given directory.
    pub fn load(directory: &InMemoryDirectory) -> Result<SeedSummary, SeedError> {
        let file: SeedFile = serde_json::from_str(Self::JSON)?;
        let people = file.people.len();
        let mut area_group_members = 0;
        for person in file.people {
            let entry = person.into_entry();
            if entry.groups.contains(&GroupRef::from(SEED_AREA_MANAGER_GROUP)) {
                area_group_members += 1;
            }
            directory.insert(entry);
        }
        Ok(SeedSummary { people, area_group_members })
    }

    /// Build a fresh directory with the seed already loaded.
    pub fn directory() -> Result<InMemoryDirectory, SeedError> {
        let directory = InMemoryDirectory::new();
        Self::load(&directory)?;
        Ok(directory)
    }

    /// Verify that a directory still honors the seed contract.
    pub fn verify(directory: &InMemoryDirectory) -> Result<VerificationReport, SeedError> {
        let file: SeedFile = serde_json::from_str(Self::JSON)?;
        let mut report = VerificationReport::default();

        report.record(
            "people_present",
            directory.len() >= file.people.len(),
            format!("expected at least {} records, found {}", file.people.len(), directory.len()),
        );

        let general_manager =
            directory.find_by_mail(&MailAddress::from(SEED_GENERAL_MANAGER_MAIL))?;
        report.record(
            "general_manager_resolvable",
            general_manager.is_some(),
            SEED_GENERAL_MANAGER_MAIL,
        );

        let hr_manager = directory.find_by_mail(&MailAddress::from(SEED_HR_MANAGER_MAIL))?;
        report.record("hr_manager_resolvable", hr_manager.is_some(), SEED_HR_MANAGER_MAIL);

        let mut dangling = Vec::new();
        for person in &file.people {
            let Some(manager_key) = person.manager.as_deref() else { continue };
            if directory.find_by_key(manager_key)?.is_none() {
                dangling.push(format!("{} -> {manager_key}", person.key));
            }
        }
        report.record(
            "manager_links_resolvable",
            dangling.is_empty(),
            if dangling.is_empty() {
                "all manager links resolve".to_string()
            } else {
                dangling.join(", ")
            },
        );

        let mut missing_leaders = Vec::new();
        for mail in SEED_AREA_GROUP_MEMBERS {
            let leader = directory.find_by_mail(&MailAddress::from(*mail))?;
            let carried = match leader {
                Some(identity) => directory.is_member_of(&identity, SEED_AREA_MANAGER_GROUP)?,
                None => false,
            };
            if !carried {
                missing_leaders.push((*mail).to_string());
            }
        }
        report.record(
            "area_group_carried",
            missing_leaders.is_empty(),
            if missing_leaders.is_empty() {
                format!("{} members in `{SEED_AREA_MANAGER_GROUP}`", SEED_AREA_GROUP_MEMBERS.len())
            } else {
                missing_leaders.join(", ")
            },
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        OrgSeedDataset, SEED_AREA_MANAGER_GROUP, SEED_GENERAL_MANAGER_MAIL, SEED_HR_MANAGER_MAIL,
    };
    use crate::directory::{DirectoryClient, DirectoryEntry, InMemoryDirectory};
    use crate::domain::identity::MailAddress;

    #[test]
    fn seed_loads_and_passes_its_own_contract() {
        let directory = InMemoryDirectory::new();
        let summary = OrgSeedDataset::load(&directory).expect("seed should load");
        assert_eq!(summary.people, 10);
        assert_eq!(summary.area_group_members, 2);

        let report = OrgSeedDataset::verify(&directory).expect("verification should run");
        assert!(report.passed(), "failed checks: {:?}", report.checks);
    }

    #[test]
    fn seed_load_is_idempotent() {
        let directory = OrgSeedDataset::directory().expect("seed should load");
        let before = directory.len();
        OrgSeedDataset::load(&directory).expect("second load should succeed");
        assert_eq!(directory.len(), before, "reloading must replace, not duplicate");
    }

    #[test]
    fn verification_flags_missing_general_manager() {
        let directory = OrgSeedDataset::directory().expect("seed should load");
        let mut altered = directory
            .find_by_mail(&MailAddress::from(SEED_GENERAL_MANAGER_MAIL))
            .expect("lookup should succeed")
            .expect("general manager is seeded");
        altered.mail = Some(MailAddress::from("gerencia.saliente@famiq.com.ar"));
        // Re-inserting under the same key overwrites the sentinel mail.
        directory.insert(DirectoryEntry::new(altered));

        let report = OrgSeedDataset::verify(&directory).expect("verification should run");
        assert!(!report.passed());
        let failed: Vec<&str> = report
            .checks
            .iter()
            .filter(|check| !check.passed)
            .map(|check| check.name)
            .collect();
        assert!(failed.contains(&"general_manager_resolvable"));
    }

    #[test]
    fn seeded_leaders_carry_the_area_group() {
        let directory = OrgSeedDataset::directory().expect("seed should load");
        let leader = directory
            .find_by_mail(&MailAddress::from("marta.rinaldi@famiq.com.ar"))
            .expect("lookup should succeed")
            .expect("leader is seeded");

        assert!(directory
            .is_member_of(&leader, SEED_AREA_MANAGER_GROUP)
            .expect("membership should resolve"));
        let mail = leader.mail.as_ref().map(|mail| mail.as_str());
        assert_eq!(mail, Some("marta.rinaldi@famiq.com.ar"));
        assert_ne!(mail, Some(SEED_HR_MANAGER_MAIL));
    }
}
