pub mod approvals;
pub mod audit;
pub mod config;
pub mod directory;
pub mod domain;
pub mod errors;
pub mod hierarchy;
pub mod logging;
pub mod membership;
pub mod roles;

pub use approvals::ApprovalChainBuilder;
pub use audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink,
};
pub use config::{
    AppConfig, ConfigError, ConfigOverrides, DirectoryConfig, LoadOptions, LogFormat,
    LoggingConfig, RolesConfig,
};
pub use directory::fixtures::{OrgSeedDataset, SeedError, SeedSummary, VerificationReport};
pub use directory::{DirectoryClient, DirectoryEntry, InMemoryDirectory, MatchMode};
pub use domain::approval::ApprovalChain;
pub use domain::group::GroupRef;
pub use domain::identity::{Identity, MailAddress, UNASSIGNED_LABEL};
pub use errors::DirectoryError;
pub use hierarchy::{HierarchyResolver, DEFAULT_MAX_HOPS};
pub use membership::GroupMembership;
pub use roles::{RoleClassifier, RoleSentinels, DEFAULT_AREA_MANAGER_GROUP};
