use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::identity::MailAddress;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditCategory {
    Hierarchy,
    Routing,
    Directory,
    System,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Resolved,
    Absent,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub subject_mail: Option<MailAddress>,
    pub correlation_id: String,
    pub actor: String,
}

impl AuditContext {
    pub fn new(
        subject_mail: Option<MailAddress>,
        correlation_id: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self { subject_mail, correlation_id: correlation_id.into(), actor: actor.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub subject_mail: Option<MailAddress>,
    pub correlation_id: String,
    pub event_type: String,
    pub category: AuditCategory,
    pub actor: String,
    pub outcome: AuditOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        subject_mail: Option<MailAddress>,
        correlation_id: impl Into<String>,
        event_type: impl Into<String>,
        category: AuditCategory,
        actor: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            subject_mail,
            correlation_id: correlation_id.into(),
            event_type: event_type.into(),
            category,
            actor: actor.into(),
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
    use crate::domain::identity::MailAddress;

    #[test]
    fn sink_keeps_subject_and_correlation_on_recorded_events() {
        let sink = InMemoryAuditSink::default();
        sink.emit(
            AuditEvent::new(
                Some(MailAddress::from("pablo.ortiz@famiq.com.ar")),
                "resolve-8f21",
                "routing.first_approver_resolved",
                AuditCategory::Routing,
                "approval-chain-builder",
                AuditOutcome::Resolved,
            )
            .with_metadata("approver", "diego.suarez@famiq.com.ar")
            .with_metadata("reason", "manager_link"),
        );

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].correlation_id, "resolve-8f21");
        assert_eq!(
            events[0].subject_mail.as_ref().map(|mail| mail.as_str()),
            Some("pablo.ortiz@famiq.com.ar")
        );
        assert_eq!(events[0].outcome, AuditOutcome::Resolved);
        assert!(events[0].metadata.contains_key("reason"));
    }

    #[test]
    fn event_ids_are_unique_per_event() {
        let first = AuditEvent::new(
            None,
            "req-1",
            "hierarchy.area_manager_absent",
            AuditCategory::Hierarchy,
            "hierarchy-resolver",
            AuditOutcome::Absent,
        );
        let second = AuditEvent::new(
            None,
            "req-1",
            "hierarchy.area_manager_absent",
            AuditCategory::Hierarchy,
            "hierarchy-resolver",
            AuditOutcome::Absent,
        );
        assert_ne!(first.event_id, second.event_id);
    }
}
