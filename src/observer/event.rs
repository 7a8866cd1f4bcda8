use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::observer::traits::Operation;
use crate::policy::Actor;
use crate::resources::ResourceKind;

/// One committed mutation, as seen by observers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub operation: Operation,
    pub resource: ResourceKind,
    pub resource_id: i64,
    /// `username#id`, or `anonymous`
    pub actor: String,
    pub label: String,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        operation: Operation,
        resource: ResourceKind,
        resource_id: i64,
        actor: &Actor,
        label: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            resource,
            resource_id,
            actor: actor.identity(),
            label: label.into(),
            at: Utc::now(),
        }
    }
}
