use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::observer::error::ObserverError;
use crate::observer::event::AuditEvent;
use crate::resources::ResourceKind;

/// Mutations that notify observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Post-write observer with metadata and applicability checks
#[async_trait]
pub trait Observer: Send + Sync {
    /// Observer name for logging and debugging
    fn name(&self) -> &'static str;

    fn applies_to_operation(&self, _op: Operation) -> bool {
        true
    }

    fn applies_to_resource(&self, _kind: ResourceKind) -> bool {
        true
    }

    /// Per-observer timeout; `None` uses the pipeline default
    fn timeout(&self) -> Option<Duration> {
        None
    }

    async fn execute(&self, event: &AuditEvent) -> Result<(), ObserverError>;
}
