use async_trait::async_trait;

use crate::observer::error::ObserverError;
use crate::observer::event::AuditEvent;
use crate::observer::traits::Observer;

/// Writes one structured record per mutation on the `blog::audit` target
pub struct AuditLogObserver;

#[async_trait]
impl Observer for AuditLogObserver {
    fn name(&self) -> &'static str {
        "audit_log"
    }

    async fn execute(&self, event: &AuditEvent) -> Result<(), ObserverError> {
        tracing::info!(
            target: "blog::audit",
            event_kind = %event.operation,
            resource_kind = %event.resource,
            resource_id = event.resource_id,
            actor = %event.actor,
            label = %event.label,
            at = %event.at.to_rfc3339(),
            "{} {} {} by {}",
            event.operation,
            event.resource,
            event.resource_id,
            event.actor
        );
        Ok(())
    }
}
