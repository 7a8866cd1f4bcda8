// Post-write observer pipeline. Observers run after the store commits and
// can never affect the response of the request that triggered them.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::config::AuditConfig;
use crate::observer::error::ObserverError;
use crate::observer::event::AuditEvent;
use crate::observer::implementations::AuditLogObserver;
use crate::observer::traits::Observer;

pub struct ObserverPipeline {
    observers: Vec<Arc<dyn Observer>>,
    default_timeout: Duration,
}

impl ObserverPipeline {
    /// Create a pipeline with an empty registry
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            observers: Vec::new(),
            default_timeout,
        }
    }

    /// Pipeline with the observers enabled by configuration
    pub fn from_config(config: &AuditConfig) -> Self {
        let mut pipeline = Self::new(Duration::from_millis(config.observer_timeout_ms));
        if config.enabled {
            pipeline.register_observer(Arc::new(AuditLogObserver));
        }
        pipeline
    }

    pub fn register_observer(&mut self, observer: Arc<dyn Observer>) {
        tracing::debug!("Registered observer '{}'", observer.name());
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Notify observers on a background task and return immediately
    pub fn dispatch(self: &Arc<Self>, event: AuditEvent) {
        if self.observers.is_empty() {
            return;
        }
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            pipeline.notify(&event).await;
        });
    }

    /// Run every applicable observer in registration order.
    ///
    /// Failures and timeouts are logged at ERROR and returned for
    /// inspection; they never stop later observers.
    pub async fn notify(&self, event: &AuditEvent) -> Vec<ObserverError> {
        let mut errors = Vec::new();

        for observer in &self.observers {
            if !observer.applies_to_operation(event.operation) {
                tracing::trace!(
                    "Observer {} skipped - doesn't apply to operation {}",
                    observer.name(),
                    event.operation
                );
                continue;
            }

            if !observer.applies_to_resource(event.resource) {
                tracing::trace!(
                    "Observer {} skipped - doesn't apply to resource {}",
                    observer.name(),
                    event.resource
                );
                continue;
            }

            let limit = observer.timeout().unwrap_or(self.default_timeout);
            let observer_start = Instant::now();

            // Execute with timeout protection
            let result = timeout(limit, observer.execute(event)).await;
            let execution_time = observer_start.elapsed();

            match result {
                Ok(Ok(())) => {
                    tracing::debug!(
                        "Observer: {} completed successfully in {:?}",
                        observer.name(),
                        execution_time
                    );
                }
                Ok(Err(error)) => {
                    tracing::error!(
                        "Observer: {} failed in {:?}: {}",
                        observer.name(),
                        execution_time,
                        error
                    );
                    errors.push(error);
                }
                Err(_elapsed) => {
                    let error = ObserverError::TimeoutError {
                        observer: observer.name(),
                        millis: limit.as_millis(),
                    };
                    tracing::error!("{}", error);
                    errors.push(error);
                }
            }
        }

        errors
    }
}

impl Default for ObserverPipeline {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::traits::Operation;
    use crate::policy::Actor;
    use crate::resources::ResourceKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    #[async_trait]
    impl Observer for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn applies_to_resource(&self, kind: ResourceKind) -> bool {
            kind != ResourceKind::Category
        }

        async fn execute(&self, _event: &AuditEvent) -> Result<(), ObserverError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Observer for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn execute(&self, _event: &AuditEvent) -> Result<(), ObserverError> {
            Err(ObserverError::failed("failing", "sink unavailable"))
        }
    }

    struct Slow;

    #[async_trait]
    impl Observer for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn timeout(&self) -> Option<Duration> {
            Some(Duration::from_millis(10))
        }

        async fn execute(&self, _event: &AuditEvent) -> Result<(), ObserverError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    fn event(resource: ResourceKind) -> AuditEvent {
        AuditEvent::new(Operation::Create, resource, 1, &Actor::user(2, "alice"), "Hello")
    }

    #[tokio::test]
    async fn failures_do_not_stop_later_observers() {
        let counting = Arc::new(Counting(AtomicUsize::new(0)));
        let mut pipeline = ObserverPipeline::default();
        pipeline.register_observer(Arc::new(Failing));
        pipeline.register_observer(Arc::new(Slow));
        pipeline.register_observer(counting.clone());

        let errors = pipeline.notify(&event(ResourceKind::Post)).await;
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[1], ObserverError::TimeoutError { observer: "slow", .. }));
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn applicability_is_checked() {
        let counting = Arc::new(Counting(AtomicUsize::new(0)));
        let mut pipeline = ObserverPipeline::default();
        pipeline.register_observer(counting.clone());

        assert!(pipeline.notify(&event(ResourceKind::Category)).await.is_empty());
        assert_eq!(counting.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn disabled_audit_registers_nothing() {
        let config = AuditConfig {
            enabled: false,
            observer_timeout_ms: 100,
        };
        assert!(ObserverPipeline::from_config(&config).is_empty());
    }
}
