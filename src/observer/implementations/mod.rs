// Observer implementations registered by configuration

pub mod audit_log;

pub use audit_log::AuditLogObserver;
