use thiserror::Error;

/// Observer failures. These are logged by the pipeline and never surface in
/// an HTTP response.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ObserverError {
    #[error("Observer {observer} failed: {message}")]
    Failed { observer: &'static str, message: String },

    #[error("Observer {observer} timed out after {millis}ms")]
    TimeoutError { observer: &'static str, millis: u128 },
}

impl ObserverError {
    pub fn failed(observer: &'static str, message: impl Into<String>) -> Self {
        ObserverError::Failed {
            observer,
            message: message.into(),
        }
    }
}
