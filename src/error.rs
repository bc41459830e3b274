//! Error types shared by the Model, View and Controller registries.

use crate::config::ConfigError;
use std::fmt;

/// Error returned by a notification handler or a command.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for notification handlers and commands
pub type HandlerResult = Result<(), HandlerError>;

/// Result type for registry and facade operations
pub type MvcResult<T> = Result<T, MvcError>;

/// Framework error types
#[derive(Debug, thiserror::Error)]
pub enum MvcError {
    #[error("Mediator already registered: {0}")]
    DuplicateMediator(String),

    #[error("Proxy already registered: {0}")]
    DuplicateProxy(String),

    #[error("Command already registered for notification: {0}")]
    DuplicateCommand(String),

    #[error("Notification name must not be empty")]
    EmptyNotificationName,

    #[error("Notifier '{0}' is not attached to a facade")]
    NotifierDetached(String),

    #[error("{} handler(s) failed: {}", .0.len(), summarize(.0))]
    HandlerFailures(Vec<HandlerFailure>),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl MvcError {
    /// Handler failures carried by this error, empty for every other variant.
    pub fn failures(&self) -> &[HandlerFailure] {
        match self {
            MvcError::HandlerFailures(failures) => failures,
            _ => &[],
        }
    }
}

/// A single failed handler invocation, recorded during a fan-out.
#[derive(Debug)]
pub struct HandlerFailure {
    /// Label of the context (mediator, controller...) that owned the handler
    pub context: String,
    /// Name of the handler method or command that failed
    pub method: String,
    /// Name of the notification being delivered
    pub notification: String,
    /// The error raised by the handler
    pub source: HandlerError,
}

impl HandlerFailure {
    pub fn new(
        context: impl Into<String>,
        method: impl Into<String>,
        notification: impl Into<String>,
        source: HandlerError,
    ) -> Self {
        Self {
            context: context.into(),
            method: method.into(),
            notification: notification.into(),
            source,
        }
    }
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{} on '{}': {}",
            self.context, self.method, self.notification, self.source
        )
    }
}

fn summarize(failures: &[HandlerFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
