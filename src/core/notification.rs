//! Notification and payload types.

use crate::core::context::Context;
use crate::error::{MvcError, MvcResult};
use std::any::{type_name, Any};
use std::fmt;

/// Type-erased notification body or kind.
///
/// The dispatch core never looks inside a payload. Handlers check the type and
/// downcast explicitly.
pub struct Payload {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Payload {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut::<T>()
    }

    /// Take the value back out, or return the payload unchanged on a type mismatch.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self { value, type_name }),
        }
    }

    /// Name of the stored type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn describe(&self) -> String {
        if let Some(text) = self.downcast_ref::<String>() {
            format!("{:?}", text)
        } else if let Some(text) = self.downcast_ref::<&'static str>() {
            format!("{:?}", text)
        } else if let Some(value) = self.downcast_ref::<i64>() {
            value.to_string()
        } else if let Some(value) = self.downcast_ref::<i32>() {
            value.to_string()
        } else if let Some(value) = self.downcast_ref::<bool>() {
            value.to_string()
        } else {
            format!("<{}>", self.type_name)
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// A named event broadcast to every observer interested in its name.
///
/// `name` and `sender` are fixed at construction. `body` and `kind` can be
/// replaced by an observer; observers later in the same fan-out see the change.
#[derive(Debug)]
pub struct Notification {
    name: String,
    sender: Option<Context>,
    body: Option<Payload>,
    kind: Option<Payload>,
}

impl Notification {
    /// Create a notification with no body, kind or sender.
    pub fn new(name: impl Into<String>) -> MvcResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(MvcError::EmptyNotificationName);
        }
        Ok(Self {
            name,
            sender: None,
            body: None,
            kind: None,
        })
    }

    pub fn with_body<T: Any + Send + Sync>(mut self, body: T) -> Self {
        self.body = Some(Payload::new(body));
        self
    }

    pub fn with_kind<T: Any + Send + Sync>(mut self, kind: T) -> Self {
        self.kind = Some(Payload::new(kind));
        self
    }

    pub fn with_sender(mut self, sender: Context) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Attach already-erased body and kind, as handed over by the facade.
    pub(crate) fn with_payloads(mut self, body: Option<Payload>, kind: Option<Payload>) -> Self {
        self.body = body;
        self.kind = kind;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sender(&self) -> Option<&Context> {
        self.sender.as_ref()
    }

    pub fn body(&self) -> Option<&Payload> {
        self.body.as_ref()
    }

    pub fn kind(&self) -> Option<&Payload> {
        self.kind.as_ref()
    }

    /// Typed view of the body, `None` if absent or of another type.
    pub fn body_as<T: Any>(&self) -> Option<&T> {
        self.body.as_ref().and_then(Payload::downcast_ref::<T>)
    }

    pub fn body_as_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.body.as_mut().and_then(Payload::downcast_mut::<T>)
    }

    /// Typed view of the kind, `None` if absent or of another type.
    pub fn kind_as<T: Any>(&self) -> Option<&T> {
        self.kind.as_ref().and_then(Payload::downcast_ref::<T>)
    }

    pub fn set_body<T: Any + Send + Sync>(&mut self, body: T) {
        self.body = Some(Payload::new(body));
    }

    pub fn set_kind<T: Any + Send + Sync>(&mut self, kind: T) {
        self.kind = Some(Payload::new(kind));
    }

    pub fn clear_body(&mut self) {
        self.body = None;
    }

    pub fn take_body(&mut self) -> Option<Payload> {
        self.body.take()
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Notification Name: {}", self.name)?;
        match &self.body {
            Some(body) => write!(f, "\nBody: {:?}", body)?,
            None => write!(f, "\nBody: null")?,
        }
        match &self.kind {
            Some(kind) => write!(f, "\nType: {:?}", kind)?,
            None => write!(f, "\nType: null")?,
        }
        match &self.sender {
            Some(sender) => write!(f, "\nSender: {}", sender),
            None => write!(f, "\nSender: null"),
        }
    }
}
