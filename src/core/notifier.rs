//! Notifier: lets mediators, proxies and other components send notifications
//! through the facade they are registered with.

use crate::core::context::Context;
use crate::core::notification::Payload;
use crate::error::{MvcError, MvcResult};
use crate::facade::Facade;
use std::sync::{Arc, PoisonError, RwLock, Weak};

pub struct Notifier {
    context: Context,
    facade: RwLock<Weak<Facade>>,
}

impl Notifier {
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self {
            context: Context::new(label),
            facade: RwLock::new(Weak::new()),
        }
    }

    /// Identity used as the sender of outgoing notifications.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Link this notifier to a facade. Called by the facade at registration.
    pub fn attach(&self, facade: Weak<Facade>) {
        *self.facade.write().unwrap_or_else(PoisonError::into_inner) = facade;
    }

    pub fn detach(&self) {
        *self.facade.write().unwrap_or_else(PoisonError::into_inner) = Weak::new();
    }

    pub fn facade(&self) -> Option<Arc<Facade>> {
        self.facade
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade()
    }

    pub fn is_attached(&self) -> bool {
        self.facade().is_some()
    }

    /// Build and broadcast a notification with this notifier as sender.
    pub fn send_notification(
        &self,
        name: impl Into<String>,
        body: Option<Payload>,
        kind: Option<Payload>,
    ) -> MvcResult<()> {
        let facade = self
            .facade()
            .ok_or_else(|| MvcError::NotifierDetached(self.context.label().to_string()))?;
        facade.send_notification_from(self.context.clone(), name, body, kind)
    }
}
