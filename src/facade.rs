//! Facade: the single entry point to the Model, View and Controller.
//!
//! A facade is an ordinary value. Applications create one with
//! [`Facade::new`] and hand the `Arc` to whatever needs it; there is no
//! process-wide instance.
//!
//! The facade's Model, View and Controller share one [`RegistryLock`]. A
//! facade can be shared between threads; registry changes and broadcasts from
//! different threads then run one at a time.

use crate::config::FacadeConfig;
use crate::core::{
    Command, CommandFactory, Context, Controller, Mediator, Model, Notification, Payload, Proxy,
    RegistryLock, View,
};
use crate::error::MvcResult;
use std::sync::{Arc, Weak};

pub struct Facade {
    model: Model,
    view: Arc<View>,
    controller: Arc<Controller>,
    context: Context,
    config: FacadeConfig,
    me: Weak<Facade>,
}

impl Facade {
    pub fn new(config: FacadeConfig) -> Arc<Self> {
        let lock = RegistryLock::new();
        let view = Arc::new(View::with_lock(&config, lock.clone()));
        let controller = Controller::new(view.clone(), &config);
        let facade = Arc::new_cyclic(|me| Self {
            model: Model::with_lock(&config, lock),
            view,
            controller,
            context: Context::new("Facade"),
            config,
            me: me.clone(),
        });
        facade.controller.attach(Arc::downgrade(&facade));
        log::debug!("Facade created with {:?}", facade.config);
        facade
    }

    pub fn config(&self) -> &FacadeConfig {
        &self.config
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Lock serializing this facade's registries.
    pub fn registry_lock(&self) -> &RegistryLock {
        self.view.registry_lock()
    }

    // Notifications

    /// Build a notification sent by the facade itself and broadcast it.
    pub fn send_notification(
        &self,
        name: impl Into<String>,
        body: Option<Payload>,
        kind: Option<Payload>,
    ) -> MvcResult<()> {
        self.send_notification_from(self.context.clone(), name, body, kind)
    }

    /// Build a notification on behalf of `sender` and broadcast it.
    pub fn send_notification_from(
        &self,
        sender: Context,
        name: impl Into<String>,
        body: Option<Payload>,
        kind: Option<Payload>,
    ) -> MvcResult<()> {
        let mut note = Notification::new(name)?
            .with_sender(sender)
            .with_payloads(body, kind);
        self.notify_observers(&mut note)
    }

    /// Broadcast an already built notification.
    pub fn notify_observers(&self, note: &mut Notification) -> MvcResult<()> {
        log::trace!("Sending {}", note.name());
        self.view.notify_observers(note)
    }

    // Mediators

    /// Register a mediator and attach its notifier to this facade.
    pub fn register_mediator(&self, mediator: Arc<dyn Mediator>) -> MvcResult<()> {
        let _serial = self.registry_lock().enter();
        mediator.notifier().attach(self.me.clone());
        let result = self.view.register_mediator(mediator.clone());
        let registered = self
            .view
            .retrieve_mediator(mediator.mediator_name())
            .is_some_and(|current| current.context().is_same(mediator.context()));
        if !registered {
            mediator.notifier().detach();
        }
        result
    }

    pub fn retrieve_mediator(&self, name: &str) -> Option<Arc<dyn Mediator>> {
        self.view.retrieve_mediator(name)
    }

    pub fn remove_mediator(&self, name: &str) -> Option<Arc<dyn Mediator>> {
        let _serial = self.registry_lock().enter();
        let mediator = self.view.remove_mediator(name)?;
        mediator.notifier().detach();
        Some(mediator)
    }

    pub fn has_mediator(&self, name: &str) -> bool {
        self.view.has_mediator(name)
    }

    // Proxies

    pub fn register_proxy(&self, proxy: Arc<dyn Proxy>) -> MvcResult<()> {
        let _serial = self.registry_lock().enter();
        if let Some(notifier) = proxy.notifier() {
            notifier.attach(self.me.clone());
        }
        let result = self.model.register_proxy(proxy.clone());
        if let Some(notifier) = proxy.notifier() {
            let registered = self
                .model
                .retrieve_proxy(proxy.proxy_name())
                .and_then(|current| current.notifier().map(|n| n.context().is_same(notifier.context())))
                .unwrap_or(false);
            if !registered {
                notifier.detach();
            }
        }
        result
    }

    pub fn retrieve_proxy(&self, name: &str) -> Option<Arc<dyn Proxy>> {
        self.model.retrieve_proxy(name)
    }

    pub fn retrieve_proxy_as<P: Proxy>(&self, name: &str) -> Option<Arc<P>> {
        self.model.retrieve_proxy_as::<P>(name)
    }

    pub fn remove_proxy(&self, name: &str) -> Option<Arc<dyn Proxy>> {
        let _serial = self.registry_lock().enter();
        let proxy = self.model.remove_proxy(name)?;
        if let Some(notifier) = proxy.notifier() {
            notifier.detach();
        }
        Some(proxy)
    }

    pub fn has_proxy(&self, name: &str) -> bool {
        self.model.has_proxy(name)
    }

    // Commands

    pub fn register_command<C, F>(&self, name: impl Into<String>, factory: F) -> MvcResult<()>
    where
        C: Command + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.controller.register_command(name, factory)
    }

    pub fn register_command_factory(
        &self,
        name: impl Into<String>,
        factory: CommandFactory,
    ) -> MvcResult<()> {
        self.controller.register_command_factory(name, factory)
    }

    pub fn remove_command(&self, name: &str) -> bool {
        self.controller.remove_command(name)
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.controller.has_command(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BindingTable, BoundMediator, DataProxy, MediatorCore};
    use crate::error::{HandlerResult, MvcError};
    use std::sync::Mutex;

    struct Echo {
        core: MediatorCore,
        seen: Mutex<Vec<String>>,
    }

    impl Echo {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                core: MediatorCore::new(name),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn on_ping(&self, note: &mut Notification) -> HandlerResult {
            let sender = note.sender().map(|s| s.label().to_string()).unwrap_or_default();
            self.seen.lock().unwrap().push(sender);
            self.core.notifier().send_notification("Pong", None, None)?;
            Ok(())
        }

        fn on_pong(&self, note: &mut Notification) -> HandlerResult {
            let sender = note.sender().map(|s| s.label().to_string()).unwrap_or_default();
            self.seen.lock().unwrap().push(format!("pong from {}", sender));
            Ok(())
        }
    }

    impl BoundMediator for Echo {
        fn core(&self) -> &MediatorCore {
            &self.core
        }

        fn bindings() -> BindingTable<Self> {
            BindingTable::new("Echo")
                .bind("Ping", "on_ping", Self::on_ping)
                .bind("Pong", "on_pong", Self::on_pong)
        }
    }

    #[test]
    fn test_send_notification_sets_facade_sender() {
        let facade = Facade::new(FacadeConfig::default());
        let echo = Echo::new("Echo");
        facade.register_mediator(echo.clone()).unwrap();

        facade
            .send_notification("Ping", Some(Payload::new(1i32)), None)
            .unwrap();

        let seen = echo.seen.lock().unwrap();
        assert_eq!(*seen, vec!["Facade".to_string(), "pong from Echo".to_string()]);
    }

    #[test]
    fn test_empty_name_rejected() {
        let facade = Facade::new(FacadeConfig::default());
        assert!(matches!(
            facade.send_notification("", None, None),
            Err(MvcError::EmptyNotificationName)
        ));
    }

    #[test]
    fn test_mediator_notifier_lifecycle() {
        let facade = Facade::new(FacadeConfig::default());
        let echo = Echo::new("Echo");
        facade.register_mediator(echo.clone()).unwrap();
        assert!(echo.core().notifier().is_attached());
        assert!(facade.has_mediator("Echo"));

        let duplicate = Echo::new("Echo");
        assert!(facade.register_mediator(duplicate.clone()).is_err());
        assert!(!duplicate.core().notifier().is_attached());

        facade.remove_mediator("Echo").unwrap();
        assert!(!echo.core().notifier().is_attached());
        assert!(facade.retrieve_mediator("Echo").is_none());
    }

    #[test]
    fn test_registries_share_one_lock() {
        let facade = Facade::new(FacadeConfig::default());
        assert!(facade.model().registry_lock().is_shared_with(facade.registry_lock()));
        assert!(facade.view().registry_lock().is_shared_with(facade.registry_lock()));
        assert!(!facade.registry_lock().is_locked());
    }

    #[test]
    fn test_proxy_delegation() {
        let facade = Facade::new(FacadeConfig::default());
        let proxy = Arc::new(DataProxy::new("Count", 0u32));
        facade.register_proxy(proxy.clone()).unwrap();

        assert!(proxy.notifier().is_some_and(|n| n.is_attached()));
        assert!(facade.has_proxy("Count"));
        let typed = facade.retrieve_proxy_as::<DataProxy<u32>>("Count").unwrap();
        typed.set_data(5);
        assert_eq!(*proxy.data(), 5);

        assert!(facade.remove_proxy("Count").is_some());
        assert!(!facade.has_proxy("Count"));
        assert!(facade.retrieve_proxy("Count").is_none());
    }
}
