//! Mediators: named components that react to notifications through their
//! declared handler bindings.

use crate::core::binding::{BindingTable, Resolver};
use crate::core::context::Context;
use crate::core::notification::Notification;
use crate::core::notifier::Notifier;
use crate::core::observer::NotifyResult;
use crate::error::HandlerFailure;
use std::any::Any;
use std::sync::{Arc, PoisonError, RwLock};

/// Name given to a mediator constructed without one
pub const DEFAULT_MEDIATOR_NAME: &str = "Mediator";

/// Opaque reference to the UI element a mediator manages
pub type ViewComponent = Arc<dyn Any + Send + Sync>;

/// State every mediator carries: its name, identity and view component.
pub struct MediatorCore {
    name: String,
    notifier: Notifier,
    view_component: RwLock<Option<ViewComponent>>,
}

impl MediatorCore {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            notifier: Notifier::new(name.as_str()),
            name,
            view_component: RwLock::new(None),
        }
    }

    pub fn with_view_component<T: Any + Send + Sync>(self, component: T) -> Self {
        self.set_view_component(Some(Arc::new(component)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &Context {
        self.notifier.context()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn view_component(&self) -> Option<ViewComponent> {
        self.view_component
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Typed view component, `None` if unset or of another type.
    pub fn view_component_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.view_component()
            .and_then(|component| component.downcast::<T>().ok())
    }

    pub fn set_view_component(&self, component: Option<ViewComponent>) {
        *self
            .view_component
            .write()
            .unwrap_or_else(PoisonError::into_inner) = component;
    }
}

impl Default for MediatorCore {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIATOR_NAME)
    }
}

/// A mediator as seen by the View.
///
/// Most mediators implement [`BoundMediator`] instead and get this trait
/// through the blanket impl.
pub trait Mediator: Send + Sync {
    fn mediator_name(&self) -> &str;

    /// Identity used to find this mediator's observers on removal.
    fn context(&self) -> &Context;

    fn notifier(&self) -> &Notifier;

    /// Notification names this mediator wants to receive.
    fn list_notification_interests(&self) -> Vec<String>;

    fn handle_notification(&self, note: &mut Notification) -> NotifyResult;

    fn view_component(&self) -> Option<ViewComponent>;

    fn set_view_component(&self, component: Option<ViewComponent>);

    /// Called by the View once the mediator and its observers are registered.
    fn on_register(&self) {}

    /// Called by the View before the mediator and its observers are removed.
    fn on_remove(&self) {}
}

/// A mediator whose handlers are declared in a static [`BindingTable`].
///
/// A derived mediator embeds its base and builds on the base's table:
///
/// ```
/// use puremvc::core::{BindingTable, BoundMediator, MediatorCore, Notification};
/// use puremvc::error::HandlerResult;
///
/// struct Base { core: MediatorCore }
///
/// impl Base {
///     fn on_refresh(&self, _note: &mut Notification) -> HandlerResult { Ok(()) }
/// }
///
/// impl BoundMediator for Base {
///     fn core(&self) -> &MediatorCore { &self.core }
///     fn bindings() -> BindingTable<Self> {
///         BindingTable::new("Base").bind("Refresh", "on_refresh", Self::on_refresh)
///     }
/// }
///
/// struct Derived { base: Base }
///
/// impl Derived {
///     fn on_refresh_all(&self, _note: &mut Notification) -> HandlerResult { Ok(()) }
/// }
///
/// impl BoundMediator for Derived {
///     fn core(&self) -> &MediatorCore { self.base.core() }
///     fn bindings() -> BindingTable<Self> {
///         Base::bindings()
///             .lift(|derived: &Derived| &derived.base)
///             .derive("Derived")
///             .bind("Refresh", "on_refresh_all", Self::on_refresh_all)
///     }
/// }
/// ```
pub trait BoundMediator: Send + Sync + Sized + 'static {
    fn core(&self) -> &MediatorCore;

    /// Handler declarations for this type, read once per type.
    fn bindings() -> BindingTable<Self>;

    fn on_register(&self) {}

    fn on_remove(&self) {}
}

impl<M: BoundMediator> Mediator for M {
    fn mediator_name(&self) -> &str {
        self.core().name()
    }

    fn context(&self) -> &Context {
        self.core().context()
    }

    fn notifier(&self) -> &Notifier {
        self.core().notifier()
    }

    fn list_notification_interests(&self) -> Vec<String> {
        Resolver::interests::<M>()
    }

    fn handle_notification(&self, note: &mut Notification) -> NotifyResult {
        let resolved = Resolver::bindings_for::<M>();
        let handlers = resolved.handlers_for(note.name());
        if handlers.is_empty() {
            log::trace!("{} has no handler for {}", self.core().name(), note.name());
            return Ok(());
        }

        let mut failures = Vec::new();
        for binding in handlers {
            log::trace!(
                "Dispatching {} to {}::{}",
                note.name(),
                binding.level(),
                binding.method()
            );
            if let Err(source) = binding.invoke(self, note) {
                log::warn!(
                    "Handler {}::{} of mediator {} failed on {}: {}",
                    binding.level(),
                    binding.method(),
                    self.core().name(),
                    note.name(),
                    source
                );
                failures.push(HandlerFailure::new(
                    self.core().name(),
                    binding.method(),
                    note.name(),
                    source,
                ));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    fn view_component(&self) -> Option<ViewComponent> {
        self.core().view_component()
    }

    fn set_view_component(&self, component: Option<ViewComponent>) {
        self.core().set_view_component(component)
    }

    fn on_register(&self) {
        <M as BoundMediator>::on_register(self)
    }

    fn on_remove(&self) {
        <M as BoundMediator>::on_remove(self)
    }
}
