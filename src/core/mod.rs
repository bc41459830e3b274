//! Core module for notification dispatch
//!
//! Notifications are routed by name to observers. Mediators subscribe one
//! observer per interest and dispatch to their declared handler bindings;
//! the controller subscribes one observer per command route.

pub mod binding;
pub mod context;
pub mod controller;
pub mod mediator;
pub mod model;
pub mod notification;
pub mod notifier;
pub mod observer;
pub mod registry_lock;
pub mod view;

// Re-exports for convenience
pub use binding::{Binding, BindingTable, ResolvedBindings, Resolver};
pub use context::{Context, ContextId};
pub use controller::{Command, CommandFactory, Controller, MacroCommand, SubCommandErrors};
pub use mediator::{BoundMediator, Mediator, MediatorCore, ViewComponent, DEFAULT_MEDIATOR_NAME};
pub use model::{DataProxy, Model, Proxy};
pub use notification::{Notification, Payload};
pub use notifier::Notifier;
pub use observer::{NotifyFn, NotifyResult, Observer};
pub use registry_lock::RegistryLock;
pub use view::View;
