//! Controller: routes notifications to commands.
//!
//! A command is built fresh by its factory for every notification it handles
//! and is executed exactly once.

use crate::config::{DuplicatePolicy, FacadeConfig};
use crate::core::context::Context;
use crate::core::notification::Notification;
use crate::core::observer::{NotifyResult, Observer};
use crate::core::registry_lock::RegistryLock;
use crate::core::view::View;
use crate::error::{HandlerError, HandlerFailure, HandlerResult, MvcError, MvcResult};
use crate::facade::Facade;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

/// A one-shot action executed in response to a notification.
pub trait Command: Send + Sync {
    fn execute(&self, facade: &Facade, note: &mut Notification) -> HandlerResult;

    /// Name used in failure reports and logs.
    fn command_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Builds a fresh command for each execution
pub type CommandFactory = Arc<dyn Fn() -> Box<dyn Command> + Send + Sync>;

fn boxed_factory<C, F>(factory: F) -> CommandFactory
where
    C: Command + 'static,
    F: Fn() -> C + Send + Sync + 'static,
{
    Arc::new(move || Box::new(factory()) as Box<dyn Command>)
}

pub struct Controller {
    view: Arc<View>,
    lock: RegistryLock,
    commands: Mutex<HashMap<String, CommandFactory>>,
    context: Context,
    facade: RwLock<Weak<Facade>>,
    me: Weak<Controller>,
    duplicate_policy: DuplicatePolicy,
}

impl Controller {
    pub fn new(view: Arc<View>, config: &FacadeConfig) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            lock: view.registry_lock().clone(),
            view,
            commands: Mutex::new(HashMap::new()),
            context: Context::new("Controller"),
            facade: RwLock::new(Weak::new()),
            me: me.clone(),
            duplicate_policy: config.duplicate_policy,
        })
    }

    /// Link the facade handed to executing commands.
    pub fn attach(&self, facade: Weak<Facade>) {
        *self.facade.write().unwrap_or_else(PoisonError::into_inner) = facade;
    }

    fn commands(&self) -> MutexGuard<'_, HashMap<String, CommandFactory>> {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Context owning the controller's observers in the View.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Route `name` to commands built by `factory`.
    pub fn register_command<C, F>(&self, name: impl Into<String>, factory: F) -> MvcResult<()>
    where
        C: Command + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.register_command_factory(name, boxed_factory(factory))
    }

    pub fn register_command_factory(
        &self,
        name: impl Into<String>,
        factory: CommandFactory,
    ) -> MvcResult<()> {
        let name = name.into();
        // The route and its observer change together
        let _serial = self.lock.enter();
        {
            let mut commands = self.commands();
            if commands.contains_key(&name) {
                return match self.duplicate_policy {
                    DuplicatePolicy::Error => Err(MvcError::DuplicateCommand(name)),
                    DuplicatePolicy::Ignore => {
                        log::debug!("Command for {} already registered, ignoring", name);
                        Ok(())
                    }
                };
            }
            commands.insert(name.clone(), factory);
        }

        let me = self.me.clone();
        self.view.register_observer(
            name.clone(),
            Observer::from_fn(self.context.clone(), move |note| match me.upgrade() {
                Some(controller) => controller.execute_command(note),
                None => Ok(()),
            }),
        );
        log::debug!("Registered command for {}", name);
        Ok(())
    }

    /// Build and run the command registered for `note`'s name, if any.
    pub fn execute_command(&self, note: &mut Notification) -> NotifyResult {
        let _serial = self.lock.enter();
        let factory = self.commands().get(note.name()).cloned();
        let Some(factory) = factory else {
            return Ok(());
        };

        let command = factory();
        let failure = |source: HandlerError, note: &Notification| {
            vec![HandlerFailure::new(
                self.context.label(),
                command.command_name(),
                note.name(),
                source,
            )]
        };

        let facade = self
            .facade
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade();
        let Some(facade) = facade else {
            log::warn!("Command for {} skipped: no facade attached", note.name());
            return Err(failure("controller is not attached to a facade".into(), note));
        };

        log::trace!("Executing {} for {}", command.command_name(), note.name());
        command.execute(&facade, note).map_err(|source| {
            log::warn!(
                "Command {} failed on {}: {}",
                command.command_name(),
                note.name(),
                source
            );
            failure(source, note)
        })
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands().contains_key(name)
    }

    /// Drop the route for `name` and the controller's observer for it.
    pub fn remove_command(&self, name: &str) -> bool {
        let _serial = self.lock.enter();
        if self.commands().remove(name).is_none() {
            return false;
        }
        self.view.remove_observer(name, &self.context);
        log::debug!("Removed command for {}", name);
        true
    }
}

/// Errors of the sub-commands of a [`MacroCommand`]
#[derive(Debug)]
pub struct SubCommandErrors(pub Vec<(String, HandlerError)>);

impl fmt::Display for SubCommandErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sub-command(s) failed", self.0.len())?;
        for (name, error) in &self.0 {
            write!(f, "; {}: {}", name, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for SubCommandErrors {}

/// A command that runs a fixed list of sub-commands in order.
///
/// Each sub-command is built fresh from its factory. A failing sub-command
/// does not stop the ones after it.
#[derive(Default)]
pub struct MacroCommand {
    sub_commands: Vec<CommandFactory>,
}

impl MacroCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<C, F>(mut self, factory: F) -> Self
    where
        C: Command + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.sub_commands.push(boxed_factory(factory));
        self
    }

    pub fn len(&self) -> usize {
        self.sub_commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_commands.is_empty()
    }
}

impl Command for MacroCommand {
    fn execute(&self, facade: &Facade, note: &mut Notification) -> HandlerResult {
        let mut errors = Vec::new();
        for factory in &self.sub_commands {
            let command = factory();
            if let Err(error) = command.execute(facade, note) {
                errors.push((command.command_name().to_string(), error));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Box::new(SubCommandErrors(errors)))
        }
    }

    fn command_name(&self) -> &str {
        "MacroCommand"
    }
}
