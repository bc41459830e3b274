//! A small counter application wired through the facade.
//!
//! Used by the `mvc-demo` binary. The model is a single counter proxy, the
//! controller maps `Increment`/`Reset` to commands, and the view is a screen
//! (a list of rendered lines) driven by a display mediator. The highlighted
//! display embeds the plain one and takes over `CounterChanged`.

use crate::core::{
    BindingTable, BoundMediator, Command, DataProxy, MacroCommand, Mediator, MediatorCore,
    Notification, Payload,
};
use crate::error::{HandlerResult, MvcResult};
use crate::facade::Facade;
use std::sync::{Arc, Mutex, PoisonError};

pub const STARTUP: &str = "Startup";
pub const INCREMENT: &str = "Increment";
pub const RESET: &str = "Reset";
pub const COUNTER_CHANGED: &str = "CounterChanged";
pub const COUNTER_RESET: &str = "CounterReset";

pub const COUNTER_PROXY: &str = "CounterProxy";
pub const DISPLAY_MEDIATOR: &str = "DisplayMediator";

pub type CounterProxy = DataProxy<i64>;

/// The view component: lines rendered so far.
#[derive(Default)]
pub struct Screen {
    lines: Mutex<Vec<String>>,
}

impl Screen {
    pub fn print(&self, line: String) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn counter(facade: &Facade) -> Result<Arc<CounterProxy>, String> {
    facade
        .retrieve_proxy_as::<CounterProxy>(COUNTER_PROXY)
        .ok_or_else(|| format!("{} is not registered", COUNTER_PROXY))
}

/// Plain display: prints every change and reset.
pub struct DisplayMediator {
    core: MediatorCore,
    screen: Arc<Screen>,
}

impl DisplayMediator {
    pub fn new(screen: Arc<Screen>) -> Self {
        Self {
            core: MediatorCore::new(DISPLAY_MEDIATOR).with_view_component(screen.clone()),
            screen,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    fn on_counter_changed(&self, note: &mut Notification) -> HandlerResult {
        let value = note.body_as::<i64>().ok_or("CounterChanged without a value")?;
        self.screen.print(format!("count = {}", value));
        Ok(())
    }

    fn on_counter_reset(&self, _note: &mut Notification) -> HandlerResult {
        self.screen.print("count reset".to_string());
        Ok(())
    }
}

impl BoundMediator for DisplayMediator {
    fn core(&self) -> &MediatorCore {
        &self.core
    }

    fn bindings() -> BindingTable<Self> {
        BindingTable::new("DisplayMediator")
            .bind(COUNTER_CHANGED, "on_counter_changed", Self::on_counter_changed)
            .bind(COUNTER_RESET, "on_counter_reset", Self::on_counter_reset)
    }

    fn on_register(&self) {
        self.screen.print("display ready".to_string());
    }
}

/// Display that marks large values. Keeps the plain reset handling.
pub struct HighlightDisplayMediator {
    display: DisplayMediator,
    threshold: i64,
}

impl HighlightDisplayMediator {
    pub fn new(screen: Arc<Screen>, threshold: i64) -> Self {
        Self {
            display: DisplayMediator::new(screen),
            threshold,
        }
    }

    fn on_counter_changed_highlighted(&self, note: &mut Notification) -> HandlerResult {
        let value = *note.body_as::<i64>().ok_or("CounterChanged without a value")?;
        if value >= self.threshold {
            self.display.screen.print(format!("count = {} (!)", value));
        } else {
            self.display.screen.print(format!("count = {}", value));
        }
        Ok(())
    }
}

impl BoundMediator for HighlightDisplayMediator {
    fn core(&self) -> &MediatorCore {
        self.display.core()
    }

    fn bindings() -> BindingTable<Self> {
        DisplayMediator::bindings()
            .lift(|highlight: &HighlightDisplayMediator| &highlight.display)
            .derive("HighlightDisplayMediator")
            .bind(
                COUNTER_CHANGED,
                "on_counter_changed_highlighted",
                Self::on_counter_changed_highlighted,
            )
    }

    fn on_register(&self) {
        BoundMediator::on_register(&self.display);
    }
}

/// Adds the notification body (default 1) to the counter.
pub struct IncrementCommand;

impl Command for IncrementCommand {
    fn execute(&self, facade: &Facade, note: &mut Notification) -> HandlerResult {
        let amount = note.body_as::<i64>().copied().unwrap_or(1);
        let counter = counter(facade)?;
        let value = counter.update(|count| {
            *count += amount;
            *count
        });
        facade.send_notification(COUNTER_CHANGED, Some(Payload::new(value)), None)?;
        Ok(())
    }

    fn command_name(&self) -> &str {
        "IncrementCommand"
    }
}

pub struct ResetCommand;

impl Command for ResetCommand {
    fn execute(&self, facade: &Facade, _note: &mut Notification) -> HandlerResult {
        counter(facade)?.set_data(0);
        facade.send_notification(COUNTER_RESET, None, None)?;
        Ok(())
    }

    fn command_name(&self) -> &str {
        "ResetCommand"
    }
}

struct PrepareModelCommand;

impl Command for PrepareModelCommand {
    fn execute(&self, facade: &Facade, note: &mut Notification) -> HandlerResult {
        let initial = note.kind_as::<i64>().copied().unwrap_or(0);
        facade.register_proxy(Arc::new(CounterProxy::new(COUNTER_PROXY, initial)))?;
        Ok(())
    }

    fn command_name(&self) -> &str {
        "PrepareModelCommand"
    }
}

struct PrepareViewCommand;

impl Command for PrepareViewCommand {
    fn execute(&self, facade: &Facade, note: &mut Notification) -> HandlerResult {
        let mediator = note
            .take_body()
            .ok_or("Startup needs a display mediator")?
            .downcast::<Arc<dyn Mediator>>()
            .map_err(|payload| format!("Startup body is a {}", payload.type_name()))?;
        facade.register_mediator(mediator)?;
        facade.register_command(INCREMENT, || IncrementCommand)?;
        facade.register_command(RESET, || ResetCommand)?;
        Ok(())
    }

    fn command_name(&self) -> &str {
        "PrepareViewCommand"
    }
}

/// Register the startup route and run it with `display` as the view.
pub fn startup(facade: &Facade, display: Arc<dyn Mediator>, initial: i64) -> MvcResult<()> {
    facade.register_command(STARTUP, || {
        MacroCommand::new()
            .with(|| PrepareModelCommand)
            .with(|| PrepareViewCommand)
    })?;
    facade.send_notification(STARTUP, Some(Payload::new(display)), Some(Payload::new(initial)))?;
    facade.remove_command(STARTUP);
    Ok(())
}
