//! View registry: mediators by name and observers by notification name.
//!
//! Broadcasts run on the caller's thread. The observer bucket is copied out of
//! the registry before the fan-out starts, so observers may register or remove
//! mediators (or send further notifications) without disturbing the broadcast
//! in progress. Registry mutations and broadcasts are serialized across threads
//! by the shared [`RegistryLock`]; the inner state mutex is never held while
//! user code runs.

use crate::config::{DuplicatePolicy, FacadeConfig, FailurePolicy};
use crate::core::context::Context;
use crate::core::mediator::Mediator;
use crate::core::notification::Notification;
use crate::core::observer::Observer;
use crate::core::registry_lock::RegistryLock;
use crate::error::{HandlerFailure, MvcError, MvcResult};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct ViewState {
    observers: HashMap<String, Vec<Observer>>,
    mediators: HashMap<String, Arc<dyn Mediator>>,
    // Names whose on_remove hook is running
    removing: HashSet<String>,
}

pub struct View {
    state: Mutex<ViewState>,
    lock: RegistryLock,
    duplicate_policy: DuplicatePolicy,
    failure_policy: FailurePolicy,
}

impl View {
    pub fn new(config: &FacadeConfig) -> Self {
        Self::with_lock(config, RegistryLock::new())
    }

    /// A view serialized by a lock shared with the other registries.
    pub fn with_lock(config: &FacadeConfig, lock: RegistryLock) -> Self {
        Self {
            state: Mutex::new(ViewState::default()),
            lock,
            duplicate_policy: config.duplicate_policy,
            failure_policy: config.failure_policy,
        }
    }

    pub fn registry_lock(&self) -> &RegistryLock {
        &self.lock
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `observer` to the bucket for `name`, creating the bucket if needed.
    pub fn register_observer(&self, name: impl Into<String>, observer: Observer) {
        let _serial = self.lock.enter();
        let name = name.into();
        log::trace!("Registering observer {:?} for {}", observer.context(), name);
        self.state().observers.entry(name).or_default().push(observer);
    }

    /// Remove every observer for `name` owned by `context`.
    ///
    /// Returns the number of observers removed. An emptied bucket is pruned.
    pub fn remove_observer(&self, name: &str, context: &Context) -> usize {
        let _serial = self.lock.enter();
        let mut state = self.state();
        let Some(observers) = state.observers.get_mut(name) else {
            return 0;
        };
        let before = observers.len();
        observers.retain(|observer| !observer.compare_notify_context(context));
        let removed = before - observers.len();
        if observers.is_empty() {
            state.observers.remove(name);
        }
        removed
    }

    /// Deliver `note` to every observer of its name, in subscription order.
    ///
    /// Every observer is called even if earlier ones fail; failures are
    /// reported once the whole fan-out is done.
    pub fn notify_observers(&self, note: &mut Notification) -> MvcResult<()> {
        let _serial = self.lock.enter();
        let snapshot = self.state().observers.get(note.name()).cloned();
        let Some(observers) = snapshot else {
            log::trace!("No observers for {}", note.name());
            return Ok(());
        };

        log::trace!(
            "Broadcasting {} to {} observer(s)",
            note.name(),
            observers.len()
        );
        let mut failures = Vec::new();
        for observer in &observers {
            if let Err(mut failed) = observer.notify_observer(note) {
                failures.append(&mut failed);
            }
        }
        self.report(note.name(), failures)
    }

    fn report(&self, name: &str, failures: Vec<HandlerFailure>) -> MvcResult<()> {
        if failures.is_empty() {
            return Ok(());
        }
        match self.failure_policy {
            FailurePolicy::Aggregate => Err(MvcError::HandlerFailures(failures)),
            FailurePolicy::LogAndSwallow => {
                log::warn!(
                    "Broadcast of {} finished with {} failed handler(s)",
                    name,
                    failures.len()
                );
                Ok(())
            }
        }
    }

    /// Register a mediator and subscribe it to each of its interests.
    pub fn register_mediator(&self, mediator: Arc<dyn Mediator>) -> MvcResult<()> {
        let _serial = self.lock.enter();
        let name = mediator.mediator_name().to_string();
        let interests = mediator.list_notification_interests();

        {
            let mut state = self.state();
            if state.mediators.contains_key(&name) {
                return match self.duplicate_policy {
                    DuplicatePolicy::Error => Err(MvcError::DuplicateMediator(name)),
                    DuplicatePolicy::Ignore => {
                        log::debug!("Mediator {} already registered, ignoring", name);
                        Ok(())
                    }
                };
            }

            state.mediators.insert(name.clone(), mediator.clone());
            for interest in &interests {
                let target = mediator.clone();
                let observer = Observer::from_fn(mediator.context().clone(), move |note| {
                    target.handle_notification(note)
                });
                state
                    .observers
                    .entry(interest.clone())
                    .or_default()
                    .push(observer);
            }
        }

        log::debug!(
            "Registered mediator {} with {} interest(s)",
            name,
            interests.len()
        );
        mediator.on_register();
        Ok(())
    }

    pub fn retrieve_mediator(&self, name: &str) -> Option<Arc<dyn Mediator>> {
        self.state().mediators.get(name).cloned()
    }

    pub fn has_mediator(&self, name: &str) -> bool {
        self.state().mediators.contains_key(name)
    }

    /// Remove a mediator and all of its observers.
    ///
    /// `on_remove` runs first, while the mediator is still registered. A
    /// removal of the same name requested from inside the hook is a no-op.
    pub fn remove_mediator(&self, name: &str) -> Option<Arc<dyn Mediator>> {
        let _serial = self.lock.enter();
        let mediator = {
            let mut state = self.state();
            if state.removing.contains(name) {
                log::debug!("Mediator {} is already being removed", name);
                return None;
            }
            let mediator = state.mediators.get(name).cloned()?;
            state.removing.insert(name.to_string());
            mediator
        };

        mediator.on_remove();

        let mut state = self.state();
        state.removing.remove(name);
        let still_registered = state
            .mediators
            .get(name)
            .is_some_and(|current| current.context().is_same(mediator.context()));
        if !still_registered {
            return None;
        }

        state.mediators.remove(name);
        let context = mediator.context();
        state.observers.retain(|_, observers| {
            observers.retain(|observer| !observer.compare_notify_context(context));
            !observers.is_empty()
        });
        drop(state);

        log::debug!("Removed mediator {}", name);
        Some(mediator)
    }

    pub fn mediator_names(&self) -> Vec<String> {
        self.state().mediators.keys().cloned().collect()
    }

    pub fn observer_count(&self, name: &str) -> usize {
        self.state().observers.get(name).map_or(0, Vec::len)
    }
}
