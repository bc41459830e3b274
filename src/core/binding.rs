//! Handler binding tables and the resolver.
//!
//! A mediator type declares which of its functions handle which notification
//! names with a [`BindingTable`]. The table is a stack of levels: a derived
//! mediator embeds its base, lifts the base's table onto itself and adds a new
//! level with its own bindings.
//!
//! Resolution walks the levels from the most derived one upward. For each
//! notification name, the first level that binds that name wins outright:
//! its handlers for the name run in declaration order and every level further
//! up is ignored for that name, whatever the handlers there are called.

use crate::core::mediator::BoundMediator;
use crate::core::notification::Notification;
use crate::error::HandlerResult;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Handler function bound to a notification name
pub type BoundHandler<M> = Arc<dyn Fn(&M, &mut Notification) -> HandlerResult + Send + Sync>;

/// One declared `(notification name -> handler)` entry.
pub struct Binding<M> {
    notification: String,
    method: &'static str,
    level: &'static str,
    handler: BoundHandler<M>,
}

impl<M> Binding<M> {
    pub fn notification(&self) -> &str {
        &self.notification
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Type name of the level that declared this binding.
    pub fn level(&self) -> &'static str {
        self.level
    }

    pub fn invoke(&self, mediator: &M, note: &mut Notification) -> HandlerResult {
        (self.handler)(mediator, note)
    }
}

impl<M> Clone for Binding<M> {
    fn clone(&self) -> Self {
        Self {
            notification: self.notification.clone(),
            method: self.method,
            level: self.level,
            handler: self.handler.clone(),
        }
    }
}

impl<M> fmt::Debug for Binding<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{} <- {}", self.level, self.method, self.notification)
    }
}

struct Level<M> {
    type_name: &'static str,
    bindings: Vec<Binding<M>>,
}

/// Declared handler bindings of a mediator type, root-most level first.
pub struct BindingTable<M> {
    levels: Vec<Level<M>>,
}

impl<M: 'static> BindingTable<M> {
    /// Start a table whose first level is declared by `type_name`.
    pub fn new(type_name: &'static str) -> Self {
        Self {
            levels: vec![Level {
                type_name,
                bindings: Vec::new(),
            }],
        }
    }

    /// A table with no levels at all (an inert mediator).
    pub fn empty() -> Self {
        Self { levels: Vec::new() }
    }

    /// Open a new, more derived level. Subsequent `bind` calls land in it.
    pub fn derive(mut self, type_name: &'static str) -> Self {
        self.levels.push(Level {
            type_name,
            bindings: Vec::new(),
        });
        self
    }

    /// Bind `handler` to `notification` in the current (most derived) level.
    pub fn bind<F>(mut self, notification: impl Into<String>, method: &'static str, handler: F) -> Self
    where
        F: Fn(&M, &mut Notification) -> HandlerResult + Send + Sync + 'static,
    {
        if self.levels.is_empty() {
            self.levels.push(Level {
                type_name: type_name::<M>(),
                bindings: Vec::new(),
            });
        }
        if let Some(level) = self.levels.last_mut() {
            level.bindings.push(Binding {
                notification: notification.into(),
                method,
                level: level.type_name,
                handler: Arc::new(handler),
            });
        }
        self
    }

    /// Re-target every binding onto a type `D` that embeds `M`.
    ///
    /// Levels and declaration order are kept, so the lifted table behaves as
    /// the ancestor chain of `D`.
    pub fn lift<D, A>(self, accessor: A) -> BindingTable<D>
    where
        D: 'static,
        A: Fn(&D) -> &M + Send + Sync + 'static,
    {
        let accessor = Arc::new(accessor);
        let levels = self
            .levels
            .into_iter()
            .map(|level| Level {
                type_name: level.type_name,
                bindings: level
                    .bindings
                    .into_iter()
                    .map(|binding| {
                        let accessor = accessor.clone();
                        let inner = binding.handler;
                        let handler: BoundHandler<D> =
                            Arc::new(move |derived: &D, note: &mut Notification| {
                                inner(accessor(derived), note)
                            });
                        Binding {
                            notification: binding.notification,
                            method: binding.method,
                            level: binding.level,
                            handler,
                        }
                    })
                    .collect(),
            })
            .collect();
        BindingTable { levels }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Declared bindings as `(level type name, bindings)`, root-most first.
    pub fn levels(&self) -> impl Iterator<Item = (&'static str, &[Binding<M>])> {
        self.levels
            .iter()
            .map(|level| (level.type_name, level.bindings.as_slice()))
    }

    /// Apply the nearest-level-wins policy and produce the active bindings.
    pub fn resolve(&self) -> ResolvedBindings<M> {
        let mut by_name: HashMap<String, Vec<Binding<M>>> = HashMap::new();
        let mut winning_level: HashMap<String, usize> = HashMap::new();
        let mut interests = Vec::new();

        for (index, level) in self.levels.iter().enumerate().rev() {
            for binding in &level.bindings {
                match winning_level.get(&binding.notification) {
                    None => {
                        winning_level.insert(binding.notification.clone(), index);
                        interests.push(binding.notification.clone());
                        by_name.insert(binding.notification.clone(), vec![binding.clone()]);
                    }
                    Some(&winner) if winner == index => {
                        if let Some(handlers) = by_name.get_mut(&binding.notification) {
                            handlers.push(binding.clone());
                        }
                    }
                    Some(&winner) => {
                        log::trace!(
                            "{}::{} suppressed for '{}' by level {}",
                            level.type_name,
                            binding.method,
                            binding.notification,
                            self.levels[winner].type_name
                        );
                    }
                }
            }
        }

        ResolvedBindings { by_name, interests }
    }
}

impl<M: 'static> Default for BindingTable<M> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Active bindings of a mediator type after override suppression.
pub struct ResolvedBindings<M> {
    by_name: HashMap<String, Vec<Binding<M>>>,
    interests: Vec<String>,
}

impl<M> ResolvedBindings<M> {
    /// Handlers to invoke for `notification`, in invocation order.
    pub fn handlers_for(&self, notification: &str) -> &[Binding<M>] {
        self.by_name
            .get(notification)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every notification name with at least one active handler.
    pub fn interests(&self) -> &[String] {
        &self.interests
    }

    pub fn is_inert(&self) -> bool {
        self.interests.is_empty()
    }
}

type ResolvedCache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static RESOLVED: OnceLock<ResolvedCache> = OnceLock::new();

/// Resolves and caches binding tables per concrete mediator type.
///
/// A type's table is declared statically, so it is resolved on first use and
/// shared by every instance afterwards.
pub struct Resolver;

impl Resolver {
    pub fn bindings_for<M: BoundMediator>() -> Arc<ResolvedBindings<M>> {
        let cache = RESOLVED.get_or_init(|| RwLock::new(HashMap::new()));
        let key = TypeId::of::<M>();

        let cached = cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(resolved) = cached.and_then(|entry| entry.downcast::<ResolvedBindings<M>>().ok()) {
            return resolved;
        }

        let resolved = M::bindings().resolve();
        log::debug!(
            "Resolved {} notification interest(s) for {}",
            resolved.interests().len(),
            type_name::<M>()
        );

        let entry = cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert_with(|| Arc::new(resolved) as Arc<dyn Any + Send + Sync>)
            .clone();
        match entry.downcast::<ResolvedBindings<M>>() {
            Ok(resolved) => resolved,
            // The key is M's own TypeId, so the entry always has this type.
            Err(_) => Arc::new(M::bindings().resolve()),
        }
    }

    /// Handlers of `M` for `notification`, in invocation order.
    pub fn resolve<M: BoundMediator>(notification: &str) -> Vec<Binding<M>> {
        Self::bindings_for::<M>().handlers_for(notification).to_vec()
    }

    pub fn interests<M: BoundMediator>() -> Vec<String> {
        Self::bindings_for::<M>().interests().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    fn ok(_: &Plain, _: &mut Notification) -> HandlerResult {
        Ok(())
    }

    fn methods(resolved: &ResolvedBindings<Plain>, name: &str) -> Vec<&'static str> {
        resolved.handlers_for(name).iter().map(Binding::method).collect()
    }

    #[test]
    fn test_single_level_keeps_declaration_order() {
        let table = BindingTable::<Plain>::new("Plain")
            .bind("X", "second", ok)
            .bind("Y", "other", ok)
            .bind("X", "first", ok);

        let resolved = table.resolve();
        assert_eq!(methods(&resolved, "X"), vec!["second", "first"]);
        assert_eq!(resolved.interests(), &["X".to_string(), "Y".to_string()]);
    }

    #[test]
    fn test_derived_level_suppresses_base_for_same_name() {
        let table = BindingTable::<Plain>::new("Base")
            .bind("X", "base_a", ok)
            .bind("X", "base_b", ok)
            .bind("Y", "base_y", ok)
            .derive("Derived")
            .bind("X", "derived_x", ok);

        let resolved = table.resolve();
        assert_eq!(methods(&resolved, "X"), vec!["derived_x"]);
        assert_eq!(methods(&resolved, "Y"), vec!["base_y"]);
        assert_eq!(resolved.handlers_for("X")[0].level(), "Derived");
        assert_eq!(resolved.handlers_for("Y")[0].level(), "Base");
    }

    #[test]
    fn test_nearest_level_wins_in_three_level_chain() {
        let table = BindingTable::<Plain>::new("Root")
            .bind("X", "root_x", ok)
            .bind("Z", "root_z", ok)
            .derive("Middle")
            .bind("X", "middle_x1", ok)
            .bind("X", "middle_x2", ok)
            .derive("Leaf")
            .bind("Y", "leaf_y", ok);

        let resolved = table.resolve();
        assert_eq!(methods(&resolved, "X"), vec!["middle_x1", "middle_x2"]);
        assert_eq!(methods(&resolved, "Y"), vec!["leaf_y"]);
        assert_eq!(methods(&resolved, "Z"), vec!["root_z"]);
        assert_eq!(
            resolved.interests(),
            &["Y".to_string(), "X".to_string(), "Z".to_string()]
        );
    }

    #[test]
    fn test_empty_table_is_inert() {
        let resolved = BindingTable::<Plain>::empty().resolve();
        assert!(resolved.is_inert());
        assert!(resolved.handlers_for("X").is_empty());

        let resolved = BindingTable::<Plain>::new("Plain").derive("Child").resolve();
        assert!(resolved.is_inert());
    }

    #[test]
    fn test_bind_on_empty_table_opens_level() {
        let table = BindingTable::<Plain>::empty().bind("X", "x", ok);
        assert_eq!(table.level_count(), 1);
        let (name, bindings) = table.levels().next().unwrap();
        assert!(name.ends_with("Plain"));
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_lift_targets_embedding_type() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Inner {
            hits: AtomicUsize,
        }
        struct Outer {
            inner: Inner,
        }

        let table = BindingTable::<Inner>::new("Inner")
            .bind("X", "count", |inner: &Inner, _note: &mut Notification| {
                inner.hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .lift(|outer: &Outer| &outer.inner)
            .derive("Outer");

        let outer = Outer {
            inner: Inner {
                hits: AtomicUsize::new(0),
            },
        };
        let resolved = table.resolve();
        let mut note = Notification::new("X").unwrap();
        for binding in resolved.handlers_for("X") {
            binding.invoke(&outer, &mut note).unwrap();
        }

        assert_eq!(outer.inner.hits.load(Ordering::SeqCst), 1);
        assert_eq!(resolved.handlers_for("X")[0].level(), "Inner");
    }
}
