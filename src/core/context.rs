//! Identity handles for notification owners and senders.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a [`Context`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Opaque identity of a mediator, controller, facade or any other notifier.
///
/// Equality is identity: two contexts are equal only if one is a clone of the
/// other. The label is carried for diagnostics and never compared.
#[derive(Clone)]
pub struct Context {
    id: ContextId,
    label: Arc<str>,
}

impl Context {
    /// Mint a new, unique context.
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self {
            id: ContextId::next(),
            label: label.into(),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// True if `other` is this very context (not merely one with the same label).
    pub fn is_same(&self, other: &Context) -> bool {
        self.id == other.id
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other)
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.label, self.id.0)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
