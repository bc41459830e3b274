//! Registry-wide serialization lock.
//!
//! One lock is shared by the Model, View and Controller of a facade. Every
//! registry-mutating operation and every broadcast holds it for its whole
//! duration, so a paired change (a command route and its observer, a mediator
//! and its observers) is never observed half done by another thread.
//!
//! The lock is reentrant: a handler running inside a broadcast may send,
//! register or remove on the same thread. Other threads wait until the
//! outermost operation returns. A handler must therefore never block on
//! another thread that uses the same facade.

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct RegistryLock {
    inner: Arc<ReentrantMutex<()>>,
}

impl RegistryLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the serialized section. Released when the guard drops.
    pub fn enter(&self) -> ReentrantMutexGuard<'_, ()> {
        self.inner.lock()
    }

    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// True if both handles guard the same registries.
    pub fn is_shared_with(&self, other: &RegistryLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
