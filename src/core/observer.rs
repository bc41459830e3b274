//! Observer: a notify callback paired with the context that owns it.

use crate::core::context::Context;
use crate::core::notification::Notification;
use crate::error::HandlerFailure;
use std::fmt;
use std::sync::Arc;

/// Outcome of delivering one notification to one observer
pub type NotifyResult = Result<(), Vec<HandlerFailure>>;

/// Callback invoked when a matching notification is broadcast
pub type NotifyFn = Arc<dyn Fn(&mut Notification) -> NotifyResult + Send + Sync>;

/// A subscription of one context to one notification name.
#[derive(Clone)]
pub struct Observer {
    notify: NotifyFn,
    context: Context,
}

impl Observer {
    pub fn new(notify: NotifyFn, context: Context) -> Self {
        Self { notify, context }
    }

    /// Build an observer from a closure.
    pub fn from_fn<F>(context: Context, notify: F) -> Self
    where
        F: Fn(&mut Notification) -> NotifyResult + Send + Sync + 'static,
    {
        Self::new(Arc::new(notify), context)
    }

    pub fn notify_observer(&self, note: &mut Notification) -> NotifyResult {
        (self.notify)(note)
    }

    /// True only for the very context this observer was built with.
    pub fn compare_notify_context(&self, candidate: &Context) -> bool {
        self.context.is_same(candidate)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
