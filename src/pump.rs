//! Notification pump for producers on other threads
//!
//! Broadcasts are synchronous and run on the caller's thread. When
//! notifications originate on several threads, they can be posted to a pump
//! instead: a single delivery thread drains the channel and broadcasts each
//! notification through the facade, one at a time, in posting order.

use crate::core::{Context, Notification, Payload};
use crate::error::MvcError;
use crate::facade::Facade;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

/// Error type for posting to a pump
#[derive(Debug, thiserror::Error)]
pub enum PumpSendError {
    #[error("Notification pump is closed")]
    ChannelClosed,

    #[error(transparent)]
    Notification(#[from] MvcError),
}

/// Cloneable handle used by producers to post notifications.
#[derive(Clone)]
pub struct PumpSender {
    sender: mpsc::UnboundedSender<Notification>,
    context: Context,
}

impl PumpSender {
    pub fn post(&self, note: Notification) -> Result<(), PumpSendError> {
        self.sender
            .send(note)
            .map_err(|_| PumpSendError::ChannelClosed)
    }

    /// Build a notification sent by the pump and post it.
    pub fn post_notification(
        &self,
        name: impl Into<String>,
        body: Option<Payload>,
        kind: Option<Payload>,
    ) -> Result<(), PumpSendError> {
        let note = Notification::new(name)?
            .with_sender(self.context.clone())
            .with_payloads(body, kind);
        self.post(note)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Delivers posted notifications to a facade on a dedicated thread.
pub struct NotificationPump {
    sender: mpsc::UnboundedSender<Notification>,
    context: Context,
    shutdown_sender: Option<oneshot::Sender<()>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl NotificationPump {
    /// Start the delivery thread for `facade`.
    pub fn start(facade: Arc<Facade>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        let thread_handle = std::thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    log::error!("Failed to start notification pump runtime: {}", e);
                    return;
                }
            };
            runtime.block_on(Self::run_delivery_loop(receiver, facade, shutdown_receiver));
        });

        Self {
            sender,
            context: Context::new("NotificationPump"),
            shutdown_sender: Some(shutdown_sender),
            thread_handle: Some(thread_handle),
        }
    }

    /// Sender context stamped on notifications built by [`PumpSender::post_notification`].
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn sender(&self) -> PumpSender {
        PumpSender {
            sender: self.sender.clone(),
            context: self.context.clone(),
        }
    }

    /// Main delivery loop.
    async fn run_delivery_loop(
        mut receiver: mpsc::UnboundedReceiver<Notification>,
        facade: Arc<Facade>,
        mut shutdown_receiver: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                // Handle shutdown signal
                _ = &mut shutdown_receiver => {
                    log::debug!("Received shutdown signal, draining notification pump");
                    receiver.close();
                    while let Ok(note) = receiver.try_recv() {
                        Self::deliver(&facade, note);
                    }
                    break;
                }
                // Handle notifications
                note = receiver.recv() => {
                    match note {
                        Some(note) => Self::deliver(&facade, note),
                        None => {
                            log::debug!("All pump senders dropped");
                            break;
                        }
                    }
                }
            }
        }
    }

    fn deliver(facade: &Facade, mut note: Notification) {
        log::trace!("Pump delivering {}", note.name());
        if let Err(e) = facade.notify_observers(&mut note) {
            log::warn!("Delivery of {} failed: {}", note.name(), e);
        }
    }

    /// Stop the pump after delivering everything already posted.
    /// This will be called automatically on Drop if not called explicitly.
    pub fn shutdown(&mut self) {
        log::info!("Shutdown requested for notification pump");

        if let Some(shutdown_sender) = self.shutdown_sender.take() {
            let _ = shutdown_sender.send(());
        }

        if let Some(thread_handle) = self.thread_handle.take() {
            if thread_handle.join().is_err() {
                log::error!("Notification pump thread panicked");
            }
        }

        log::info!("Notification pump shutdown completed");
    }
}

impl Drop for NotificationPump {
    fn drop(&mut self) {
        if self.shutdown_sender.is_some() || self.thread_handle.is_some() {
            log::debug!("Notification pump dropped without explicit shutdown, performing cleanup");
            self.shutdown();
        }
    }
}
