//! Editor command bus
//!
//! Toolbar buttons and shortcuts publish commands here instead of calling
//! into whichever screen happens to be active. Subscriptions are keyed by
//! an explicit token and torn down when their owning [`Subscription`]
//! drops, so no ambient global outlives its screen.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Commands an editor host can publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    /// Persist the current draft
    Save,
    /// Append a fresh row
    AddRow,
    /// Delete the currently selected row
    DeleteSelected,
    /// Start drafting a brand-new plan
    NewPlan,
}

/// Identity of one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(Uuid);

/// Fan-out channel for [`EditorCommand`]s
#[derive(Debug, Default)]
pub struct CommandBus {
    subscribers: Mutex<HashMap<SubscriptionToken, mpsc::UnboundedSender<EditorCommand>>>,
}

impl CommandBus {
    /// New bus with no subscribers
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe; the returned handle unsubscribes on drop
    #[must_use]
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let token = SubscriptionToken(Uuid::new_v4());
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().insert(token, tx);
        tracing::debug!(?token, "command subscription opened");
        Subscription {
            token,
            rx,
            bus: Arc::downgrade(self),
        }
    }

    /// Deliver a command to every live subscriber
    ///
    /// Returns how many subscribers received it. Closed receivers are
    /// pruned on the way.
    pub fn publish(&self, command: EditorCommand) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|_, tx| !tx.is_closed());
        let mut delivered = 0;
        for tx in subscribers.values() {
            if tx.send(command).is_ok() {
                delivered += 1;
            }
        }
        tracing::debug!(?command, delivered, "command published");
        delivered
    }

    /// Number of live subscriptions
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|_, tx| !tx.is_closed());
        subscribers.len()
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        if self.subscribers.lock().remove(&token).is_some() {
            tracing::debug!(?token, "command subscription torn down");
        }
    }
}

/// One subscriber's end of the bus
#[derive(Debug)]
pub struct Subscription {
    token: SubscriptionToken,
    rx: mpsc::UnboundedReceiver<EditorCommand>,
    bus: Weak<CommandBus>,
}

impl Subscription {
    /// This subscription's token
    #[inline]
    #[must_use]
    pub fn token(&self) -> SubscriptionToken {
        self.token
    }

    /// Next command, or `None` once the bus is gone
    pub async fn recv(&mut self) -> Option<EditorCommand> {
        self.rx.recv().await
    }

    /// Non-blocking poll for a command
    pub fn try_recv(&mut self) -> Option<EditorCommand> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.token);
        }
    }
}
