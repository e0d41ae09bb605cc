//! # MessageBus — String-Keyed Broadcast Channels
//!
//! The [`MessageBus`] maps channel names to [`Multicast`] lists of
//! subscribers. Publishing on a channel synchronously fans the payload out to
//! every subscriber, in subscription order; a channel nobody touched is a
//! guaranteed-cheap no-op to publish on.
//!
//! ## The lifecycle contract
//!
//! Subscriptions are owned jointly: the channel's multicast holds the
//! callable, and the subscribing object's tree node records which channels it
//! is on. That second half is the point — when the object is despawned, the
//! tree walks its recorded channels and withdraws the callables *before*
//! freeing the slot ([`ObjectTree::despawn`]), so the bus can never hold a
//! subscription into freed state. Should anything slip through anyway, the
//! generational handle inside the callable makes the dispatch a logged skip
//! rather than a fault.
//!
//! One subscription per object per channel: a second `subscribe` for the same
//! `(object, channel)` pair is a no-op even with a different method. This is
//! deliberate (it keeps unsubscribe-by-channel unambiguous) and matches how
//! the runtime has always behaved.
//!
//! ## Dispatch discipline
//!
//! `publish` copies the subscriber list before invoking anything, so the
//! dispatch order is fixed at the moment of the call. Listeners receive only
//! `&mut self` and the payload — neither the tree nor the bus — so a
//! listener cannot re-enter the channel table mid-dispatch; the borrow
//! checker enforces what would otherwise be a "please don't mutate the
//! channel you're being called from" comment. A listener that panics aborts
//! the rest of the dispatch (fail-fast, no isolation).
//!
//! The bus is an ordinary value. Construct it, pass it where it's needed;
//! there is no global channel table.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use crate::callable::Callable;
use crate::handle::ObjectId;
use crate::multicast::Multicast;
use crate::object::GameObject;
use crate::tree::ObjectTree;

/// What travels over a channel: nothing, or a shared opaque value.
///
/// Interpretation is a convention between publisher and subscribers on that
/// channel — the bus never looks inside. `Rc` keeps the runtime
/// single-threaded by construction and lets every listener see the same
/// referent.
pub type Payload = Option<Rc<dyn Any>>;

/// Handler signature for channel subscriptions: a method on the subscribing
/// object taking the payload.
pub type Handler<T> = fn(&mut T, Payload);

/// String-keyed channels of [`Callable`] subscribers.
pub struct MessageBus {
    channels: HashMap<String, Multicast<Payload>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    /// Subscribe `target`'s `method` to `channel`.
    ///
    /// The channel is created on first use. The binding is weak — the bus
    /// does not keep `target` alive.
    ///
    /// Returns `false` without subscribing when:
    /// - `target` is stale, or the object behind it is not a `T` (the method
    ///   could never dispatch), or
    /// - `target` already has a subscription on `channel` — one subscription
    ///   per object per channel, regardless of method.
    pub fn subscribe<T: GameObject>(
        &mut self,
        tree: &mut ObjectTree,
        channel: &str,
        target: ObjectId,
        method: Handler<T>,
    ) -> bool {
        if tree.get::<T>(target).is_none() {
            log::warn!("Refusing subscription to \"{channel}\": {target} is not a live {}",
                std::any::type_name::<T>());
            return false;
        }
        if tree.has_subscription(target, channel) {
            return false;
        }
        let callable = Callable::method(target, method);
        tree.record_subscription(target, channel, callable.clone());
        self.channels
            .entry(channel.to_string())
            .or_default()
            .add(callable);
        log::trace!("{target} subscribed to \"{channel}\"");
        true
    }

    /// Withdraw `target`'s subscription from `channel`.
    ///
    /// Returns `false` when no subscription is recorded for the pair; other
    /// subscribers on the channel are untouched either way.
    pub fn unsubscribe(&mut self, tree: &mut ObjectTree, channel: &str, target: ObjectId) -> bool {
        let Some(callable) = tree.take_subscription(target, channel) else {
            return false;
        };
        self.drop_listener(channel, &callable);
        log::trace!("{target} unsubscribed from \"{channel}\"");
        true
    }

    /// Broadcast `payload` to every subscriber of `channel`, in subscription
    /// order, over a snapshot of the list taken now.
    ///
    /// Returns the number of listeners delivered to. Publishing on an
    /// untouched or empty channel returns 0 without doing anything.
    pub fn publish(&self, tree: &mut ObjectTree, channel: &str, payload: Payload) -> usize {
        let Some(list) = self.channels.get(channel) else {
            return 0;
        };
        if list.is_empty() {
            return 0;
        }
        // Snapshot: the dispatch set is the one in place when publish began.
        let snapshot = list.clone();
        log::trace!("Publishing on \"{channel}\" to {} listener(s)", snapshot.len());
        snapshot.invoke_all(tree, payload)
    }

    /// Current number of subscribers on `channel` (0 for untouched channels).
    pub fn listener_count(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, Multicast::len)
    }

    /// Number of channels ever touched by a subscription. Channels persist
    /// for the bus's lifetime even after their last subscriber leaves.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Remove one recorded callable from a channel. Called by the despawn
    /// cascade with callables taken out of dying nodes.
    pub(crate) fn drop_listener(&mut self, channel: &str, callable: &Callable<Payload>) {
        if let Some(list) = self.channels.get_mut(channel) {
            list.remove(callable);
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}
