//! # Multicast — An Ordered, Duplicate-Free List of Callables
//!
//! A [`Multicast`] is the fan-out primitive under the message bus: a list of
//! [`Callable`]s invoked together, in the order they were added. Structural
//! equality on `Callable` does the bookkeeping — adding an already-present
//! listener is refused, and removal matches by equality.
//!
//! Invocation is fail-fast: a listener that panics aborts the remaining
//! invocations for that call. There is no isolation layer; listeners are
//! same-process, same-thread game code, and masking their failures would only
//! hide dangling-state bugs.

use crate::callable::Callable;
use crate::tree::ObjectTree;

/// An insertion-ordered list of [`Callable<A, R>`] invoked as a unit.
pub struct Multicast<A, R = ()> {
    listeners: Vec<Callable<A, R>>,
}

impl<A: 'static, R: 'static> Multicast<A, R> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Append a listener unless a structurally-equal one is already present.
    ///
    /// Returns `true` if the listener was added.
    pub fn add(&mut self, callable: Callable<A, R>) -> bool {
        if self.listeners.contains(&callable) {
            return false;
        }
        self.listeners.push(callable);
        true
    }

    /// Remove every listener structurally equal to `callable`.
    ///
    /// Returns how many entries were removed; absent listeners are a no-op.
    pub fn remove(&mut self, callable: &Callable<A, R>) -> usize {
        let before = self.listeners.len();
        self.listeners.retain(|l| l != callable);
        before - self.listeners.len()
    }

    /// Invoke every listener in insertion order with a clone of `args`,
    /// discarding results.
    ///
    /// Returns the number of listeners actually delivered to — stale method
    /// targets are skipped and do not count.
    pub fn invoke_all(&self, tree: &mut ObjectTree, args: A) -> usize
    where
        A: Clone,
    {
        let mut delivered = 0;
        for listener in &self.listeners {
            if listener.invoke(tree, args.clone()).is_some() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Like [`invoke_all`](Self::invoke_all), but hands each listener's
    /// result to `consumer`, once per delivered listener, in the same order.
    pub fn invoke_with(&self, tree: &mut ObjectTree, args: A, mut consumer: impl FnMut(R))
    where
        A: Clone,
    {
        for listener in &self.listeners {
            if let Some(result) = listener.invoke(tree, args.clone()) {
                consumer(result);
            }
        }
    }

    /// Drop every listener. Shared closures live on in any other clone.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<A: 'static, R: 'static> Default for Multicast<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

// Hand-written so `A`/`R` need not be `Clone` themselves.
impl<A, R> Clone for Multicast<A, R> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}
