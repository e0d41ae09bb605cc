//! # Callable — A Type-Erased, Comparable Function Value
//!
//! A [`Callable<A, R>`] holds one invokable thing with the signature
//! `(A) -> R`, without caring what shape it arrived in. Three shapes are
//! supported, mirroring the three ways game code hands the runtime a
//! function:
//!
//! - **Function** — a plain `fn(A) -> R` pointer. No allocation. Stateless
//!   closures land here too, because Rust coerces a non-capturing closure to
//!   a function pointer at the call site.
//! - **Method** — a method bound to an object in the tree. The callable keeps
//!   the target's [`ObjectId`] (non-owning — it does not keep the object
//!   alive) and re-resolves it through the [`ObjectTree`] on every call. A
//!   stale target means the call is skipped, never a dangling dispatch.
//! - **Closure** — anything else implementing `Fn(A) -> R`, stored behind a
//!   shared `Rc` so that every copy of the callable (subscription lists clone
//!   freely) refers to the same closure object.
//!
//! ## Equality
//!
//! Callables compare structurally, per shape: function-pointer address,
//! (target, method address), or closure identity. Equality exists so lists
//! can deduplicate and remove entries — it says nothing about call behavior,
//! and there is deliberately no ordering.
//!
//! ## Comparison
//!
//! - **`Box<dyn Fn>`**: erases everything, but always allocates and cannot be
//!   compared, so it cannot be removed from a list by value.
//! - **C# delegates**: the closest prior art — multicast-friendly, comparable,
//!   method receivers held weakly only via extra machinery. Here the weak
//!   receiver is the default, courtesy of generational handles.

use std::rc::Rc;

use crate::handle::ObjectId;
use crate::object::GameObject;
use crate::tree::ObjectTree;

/// The active shape of a [`Callable`]. Exactly one is held at a time.
enum Slot<A, R> {
    /// Nothing bound. Invoking this is a contract violation.
    Unbound,
    /// Free function (or coerced stateless closure).
    Function(fn(A) -> R),
    /// Method bound to a tree object, resolved at call time.
    Method {
        /// The receiver. Non-owning; checked for liveness on every call.
        target: ObjectId,
        /// Address of the original `fn(&mut T, A) -> R`, kept for equality.
        method_addr: usize,
        /// Monomorphized shim: downcasts the receiver and applies the method.
        /// Returns `None` when the object behind `target` is not a `T`.
        shim: Rc<dyn Fn(&mut dyn GameObject, A) -> Option<R>>,
    },
    /// Shared heap closure. The only allocating shape.
    Closure(Rc<dyn Fn(A) -> R>),
}

/// A type-erased function value with structural equality.
///
/// See the [module docs](self) for the three shapes. `A` is the argument the
/// callable is invoked with (use a tuple for several), `R` the return type.
pub struct Callable<A, R = ()> {
    slot: Slot<A, R>,
}

impl<A: 'static, R: 'static> Callable<A, R> {
    /// An empty callable. [`invoke`](Self::invoke) on it panics; check
    /// [`is_bound`](Self::is_bound) first if emptiness is a valid state.
    pub fn unbound() -> Self {
        Self { slot: Slot::Unbound }
    }

    /// Bind a free function pointer. Non-capturing closures coerce here, so
    /// `Callable::function(|x: i32| x + 1)` takes the allocation-free path.
    pub fn function(f: fn(A) -> R) -> Self {
        Self {
            slot: Slot::Function(f),
        }
    }

    /// Bind `method` to the object behind `target`.
    ///
    /// The binding is weak: the callable does not keep the object alive, and
    /// a call after the object is despawned resolves the stale handle, logs,
    /// and returns `None` instead of invoking anything.
    pub fn method<T: GameObject>(target: ObjectId, method: fn(&mut T, A) -> R) -> Self {
        let shim = Rc::new(move |obj: &mut dyn GameObject, args: A| -> Option<R> {
            let concrete = obj.as_any_mut().downcast_mut::<T>()?;
            Some(method(concrete, args))
        });
        Self {
            slot: Slot::Method {
                target,
                method_addr: method as usize,
                shim,
            },
        }
    }

    /// Bind an arbitrary closure. This is the one allocating path; the
    /// closure is shared between all clones of the callable.
    pub fn closure(f: impl Fn(A) -> R + 'static) -> Self {
        Self {
            slot: Slot::Closure(Rc::new(f)),
        }
    }

    /// Replace whatever is bound with a free function.
    pub fn bind_function(&mut self, f: fn(A) -> R) {
        self.slot = Slot::Function(f);
    }

    /// Replace whatever is bound with a bound method.
    pub fn bind_method<T: GameObject>(&mut self, target: ObjectId, method: fn(&mut T, A) -> R) {
        *self = Self::method(target, method);
    }

    /// Replace whatever is bound with a closure.
    pub fn bind_closure(&mut self, f: impl Fn(A) -> R + 'static) {
        self.slot = Slot::Closure(Rc::new(f));
    }

    /// Clear the binding, returning to the unbound state.
    pub fn unbind(&mut self) {
        self.slot = Slot::Unbound;
    }

    /// Whether anything is bound. The explicit guard to use before invoking
    /// a callable that may legitimately be empty.
    pub fn is_bound(&self) -> bool {
        !matches!(self.slot, Slot::Unbound)
    }

    /// For method-shaped callables, the receiver handle.
    pub fn target(&self) -> Option<ObjectId> {
        match self.slot {
            Slot::Method { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Invoke the bound function.
    ///
    /// The tree is needed to resolve method receivers; function and closure
    /// shapes ignore it. Returns `None` — without calling anything — when a
    /// method target is stale or no longer the expected concrete type.
    ///
    /// # Panics
    ///
    /// Panics if the callable is unbound. That is a programming error, not a
    /// runtime condition: guard with [`is_bound`](Self::is_bound) where
    /// emptiness is expected.
    pub fn invoke(&self, tree: &mut ObjectTree, args: A) -> Option<R> {
        match &self.slot {
            Slot::Unbound => panic!("invoked an unbound Callable"),
            Slot::Function(f) => Some(f(args)),
            Slot::Closure(f) => Some(f(args)),
            Slot::Method { target, shim, .. } => {
                let Some(obj) = tree.object_mut(*target) else {
                    log::warn!("Skipping callable bound to stale object {target}");
                    return None;
                };
                let result = shim(obj, args);
                if result.is_none() {
                    log::warn!(
                        "Skipping callable: object {target} is no longer the bound type"
                    );
                }
                result
            }
        }
    }
}

impl<A: 'static, R: 'static> Default for Callable<A, R> {
    fn default() -> Self {
        Self::unbound()
    }
}

impl<A: 'static, R: 'static> From<fn(A) -> R> for Callable<A, R> {
    fn from(f: fn(A) -> R) -> Self {
        Self::function(f)
    }
}

impl<A, R> Clone for Callable<A, R> {
    fn clone(&self) -> Self {
        let slot = match &self.slot {
            Slot::Unbound => Slot::Unbound,
            Slot::Function(f) => Slot::Function(*f),
            Slot::Method {
                target,
                method_addr,
                shim,
            } => Slot::Method {
                target: *target,
                method_addr: *method_addr,
                shim: Rc::clone(shim),
            },
            Slot::Closure(f) => Slot::Closure(Rc::clone(f)),
        };
        Self { slot }
    }
}

impl<A, R> PartialEq for Callable<A, R> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.slot, &other.slot) {
            (Slot::Unbound, Slot::Unbound) => true,
            (Slot::Function(a), Slot::Function(b)) => std::ptr::fn_addr_eq(*a, *b),
            (
                Slot::Method {
                    target: t1,
                    method_addr: m1,
                    ..
                },
                Slot::Method {
                    target: t2,
                    method_addr: m2,
                    ..
                },
            ) => t1 == t2 && m1 == m2,
            (Slot::Closure(a), Slot::Closure(b)) => {
                std::ptr::eq(Rc::as_ptr(a) as *const u8, Rc::as_ptr(b) as *const u8)
            }
            _ => false,
        }
    }
}

impl<A, R> Eq for Callable<A, R> {}

impl<A, R> std::fmt::Debug for Callable<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.slot {
            Slot::Unbound => write!(f, "Callable::Unbound"),
            Slot::Function(_) => write!(f, "Callable::Function"),
            Slot::Method { target, .. } => write!(f, "Callable::Method({target})"),
            Slot::Closure(_) => write!(f, "Callable::Closure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MessageBus;

    #[derive(Default)]
    struct Counter {
        hits: u32,
    }

    impl GameObject for Counter {}

    impl Counter {
        fn bump(&mut self, by: u32) {
            self.hits += by;
        }

        fn bump_twice(&mut self, by: u32) {
            self.hits += by * 2;
        }
    }

    fn double(x: i32) -> i32 {
        x * 2
    }

    fn triple(x: i32) -> i32 {
        x * 3
    }

    #[test]
    fn default_is_unbound() {
        let c: Callable<i32, i32> = Callable::default();
        assert!(!c.is_bound());
        assert_eq!(c, Callable::unbound());
    }

    #[test]
    fn function_shape_invokes_and_compares() {
        let mut tree = ObjectTree::new();
        let a: Callable<i32, i32> = Callable::function(double);
        let b: Callable<i32, i32> = Callable::function(double);
        let c: Callable<i32, i32> = Callable::function(triple);
        assert_eq!(a.invoke(&mut tree, 21), Some(42));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn stateless_closure_takes_the_function_path() {
        let mut tree = ObjectTree::new();
        let c: Callable<i32, i32> = Callable::function(|x| x + 1);
        assert!(c.is_bound());
        assert_eq!(c.invoke(&mut tree, 1), Some(2));
    }

    #[test]
    fn closures_compare_by_identity() {
        let mut tree = ObjectTree::new();
        let offset = 10;
        let a: Callable<i32, i32> = Callable::closure(move |x| x + offset);
        let b = a.clone();
        let c: Callable<i32, i32> = Callable::closure(move |x| x + offset);
        assert_eq!(a, b); // same heap object
        assert_ne!(a, c); // equal behavior, different object
        assert_eq!(b.invoke(&mut tree, 5), Some(15));
    }

    #[test]
    fn method_shape_dispatches_to_the_object() {
        let mut tree = ObjectTree::new();
        let id = tree.spawn(Counter::default());
        let c: Callable<u32> = Callable::method(id, Counter::bump);
        assert_eq!(c.invoke(&mut tree, 3), Some(()));
        assert_eq!(tree.get::<Counter>(id).unwrap().hits, 3);
    }

    #[test]
    fn method_equality_is_target_plus_method() {
        let mut tree = ObjectTree::new();
        let a = tree.spawn(Counter::default());
        let b = tree.spawn(Counter::default());
        let c1: Callable<u32> = Callable::method(a, Counter::bump);
        let c2: Callable<u32> = Callable::method(a, Counter::bump);
        let c3: Callable<u32> = Callable::method(b, Counter::bump);
        let c4: Callable<u32> = Callable::method(a, Counter::bump_twice);
        assert_eq!(c1, c2);
        assert_ne!(c1, c3); // different receiver
        assert_ne!(c1, c4); // different method
    }

    #[test]
    fn shapes_never_compare_equal_across() {
        let f: Callable<i32, i32> = Callable::function(double);
        let cl: Callable<i32, i32> = Callable::closure(double);
        let u: Callable<i32, i32> = Callable::unbound();
        assert_ne!(f, cl);
        assert_ne!(f, u);
        assert_ne!(cl, u);
    }

    #[test]
    fn stale_target_is_skipped_safely() {
        let mut tree = ObjectTree::new();
        let mut bus = MessageBus::new();
        let id = tree.spawn(Counter::default());
        let c: Callable<u32> = Callable::method(id, Counter::bump);
        tree.despawn(&mut bus, id);
        assert_eq!(c.invoke(&mut tree, 1), None);
        // The slot may be recycled; the old binding must still miss.
        let replacement = tree.spawn(Counter::default());
        assert_eq!(c.invoke(&mut tree, 1), None);
        assert_eq!(tree.get::<Counter>(replacement).unwrap().hits, 0);
    }

    #[test]
    fn from_a_function_pointer() {
        let mut tree = ObjectTree::new();
        let c: Callable<i32, i32> = (double as fn(i32) -> i32).into();
        assert_eq!(c, Callable::function(double));
        assert_eq!(c.invoke(&mut tree, 4), Some(8));
    }

    #[test]
    fn bind_function_replaces_in_place() {
        let mut tree = ObjectTree::new();
        let mut c: Callable<i32, i32> = Callable::unbound();
        c.bind_function(double);
        assert_eq!(c.invoke(&mut tree, 2), Some(4));
        c.bind_function(triple);
        assert_eq!(c, Callable::function(triple));
        assert_eq!(c.invoke(&mut tree, 2), Some(6));
    }

    #[test]
    fn bind_method_switches_the_receiver() {
        let mut tree = ObjectTree::new();
        let a = tree.spawn(Counter::default());
        let b = tree.spawn(Counter::default());
        let mut c: Callable<u32> = Callable::method(a, Counter::bump);
        c.bind_method(b, Counter::bump);
        assert_eq!(c.target(), Some(b));
        assert_eq!(c.invoke(&mut tree, 5), Some(()));
        assert_eq!(tree.get::<Counter>(a).unwrap().hits, 0);
        assert_eq!(tree.get::<Counter>(b).unwrap().hits, 5);
    }

    #[test]
    fn target_is_some_only_for_methods() {
        let mut tree = ObjectTree::new();
        let id = tree.spawn(Counter::default());
        let m: Callable<u32> = Callable::method(id, Counter::bump);
        assert_eq!(m.target(), Some(id));
        assert_eq!(Callable::<i32, i32>::function(double).target(), None);
        assert_eq!(Callable::<i32, i32>::closure(|x| x).target(), None);
        assert_eq!(Callable::<i32, i32>::unbound().target(), None);
    }

    #[test]
    fn rebinding_replaces_the_shape() {
        let mut tree = ObjectTree::new();
        let mut c: Callable<i32, i32> = Callable::function(double);
        c.bind_closure(|x| x - 1);
        assert_ne!(c, Callable::function(double));
        assert_eq!(c.invoke(&mut tree, 10), Some(9));
        c.unbind();
        assert!(!c.is_bound());
    }

    #[test]
    #[should_panic(expected = "unbound Callable")]
    fn invoking_unbound_panics() {
        let mut tree = ObjectTree::new();
        let c: Callable<i32, i32> = Callable::unbound();
        let _ = c.invoke(&mut tree, 0);
    }
}
