//! # GameObject — The Polymorphic Object Variant
//!
//! Everything stored in an [`ObjectTree`](crate::tree::ObjectTree) implements
//! [`GameObject`]. The trait itself is almost empty: an object is just a
//! value with identity and whatever state the game gives it. What the runtime
//! needs from it is the ability to get back to the concrete type — the tree
//! stores `Box<dyn GameObject>`, and both the typed accessors
//! ([`ObjectTree::get`](crate::tree::ObjectTree::get)) and the bound-method
//! dispatch in [`Callable`](crate::callable::Callable) recover `&mut T` by
//! downcasting.
//!
//! Downcasting goes through the [`AsAny`] supertrait, which is blanket
//! implemented for every `'static` type, so implementing an object is one
//! line:
//!
//! ```
//! use askr::object::GameObject;
//!
//! #[derive(Default)]
//! struct Player {
//!     health: u32,
//! }
//!
//! impl GameObject for Player {}
//! ```

use std::any::Any;

/// Upcast to [`Any`] for downcasting back to the concrete type.
///
/// Blanket-implemented for every `'static` type; you never implement this by
/// hand.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A node payload in the object tree.
///
/// Implementations are plain structs; the marker impl is usually empty. The
/// tree owns the object exclusively — handles to it
/// ([`ObjectId`](crate::handle::ObjectId)) are non-owning and go stale when
/// the object is despawned.
pub trait GameObject: AsAny + 'static {
    /// Short type label used in log messages and diagnostics.
    fn kind(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    // Deliberately not `use super::*`: importing `AsAny` would make the
    // blanket impl on `Box<dyn GameObject>` itself a method candidate,
    // shadowing the trait-object dispatch the rest of the crate relies on.
    use super::GameObject;

    #[derive(Default)]
    struct Probe {
        value: i32,
    }

    impl GameObject for Probe {}

    #[test]
    fn downcast_round_trip() {
        let mut boxed: Box<dyn GameObject> = Box::new(Probe { value: 7 });
        assert_eq!(boxed.as_any().downcast_ref::<Probe>().unwrap().value, 7);
        boxed.as_any_mut().downcast_mut::<Probe>().unwrap().value = 9;
        assert_eq!(boxed.as_any().downcast_ref::<Probe>().unwrap().value, 9);
    }

    #[test]
    fn wrong_downcast_is_none() {
        let boxed: Box<dyn GameObject> = Box::new(Probe::default());
        assert!(boxed.as_any().downcast_ref::<u32>().is_none());
    }

    #[test]
    fn kind_names_the_concrete_type() {
        let boxed: Box<dyn GameObject> = Box::new(Probe::default());
        assert!(boxed.kind().ends_with("Probe"));
    }
}
