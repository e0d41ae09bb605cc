//! # Askr — A Parent-Owned Game-Object Runtime
//!
//! A small runtime for tree-structured game objects: an ownership hierarchy
//! with cascading destruction, a type-erased comparable function value, and a
//! publish/subscribe message bus whose subscriptions are tied to object
//! lifetimes.
//!
//! ## The pieces
//!
//! - [`ObjectTree`](tree::ObjectTree) — owns every object; parents own
//!   children, despawning a node despawns its subtree. Handles
//!   ([`ObjectId`](handle::ObjectId)) are generational, so stale ones fail
//!   safely instead of dangling.
//! - [`Callable`](callable::Callable) — one value for "a thing you can call":
//!   free function, method bound to a tree object, or shared closure, with
//!   structural equality so lists can deduplicate and remove by value.
//! - [`Multicast`](multicast::Multicast) — an ordered, duplicate-free list of
//!   callables invoked together.
//! - [`MessageBus`](bus::MessageBus) — named channels of subscribers. The
//!   despawn cascade withdraws a dying object from all of its channels before
//!   freeing it, so the bus never holds a subscription into freed state.
//!
//! Everything is synchronous and single-threaded: `publish` invokes every
//! subscriber before it returns, and there is no queue, no thread, no global
//! state — the tree and the bus are plain values you construct and pass
//! around.
//!
//! ## A taste
//!
//! ```
//! use askr::prelude::*;
//!
//! #[derive(Default)]
//! struct Player { ticks: u32 }
//! impl GameObject for Player {}
//! impl Player {
//!     fn on_update(&mut self, _payload: Payload) { self.ticks += 1; }
//! }
//!
//! let mut tree = ObjectTree::new();
//! let mut bus = MessageBus::new();
//!
//! let player = tree.spawn(Player::default());
//! bus.subscribe(&mut tree, "on_update", player, Player::on_update);
//!
//! bus.publish(&mut tree, "on_update", None);
//! assert_eq!(tree.get::<Player>(player).unwrap().ticks, 1);
//!
//! // Despawning withdraws the subscription; the next publish reaches no one.
//! tree.despawn(&mut bus, player);
//! assert_eq!(bus.publish(&mut tree, "on_update", None), 0);
//! ```

pub mod bus;
pub mod callable;
pub mod handle;
pub mod multicast;
pub mod object;
pub mod prelude;
pub mod tree;

pub use bus::{Handler, MessageBus, Payload};
pub use callable::Callable;
pub use handle::ObjectId;
pub use multicast::Multicast;
pub use object::GameObject;
pub use tree::ObjectTree;
