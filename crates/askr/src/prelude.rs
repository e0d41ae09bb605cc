//! One-stop import for the common surface: `use askr::prelude::*`.

pub use crate::bus::{Handler, MessageBus, Payload};
pub use crate::callable::Callable;
pub use crate::handle::ObjectId;
pub use crate::multicast::Multicast;
pub use crate::object::GameObject;
pub use crate::tree::ObjectTree;
