//! Hierarchy — parent-owned subtrees and cascade despawn.
//!
//! Builds a small fleet: a carrier with two escorts, each escort carrying a
//! drone. Demonstrates reparenting (an escort defects to a second carrier)
//! and the destruction cascade (despawning a carrier takes its whole subtree
//! with it, message subscriptions included).
//!
//! Run with: `cargo run -p askr --example hierarchy`

use askr::prelude::*;

struct Ship {
    name: &'static str,
}

impl GameObject for Ship {}

impl Ship {
    fn on_update(&mut self, _payload: Payload) {
        println!("  {} holding position", self.name);
    }
}

fn print_subtree(tree: &ObjectTree, id: ObjectId, depth: usize) {
    let name = tree.get::<Ship>(id).map_or("?", |s| s.name);
    println!("{}{name} ({id})", "  ".repeat(depth));
    for &child in tree.children(id) {
        print_subtree(tree, child, depth + 1);
    }
}

fn main() {
    env_logger::init();

    let mut tree = ObjectTree::new();
    let mut bus = MessageBus::new();

    let alpha = tree.spawn(Ship { name: "carrier alpha" });
    let beta = tree.spawn(Ship { name: "carrier beta" });

    let mut escorts = Vec::new();
    for name in ["escort one", "escort two"] {
        let escort = tree.spawn_child(alpha, Ship { name });
        let drone = tree.spawn_child(escort, Ship { name: "drone" });
        bus.subscribe(&mut tree, "on_update", escort, Ship::on_update);
        bus.subscribe(&mut tree, "on_update", drone, Ship::on_update);
        escorts.push(escort);
    }

    println!("initial fleet:");
    print_subtree(&tree, alpha, 0);
    print_subtree(&tree, beta, 0);

    // Escort two defects, drone in tow.
    tree.set_parent(escorts[1], Some(beta));
    println!("\nafter defection:");
    print_subtree(&tree, alpha, 0);
    print_subtree(&tree, beta, 0);

    println!("\nupdate reaches {} ship(s)", bus.publish(&mut tree, "on_update", None));

    // Alpha goes down with everything still aboard.
    tree.despawn(&mut bus, alpha);
    println!("\nafter alpha is destroyed:");
    print_subtree(&tree, beta, 0);
    println!("update reaches {} ship(s)", bus.publish(&mut tree, "on_update", None));
}
