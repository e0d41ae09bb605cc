//! Game loop — the update/draw pump over channels.
//!
//! A driver loop publishes `"on_update"` once per tick and `"on_draw"` once
//! per frame; objects hear about it through their subscriptions. Halfway
//! through, the player is despawned — its subscriptions vanish with it, so
//! the remaining ticks only reach the enemy.
//!
//! Run with: `cargo run -p askr --example game_loop`

use std::rc::Rc;

use askr::prelude::*;

struct Player {
    health: u32,
}

impl GameObject for Player {}

impl Player {
    fn spawn(tree: &mut ObjectTree, bus: &mut MessageBus) -> ObjectId {
        let id = tree.spawn(Player { health: 3 });
        bus.subscribe(tree, "on_update", id, Player::on_update);
        bus.subscribe(tree, "on_draw", id, Player::on_draw);
        id
    }

    fn on_update(&mut self, payload: Payload) {
        // The update payload is the tick number, by convention.
        let tick = payload
            .as_deref()
            .and_then(|p| p.downcast_ref::<u64>())
            .copied()
            .unwrap_or(0);
        self.health = self.health.saturating_sub(1);
        println!("  player: tick {tick}, health {}", self.health);
    }

    fn on_draw(&mut self, _payload: Payload) {
        println!("  player: drawn");
    }
}

#[derive(Default)]
struct Enemy {
    seen_ticks: u64,
}

impl GameObject for Enemy {}

impl Enemy {
    fn spawn(tree: &mut ObjectTree, bus: &mut MessageBus) -> ObjectId {
        let id = tree.spawn(Enemy::default());
        bus.subscribe(tree, "on_update", id, Enemy::on_update);
        id
    }

    fn on_update(&mut self, _payload: Payload) {
        self.seen_ticks += 1;
        println!("  enemy: lurking ({} ticks seen)", self.seen_ticks);
    }
}

fn main() {
    env_logger::init();

    let mut tree = ObjectTree::new();
    let mut bus = MessageBus::new();

    let player = Player::spawn(&mut tree, &mut bus);
    Enemy::spawn(&mut tree, &mut bus);

    for tick in 0u64..6 {
        println!("tick {tick}:");
        let delivered = bus.publish(&mut tree, "on_update", Some(Rc::new(tick)));
        bus.publish(&mut tree, "on_draw", None);
        println!("  ({delivered} listener(s) updated)");

        if tick == 2 {
            println!("  -- despawning player --");
            tree.despawn(&mut bus, player);
        }
    }

    println!("{} object(s) left alive", tree.object_count());
}
