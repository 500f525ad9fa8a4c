//! Basic demonstration of the RTS simulation core.
//!
//! Run with: cargo run --example basic_demo
//! Set `RUST_LOG=debug` to see per-tick rebuild logs.

use rts_sim::{PathOptions, SimWorld, TileCoord};

fn main() {
    tracing_subscriber::fmt::init();

    println!("=== RTS Simulation Core - Demo ===\n");

    let mut sim = match SimWorld::new_default_test_world() {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("failed to build demo world: {err}");
            return;
        }
    };

    println!("Initial state:");
    print_snapshot(&mut sim);

    // Send the west army across the street cross towards the east.
    println!("\n--- Issuing move orders to player 0 ---\n");
    for i in 0..6 {
        sim.order_move(i, TileCoord::new(40, 20 + 2 * i as i32));
    }

    let preview = sim.find_path(TileCoord::new(6, 20), TileCoord::new(40, 20), &PathOptions::default());
    println!("Planned route for unit 0: {} tiles\n", preview.len());

    println!("Running simulation for 300 frames (15 seconds at 20 frames/sec)...\n");
    for frame in 0..300 {
        sim.step(0.05);

        if (frame + 1) % 60 == 0 {
            println!("--- Tick {} (t={:.1}s) ---", sim.current_tick(), sim.current_time());
            print_snapshot(&mut sim);
        }
    }

    if let Some(tree) = sim.spatial_quadtree() {
        println!(
            "\nQuadtree: {} ground, {} air (ground root divided: {})",
            tree.ground_len(),
            tree.air_len(),
            tree.ground_tree().is_divided()
        );
    }

    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("snapshot serialization failed: {err}"),
    }
}

fn print_snapshot(sim: &mut SimWorld) {
    let snapshot = sim.snapshot();
    for owner in 0..2u8 {
        println!("  Player {owner}:");
        for unit in snapshot.units.iter().filter(|u| u.owner == owner && !u.kind.is_building()) {
            println!(
                "    {:?} {}: pos=({:.1}, {:.1}) hp={:.0} path={} target={:?} [{}]",
                unit.kind, unit.id, unit.x, unit.y, unit.health, unit.path_len, unit.target, unit.order
            );
        }
    }
    println!("  Occupied tiles: {}", snapshot.occupied_tiles);
}
