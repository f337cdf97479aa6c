//! Headless sandbox: spawns a seeded swarm of moving, expiring entities,
//! runs the game loop and prints the final state hash.
//!
//! Usage: `solar_sandbox [config.json] [ticks]`

use anyhow::Context;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use solar_engine::prelude::*;

const DEFAULT_TICKS: u64 = 600;
const SPAWN_COUNT: usize = 1_000;
const SEED: u64 = 0x5EED;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load(&path)
            .with_context(|| format!("loading engine config from {path}"))?,
        None => EngineConfig::default(),
    };
    let ticks = match args.next() {
        Some(text) => text
            .parse::<u64>()
            .with_context(|| format!("tick count '{text}' is not a number"))?,
        None => DEFAULT_TICKS,
    };

    init_logging(&config.log_filter);

    let mut manager = Manager::new();
    register_components(&mut manager);
    manager.add_system(Box::new(MotionSystem::new()));
    manager.add_system(Box::new(LifetimeSystem::new()));

    let mut rng = Pcg64::seed_from_u64(SEED);
    for _ in 0..SPAWN_COUNT {
        let e = manager.create();
        manager.add(
            e,
            Position {
                x: rng.gen_range(-100.0..100.0),
                y: rng.gen_range(-100.0..100.0),
            },
        )?;
        manager.add(
            e,
            Velocity {
                dx: rng.gen_range(-5.0..5.0),
                dy: rng.gen_range(-5.0..5.0),
            },
        )?;
        if rng.gen_bool(0.5) {
            manager.add(e, Lifetime::new(rng.gen_range(1.0..20.0)))?;
        }
    }

    let mut game = GameLoop::new(manager, config)?;
    tracing::info!(
        entities = game.manager().entity_count(),
        ticks,
        fixed_dt = game.fixed_dt(),
        "sandbox starting"
    );

    game.run_ticks(ticks);

    let snapshot = game.manager().capture_snapshot()?;
    tracing::info!(
        sim_time = game.sim_time(),
        survivors = game.manager().entity_count(),
        "sandbox finished"
    );
    println!("{}", snapshot.state_hash_hex());
    Ok(())
}
