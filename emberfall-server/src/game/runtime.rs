use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use emberfall_game_common::components::{Character, Inventory};

use crate::game::monsters::MonsterRecord;
use crate::game::time::GameTime;
use crate::game::world::World;
use crate::net::registry::SessionRegistry;
use crate::storage::{CombatLogEntry, PersistenceStore};

pub const TICK_RATE_HZ: u64 = 20;

/// Everything the persistence worker writes in one sweep. Snapshots
/// are taken under the world lock; the writes happen off it.
pub struct SaveBatch {
    pub characters: Vec<(Character, Inventory)>,
    pub monsters: Vec<MonsterRecord>,
    pub combat_logs: Vec<CombatLogEntry>,
}

impl SaveBatch {
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty() && self.monsters.is_empty() && self.combat_logs.is_empty()
    }
}

/// Collect the periodic save payload: every active character, all
/// monster instances, buffered combat log lines.
pub fn collect_save_batch(world: &mut World) -> SaveBatch {
    let characters = world
        .players
        .iter()
        .map(|player| (player.character.clone(), player.inventory.clone()))
        .collect();
    let monsters = world.monsters.iter().map(|monster| monster.to_record()).collect();
    let combat_logs = world.take_pending_combat_logs();

    SaveBatch {
        characters,
        monsters,
        combat_logs,
    }
}

pub fn write_save_batch(store: &dyn PersistenceStore, batch: SaveBatch) {
    for (character, inventory) in &batch.characters {
        if let Err(error) = store.update_character(character) {
            log::error!(
                "Periodic save of character {} failed: {}",
                character.info.name,
                error
            );
        }
        if let Err(error) = store.save_inventory(inventory) {
            log::error!(
                "Periodic save of inventory for {} failed: {}",
                character.info.name,
                error
            );
        }
    }
    for record in &batch.monsters {
        if let Err(error) = store.update_monster_instance(record) {
            log::error!("Periodic save of monster {} failed: {}", record.id, error);
        }
    }
    for entry in &batch.combat_logs {
        if let Err(error) = store.log_combat(entry) {
            log::error!("Combat log write failed: {}", error);
        }
    }
}

/// Dedicated persistence worker; consumes batches until the channel
/// closes, then drains what is left.
pub fn spawn_save_worker(
    store: Arc<dyn PersistenceStore>,
    save_rx: crossbeam_channel::Receiver<SaveBatch>,
) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("persistence".into())
        .spawn(move || {
            while let Ok(batch) = save_rx.recv() {
                write_save_batch(store.as_ref(), batch);
            }
            log::info!("Persistence worker stopped");
        })
        .expect("failed to spawn persistence worker")
}

/// The fixed-rate world ticker. Locks the world once per 50 ms step,
/// runs the tick phases, then dispatches the produced messages and
/// hands save batches to the persistence worker without holding the
/// lock.
pub fn spawn_tick_thread(
    world: Arc<Mutex<World>>,
    registry: Arc<SessionRegistry>,
    save_tx: crossbeam_channel::Sender<SaveBatch>,
    shutdown: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("world-tick".into())
        .spawn(move || {
            let tick_duration = Duration::from_millis(1000 / TICK_RATE_HZ);
            let save_interval = {
                let world = world.lock();
                Duration::from_millis(world.config.save_interval_ms as u64)
            };

            let mut last_tick = Instant::now();
            let mut last_save = Instant::now();
            let mut slow_ticks = 0u64;

            loop {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }

                let tick_start = Instant::now();
                let dt = (tick_start - last_tick).as_secs_f32();
                last_tick = tick_start;

                let (outbox, save_batch) = {
                    let mut world = world.lock();
                    world.tick(GameTime::now(), dt);

                    let save_batch = if last_save.elapsed() >= save_interval {
                        last_save = Instant::now();
                        Some(collect_save_batch(&mut world))
                    } else {
                        None
                    };
                    (world.take_outbox(), save_batch)
                };

                registry.dispatch(outbox);

                if let Some(batch) = save_batch {
                    if !batch.is_empty() && save_tx.send(batch).is_err() {
                        log::error!("Persistence worker is gone; stopping periodic saves");
                    }
                }

                let elapsed = tick_start.elapsed();
                if elapsed > tick_duration {
                    slow_ticks += 1;
                    if slow_ticks % 100 == 1 {
                        log::warn!("Tick ran over budget: {:?}", elapsed);
                    }
                } else {
                    std::thread::sleep(tick_duration - elapsed);
                }
            }

            log::info!("Tick thread stopped after {} ticks", world.lock().tick_counter());
        })
        .expect("failed to spawn tick thread")
}

/// Synchronous final save at shutdown: every active character and all
/// monster instances.
pub fn final_save(world: &Arc<Mutex<World>>, store: &dyn PersistenceStore) {
    let batch = {
        let mut world = world.lock();
        collect_save_batch(&mut world)
    };
    let characters = batch.characters.len();
    let monsters = batch.monsters.len();
    write_save_batch(store, batch);
    log::info!(
        "Final save complete: {} characters, {} monsters",
        characters,
        monsters
    );
}
