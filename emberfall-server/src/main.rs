use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Arg, Command};
use parking_lot::Mutex;
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use emberfall_data::ContentCatalog;
use emberfall_game_common::components::WorldPosition;

use emberfall_server::game::monsters::MonsterRegistry;
use emberfall_server::game::runtime;
use emberfall_server::game::world::{World, WorldConfig};
use emberfall_server::net::registry::SessionRegistry;
use emberfall_server::net::session::{run_session, SessionContext};
use emberfall_server::storage::{JsonStore, PersistenceStore};

fn init_logging(log_file: Option<&str>, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        match std::fs::File::create(path) {
            Ok(file) => loggers.push(WriteLogger::new(level, Config::default(), file)),
            Err(error) => eprintln!("Could not open log file {}: {}", path, error),
        }
    }

    if let Err(error) = CombinedLogger::init(loggers) {
        eprintln!("Failed to initialise logging: {}", error);
    }
}

#[tokio::main]
async fn main() {
    let matches = Command::new("emberfall-server")
        .about("Authoritative world server for Emberfall")
        .arg(
            Arg::new("bind-addr")
                .long("bind-addr")
                .takes_value(true)
                .default_value("0.0.0.0:4000"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .takes_value(true)
                .default_value("data")
                .help("Directory holding the content catalog JSON files"),
        )
        .arg(
            Arg::new("storage-dir")
                .long("storage-dir")
                .takes_value(true)
                .default_value("storage")
                .help("Root of the persistent account/character store"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .takes_value(true),
        )
        .arg(
            Arg::new("rng-seed")
                .long("rng-seed")
                .takes_value(true)
                .help("Fix the world RNG seed (default: derived from the clock)"),
        )
        .arg(Arg::new("verbose").long("verbose").short('v'))
        .get_matches();

    init_logging(matches.value_of("log-file"), matches.is_present("verbose"));

    log::info!("Starting Emberfall server");

    let data_dir = PathBuf::from(matches.value_of("data-dir").unwrap_or("data"));
    let catalog = match ContentCatalog::load(&data_dir) {
        Ok(catalog) => Arc::new(catalog),
        Err(error) => {
            log::error!("Failed to load content catalog: {:#}", error);
            std::process::exit(1);
        }
    };

    let storage_dir = PathBuf::from(matches.value_of("storage-dir").unwrap_or("storage"));
    let store: Arc<dyn PersistenceStore> = match JsonStore::open(&storage_dir) {
        Ok(store) => Arc::new(store),
        Err(error) => {
            log::error!("Failed to open persistence store: {:#}", error);
            std::process::exit(1);
        }
    };

    let (healthy, health_message) = store.health_check();
    if !healthy {
        log::error!(
            "Persistence store unhealthy, running degraded (no login/register): {}",
            health_message
        );
    }

    match store.clean_old_combat_logs(30) {
        Ok(removed) if removed > 0 => log::info!("Pruned {} old combat log entries", removed),
        Ok(_) => {}
        Err(error) => log::error!("Combat log cleanup failed: {}", error),
    }

    let rng_seed = matches
        .value_of("rng-seed")
        .and_then(|seed| seed.parse::<u64>().ok())
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis() as u64);

    let monster_records = match store.load_monster_instances() {
        Ok(records) => records,
        Err(error) => {
            log::error!("Failed to load monster instances: {}", error);
            Vec::new()
        }
    };

    let mut seed_rng = {
        use rand::SeedableRng;
        rand::rngs::StdRng::seed_from_u64(rng_seed)
    };
    let monsters = MonsterRegistry::from_records_or_catalog(monster_records, &catalog, &mut seed_rng);

    let config = WorldConfig {
        spawn_position: catalog.terrain.clamp(glam::Vec3::ZERO).into(),
        ..WorldConfig::default()
    };
    let spawn: WorldPosition = config.spawn_position;
    log::info!(
        "World spawn at ({:.1}, {:.1}, {:.1}), {} monsters, seed {}",
        spawn.x,
        spawn.y,
        spawn.z,
        monsters.len(),
        rng_seed
    );

    let world = Arc::new(Mutex::new(World::new(
        catalog,
        store.clone(),
        monsters,
        config,
        rng_seed,
    )));
    let registry = Arc::new(SessionRegistry::new());
    let shutdown = Arc::new(AtomicBool::new(false));

    let (save_tx, save_rx) = crossbeam_channel::unbounded();
    let save_worker = runtime::spawn_save_worker(store.clone(), save_rx);
    let tick_thread = runtime::spawn_tick_thread(
        world.clone(),
        registry.clone(),
        save_tx.clone(),
        shutdown.clone(),
    );

    let ctx = Arc::new(SessionContext {
        world: world.clone(),
        store: store.clone(),
        registry: registry.clone(),
        degraded: !healthy,
    });

    let bind_addr = matches.value_of("bind-addr").unwrap_or("0.0.0.0:4000");
    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            log::error!("Failed to bind {}: {}", bind_addr, error);
            std::process::exit(1);
        }
    };
    log::info!("Listening on {}", bind_addr);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let _ = stream.set_nodelay(true);
                    let ctx = ctx.clone();
                    tokio::spawn(async move {
                        run_session(ctx, stream, peer).await;
                    });
                }
                Err(error) => {
                    log::error!("Accept failed: {}", error);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                log::info!("Shutdown signal received");
                break;
            }
        }
    }

    // Orderly shutdown: stop the tick, then write everything out.
    shutdown.store(true, Ordering::SeqCst);
    if tick_thread.join().is_err() {
        log::error!("Tick thread panicked during shutdown");
    }
    drop(save_tx);
    if save_worker.join().is_err() {
        log::error!("Persistence worker panicked during shutdown");
    }
    runtime::final_save(&world, store.as_ref());

    log::info!("Server shutdown complete");
}
