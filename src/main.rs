use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod media;
mod server;
mod storage;

use server::{create_reusable_listener, start_server_loop, start_signal_handler, SignalHandler};
use storage::{MediaStore, ObjectStoreBackend};

const DEFAULT_CONFIG_PATH: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;

    logger::init(&cfg)?;

    // Create the Tokio runtime, sized by `server.workers` when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let store = build_store(&cfg).await?;

    for bucket in [&cfg.storage.music_bucket, &cfg.storage.image_bucket] {
        storage::probe_bucket(store.as_ref(), bucket).await;
    }

    let listener = create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(config::AppState::new(cfg, store));
    let signals = Arc::new(SignalHandler::new());
    start_signal_handler(Arc::clone(&signals));

    start_server_loop(listener, state, Arc::new(AtomicUsize::new(0)), signals).await;
    Ok(())
}

async fn build_store(
    cfg: &config::Config,
) -> Result<Arc<dyn MediaStore>, Box<dyn std::error::Error>> {
    let backend = ObjectStoreBackend::from_config(&cfg.storage)?;

    if let Some(ref dir) = cfg.storage.seed_dir {
        let uploaded = backend.seed_from_dir(dir).await?;
        logger::log_info(&format!("Seeded {uploaded} object(s) from {dir}"));
    }

    Ok(Arc::new(backend))
}
