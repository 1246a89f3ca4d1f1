use std::sync::Arc;
use tokio::sync::Notify;

use buildserve::build::{command, BuildCoordinator};
use buildserve::config::Config;
use buildserve::handler::ServeBuild;
use buildserve::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;

    let coordinator = BuildCoordinator::new();
    let rebuild = Arc::new(Notify::new());
    let builder = command::spawn_builder(
        coordinator.clone(),
        cfg.build_command(),
        Arc::clone(&rebuild),
    );

    let signals = Arc::new(server::SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals), rebuild);

    let handler = Arc::new(ServeBuild::new(coordinator, cfg.serve_options()));
    logger::log_server_start(&addr, &cfg);

    server::run(
        listener,
        handler,
        server::ConnectionSettings::from_config(&cfg),
        signals,
    )
    .await;

    builder.abort();
    Ok(())
}
