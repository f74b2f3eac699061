use rand::SeedableRng;
use rand::rngs::StdRng;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use traffiq::{api, config, engine, persistence, state};

fn init_tracing(level: tracing::Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_default()?;
    init_tracing(config.log_level());
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        "traffiq starting"
    );

    let store = persistence::Store::new(config.data_file(), config.audit_file());
    let initial = store.load_state(state::seed_state());
    tracing::info!(
        junctions = initial.junctions.len(),
        recommendations = initial.recommendations.len(),
        "Traffic state ready"
    );
    let engine = Arc::new(engine::Engine::new(
        initial,
        store,
        config.simulation_params(),
    ));

    let stop_flag = Arc::new(AtomicBool::new(false));
    let interval = config.cycle_interval();
    tracing::info!(
        interval_ms = interval.as_millis(),
        "Starting simulation cycle thread"
    );
    let _cycle_handle = engine::spawn_cycle_thread(
        Arc::clone(&engine),
        StdRng::from_entropy(),
        interval,
        Arc::clone(&stop_flag),
    );

    let app = api::router(Arc::clone(&engine));
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    // Signal cycle thread to stop
    stop_flag.store(true, Ordering::Relaxed);

    Ok(())
}
