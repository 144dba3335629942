mod handlers;
mod simulator;
mod state;

use crate::state::AppState;
use anyhow::Result;
use std::{env, time::Duration};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TICK_MS: u64 = 1000;

/// Intervalo del simulador. Se puede sobreescribir con la env var SIM_TICK_MS.
fn sim_tick() -> Duration {
    let ms = env::var("SIM_TICK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_TICK_MS);
    Duration::from_millis(ms)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("master=debug,tower_http=info")),
        )
        .init();

    let state = AppState::new();

    // router HTTP
    let app = handlers::build_router(state.clone()).layer(TraceLayer::new_for_http());

    // simulador de tareas en segundo plano
    let tick = sim_tick();
    let sim_state = state.clone();
    tokio::spawn(async move {
        simulator::run_simulator(sim_state, tick).await;
    });

    let addr = env::var("MASTER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "master escuchando en {} (tick del simulador {:?})",
        listener.local_addr()?,
        tick
    );

    axum::serve(listener, app).await?;
    Ok(())
}
