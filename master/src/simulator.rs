use crate::state::AppState;
use std::time::Duration;
use tracing::info;

/// Loop del simulador: cada `tick` avanza todas las tareas un paso.
pub async fn run_simulator(state: AppState, tick: Duration) {
    loop {
        tokio::time::sleep(tick).await;

        for (task_id, status) in state.advance_all() {
            info!("tarea {} pasó a {}", task_id, status);
        }
    }
}
