use std::sync::Arc;

use common::StatusSnapshot;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PollerConfig;
use crate::error::PollError;
use crate::provider::StatusProvider;

/// Lo que el motor va emitiendo a lo largo del tiempo.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineState {
    /// Todavía no arrancó.
    Idle,
    /// Último snapshot exitoso; la tarea sigue en curso.
    Observing(StatusSnapshot),
    /// La tarea terminó (COMPLETE o FAILED). No se consulta más.
    Terminal(StatusSnapshot),
    /// Falló la consulta; se sigue reintentando.
    Degraded {
        error: PollError,
        consecutive_errors: u32,
    },
    /// Se superó el umbral de errores seguidos. El polling se detuvo.
    Failed(PollError),
}

impl EngineState {
    /// Terminal o Failed: después de esto no hay más estados.
    pub fn is_final(&self) -> bool {
        matches!(self, EngineState::Terminal(_) | EngineState::Failed(_))
    }
}

/// Secuencia de estados de una corrida. Termina (`None`) cuando el motor se
/// detiene, llega a un estado final o se llama a `stop()`.
#[derive(Debug)]
pub struct StateStream {
    rx: mpsc::UnboundedReceiver<EngineState>,
}

impl StateStream {
    pub async fn recv(&mut self) -> Option<EngineState> {
        self.rx.recv().await
    }
}

/// Punto único de emisión. `stop()` cierra el canal bajo el mismo lock, así
/// que nada se emite después de que `stop()` retorna.
struct Emitter {
    tx: Option<mpsc::UnboundedSender<EngineState>>,
    latest: EngineState,
}

impl Emitter {
    fn emit(&mut self, state: EngineState) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        self.latest = state.clone();
        if tx.send(state).is_err() {
            // nadie escucha: no tiene sentido seguir consultando
            self.tx = None;
            return false;
        }
        true
    }

    fn close(&mut self) {
        self.tx = None;
    }
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// El motor corre una sola vez: para volver a consultar hace falta otro `Poller`.
enum Lifecycle {
    NotStarted,
    Running(Running),
    Stopped,
}

/// Motor de polling para una tarea.
///
/// Hace una consulta a la vez: la siguiente arranca `interval` después de que
/// termina la anterior (ok o error), nunca a ritmo fijo.
pub struct Poller<P> {
    config: PollerConfig,
    provider: Arc<P>,
    emitter: Arc<Mutex<Emitter>>,
    lifecycle: Mutex<Lifecycle>,
}

impl<P: StatusProvider + 'static> Poller<P> {
    pub fn new(config: PollerConfig, provider: P) -> Result<Self, PollError> {
        config.validate()?;
        Ok(Self {
            config,
            provider: Arc::new(provider),
            emitter: Arc::new(Mutex::new(Emitter {
                tx: None,
                latest: EngineState::Idle,
            })),
            lifecycle: Mutex::new(Lifecycle::NotStarted),
        })
    }

    /// Arranca el loop; la primera consulta sale de inmediato.
    /// Necesita un runtime de tokio. Sólo se puede llamar una vez.
    pub fn start(&self) -> Result<StateStream, PollError> {
        let mut lifecycle = self.lifecycle.lock();
        match &*lifecycle {
            Lifecycle::NotStarted => {}
            Lifecycle::Running(r) if !r.handle.is_finished() => {
                return Err(PollError::InvalidConfiguration(format!(
                    "poller for task {} already started",
                    self.config.task_id
                )));
            }
            // una consulta vieja puede seguir en vuelo: nunca se superponen
            _ => {
                return Err(PollError::InvalidConfiguration(format!(
                    "poller for task {} already finished; create a new one",
                    self.config.task_id
                )));
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.emitter.lock().tx = Some(tx);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            self.config.clone(),
            self.provider.clone(),
            self.emitter.clone(),
            cancel.clone(),
        ));
        info!(
            "consultando task {} cada {:?}",
            self.config.task_id, self.config.interval
        );

        *lifecycle = Lifecycle::Running(Running { cancel, handle });
        Ok(StateStream { rx })
    }

    /// Cancela la próxima consulta programada. Una consulta en vuelo no se
    /// aborta, pero su resultado se descarta. Idempotente.
    pub fn stop(&self) {
        let previous = std::mem::replace(&mut *self.lifecycle.lock(), Lifecycle::Stopped);
        if let Lifecycle::Running(running) = previous {
            running.cancel.cancel();
            debug!("poller de task {} detenido", self.config.task_id);
        }
        self.emitter.lock().close();
    }

    /// Último estado emitido (`Idle` si nunca arrancó).
    pub fn state(&self) -> EngineState {
        self.emitter.lock().latest.clone()
    }

    pub fn is_running(&self) -> bool {
        matches!(&*self.lifecycle.lock(), Lifecycle::Running(r) if !r.handle.is_finished())
    }
}

impl<P> Drop for Poller<P> {
    fn drop(&mut self) {
        if let Lifecycle::Running(running) = self.lifecycle.get_mut() {
            running.cancel.cancel();
        }
        self.emitter.lock().close();
    }
}

async fn poll_loop<P: StatusProvider + ?Sized>(
    config: PollerConfig,
    provider: Arc<P>,
    emitter: Arc<Mutex<Emitter>>,
    cancel: CancellationToken,
) {
    let task_id = config.task_id.as_str();
    let threshold = config.error_threshold();
    let mut consecutive_errors: u32 = 0;

    loop {
        let result = provider.fetch_status(task_id).await;

        let state = match result {
            Ok(snapshot) => {
                consecutive_errors = 0;
                if snapshot.status.is_terminal() {
                    info!("task {} terminó con estado {}", task_id, snapshot.status);
                    EngineState::Terminal(snapshot)
                } else {
                    debug!("task {}: {}", task_id, snapshot.status);
                    EngineState::Observing(snapshot)
                }
            }
            Err(error) => {
                consecutive_errors = consecutive_errors.saturating_add(1);
                match threshold {
                    _ if !error.is_retryable() => {
                        warn!("task {}: error no reintentable: {}", task_id, error);
                        EngineState::Failed(error)
                    }
                    Some(max) if consecutive_errors >= max => {
                        warn!(
                            "task {}: {} errores seguidos, dejo de consultar: {}",
                            task_id, consecutive_errors, error
                        );
                        EngineState::Failed(error)
                    }
                    _ => {
                        warn!(
                            "task {}: error consultando estado ({} seguidos): {}",
                            task_id, consecutive_errors, error
                        );
                        EngineState::Degraded {
                            error,
                            consecutive_errors,
                        }
                    }
                }
            }
        };

        {
            let mut out = emitter.lock();
            // stop() cancela antes de tomar este lock
            if cancel.is_cancelled() {
                debug!("descartando respuesta de task {} (poller detenido)", task_id);
                return;
            }
            let is_final = state.is_final();
            if !out.emit(state) {
                return;
            }
            if is_final {
                out.close();
                return;
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = sleep(config.interval) => {}
        }
    }
}
