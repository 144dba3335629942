use std::time::Duration;

use common::TaskId;

use crate::error::PollError;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(3000);

/// Parámetros del motor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    pub task_id: TaskId,
    /// Pausa entre el fin de una consulta y el inicio de la siguiente.
    pub interval: Duration,
    /// Errores seguidos tolerados antes de rendirse. `None` o `Some(0)`:
    /// se reintenta para siempre.
    pub max_consecutive_errors: Option<u32>,
}

impl PollerConfig {
    pub fn new(task_id: impl Into<TaskId>) -> Self {
        Self {
            task_id: task_id.into(),
            interval: DEFAULT_INTERVAL,
            max_consecutive_errors: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_consecutive_errors(mut self, max: u32) -> Self {
        self.max_consecutive_errors = Some(max);
        self
    }

    /// Umbral efectivo (ignora 0).
    pub fn error_threshold(&self) -> Option<u32> {
        self.max_consecutive_errors.filter(|max| *max > 0)
    }

    pub fn validate(&self) -> Result<(), PollError> {
        if self.task_id.trim().is_empty() {
            return Err(PollError::InvalidConfiguration(
                "task id must not be empty".to_string(),
            ));
        }
        if self.interval.is_zero() {
            return Err(PollError::InvalidConfiguration(
                "interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
