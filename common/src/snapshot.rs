use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type TaskId = String;

/// Estado global de una tarea map/reduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Processing,
    Failed,
    Complete,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Processing => "PROCESSING",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Complete => "COMPLETE",
        }
    }

    /// COMPLETE y FAILED: la tarea ya no cambia, no se vuelve a consultar.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Failed)
    }

    pub fn is_ongoing(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fase en la que está una tarea mientras está en PROCESSING.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MapReduceStage {
    GetInput,
    Map,
    Shuffle,
    Reduce,
    Summarize,
}

/// Contadores de una fase (map, reduce o summarize).
///
/// `pending` y `total` valen 0 cuando la fase todavía no empezó o no aplica.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStatus {
    pub pending: u64,
    pub pending_bytes: u64,
    pub total: u64,
}

impl StageStatus {
    pub fn new(pending: u64, pending_bytes: u64, total: u64) -> Self {
        Self {
            pending,
            pending_bytes,
            total,
        }
    }

    /// Items ya procesados.
    pub fn done(&self) -> u64 {
        self.total.saturating_sub(self.pending)
    }
}

/// Una observación del estado de la tarea. Cada consulta produce uno nuevo,
/// nunca se mezclan con el anterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    #[serde(alias = "scriptId")]
    pub task_id: TaskId,
    pub deployment_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub stage: Option<MapReduceStage>,
    /// Aproximado; puede no ser exacto en tareas terminadas.
    pub stage_percent_complete: f64,
    /// Tamaño total en bytes.
    pub size: u64,
    pub map: StageStatus,
    pub reduce: StageStatus,
    pub summarize: StageStatus,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    #[error("stage {stage}: pending ({pending}) > total ({total})")]
    PendingExceedsTotal {
        stage: &'static str,
        pending: u64,
        total: u64,
    },

    #[error("stage {stage:?} reported while status is {status}")]
    StageWithoutProcessing {
        stage: MapReduceStage,
        status: TaskStatus,
    },

    #[error("stagePercentComplete out of range: {0}")]
    PercentOutOfRange(f64),
}

impl StatusSnapshot {
    /// Las tres fases con su nombre, en orden de ejecución.
    pub fn stages(&self) -> [(&'static str, &StageStatus); 3] {
        [
            ("map", &self.map),
            ("reduce", &self.reduce),
            ("summarize", &self.summarize),
        ]
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        for (name, stage) in self.stages() {
            if stage.pending > stage.total {
                return Err(SnapshotError::PendingExceedsTotal {
                    stage: name,
                    pending: stage.pending,
                    total: stage.total,
                });
            }
        }

        if let Some(stage) = self.stage {
            if self.status != TaskStatus::Processing {
                return Err(SnapshotError::StageWithoutProcessing {
                    stage,
                    status: self.status,
                });
            }
        }

        let pct = self.stage_percent_complete;
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(SnapshotError::PercentOutOfRange(pct));
        }

        Ok(())
    }
}
