use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::TaskId;

/// Pedido para crear una tarea simulada en el master.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    /// Items a procesar en cada fase.
    #[serde(default)]
    pub map: u64,
    #[serde(default)]
    pub reduce: u64,
    #[serde(default)]
    pub summarize: u64,

    /// Si viene, la tarea pasa a FAILED después de esa cantidad de ticks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_after: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreated {
    pub task_id: TaskId,
    pub deployment_id: String,
    pub submitted_at: DateTime<Utc>,
}
