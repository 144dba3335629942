// master/src/state.rs

use chrono::{DateTime, Utc};
use common::{
    MapReduceStage, StageStatus, StatusSnapshot, TaskCreated, TaskId, TaskRequest, TaskStatus,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Bytes simulados por item, para que `pendingBytes` y `size` tengan algo.
pub const BYTES_PER_ITEM: u64 = 1024;

pub const DEPLOYMENT_ID: &str = "customdeploy_sim";

#[derive(Clone, Default)]
pub struct AppState {
    pub tasks: Arc<Mutex<HashMap<TaskId, SimulatedTask>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<TaskId, SimulatedTask>> {
        // un panic en otro handler no invalida los contadores
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn submit(&self, req: TaskRequest) -> TaskCreated {
        let task = SimulatedTask::new(uuid::Uuid::new_v4().to_string(), req);
        let created = TaskCreated {
            task_id: task.id.clone(),
            deployment_id: task.deployment_id.clone(),
            submitted_at: task.submitted_at,
        };
        self.tasks().insert(task.id.clone(), task);
        created
    }

    pub fn snapshot(&self, task_id: &str) -> Option<StatusSnapshot> {
        self.tasks().get(task_id).map(SimulatedTask::snapshot)
    }

    /// Avanza un tick todas las tareas. Devuelve las que cambiaron de estado.
    pub fn advance_all(&self) -> Vec<(TaskId, TaskStatus)> {
        let mut changed = Vec::new();
        for (id, task) in self.tasks().iter_mut() {
            let before = task.status;
            task.advance();
            if task.status != before {
                changed.push((id.clone(), task.status));
            }
        }
        changed
    }
}

/// Tarea map/reduce simulada:
/// PENDING -> PROCESSING (GET_INPUT, MAP, SHUFFLE, REDUCE, SUMMARIZE) -> COMPLETE,
/// procesando un item por tick en la fase activa.
#[derive(Debug, Clone)]
pub struct SimulatedTask {
    pub id: TaskId,
    pub deployment_id: String,
    pub submitted_at: DateTime<Utc>,
    pub request: TaskRequest,

    pub status: TaskStatus,
    pub stage: Option<MapReduceStage>,
    pub ticks: u32,

    // contadores en 0 hasta que la fase arranca
    pub map: StageStatus,
    pub reduce: StageStatus,
    pub summarize: StageStatus,
}

fn started(items: u64) -> StageStatus {
    StageStatus::new(items, items.saturating_mul(BYTES_PER_ITEM), items)
}

fn drain_one(stage: &mut StageStatus) -> bool {
    if stage.pending == 0 {
        return false;
    }
    stage.pending -= 1;
    stage.pending_bytes = stage.pending.saturating_mul(BYTES_PER_ITEM);
    true
}

impl SimulatedTask {
    pub fn new(id: TaskId, request: TaskRequest) -> Self {
        Self {
            id,
            deployment_id: DEPLOYMENT_ID.to_string(),
            submitted_at: Utc::now(),
            request,
            status: TaskStatus::Pending,
            stage: None,
            ticks: 0,
            map: StageStatus::default(),
            reduce: StageStatus::default(),
            summarize: StageStatus::default(),
        }
    }

    pub fn advance(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.ticks += 1;

        if self.request.fail_after.is_some_and(|n| self.ticks >= n) {
            self.status = TaskStatus::Failed;
            self.stage = None;
            return;
        }

        match self.stage {
            None => {
                self.status = TaskStatus::Processing;
                self.stage = Some(MapReduceStage::GetInput);
            }
            Some(MapReduceStage::GetInput) => {
                self.map = started(self.request.map);
                self.stage = Some(MapReduceStage::Map);
            }
            Some(MapReduceStage::Map) => {
                if !drain_one(&mut self.map) {
                    self.stage = Some(MapReduceStage::Shuffle);
                }
            }
            Some(MapReduceStage::Shuffle) => {
                self.reduce = started(self.request.reduce);
                self.stage = Some(MapReduceStage::Reduce);
            }
            Some(MapReduceStage::Reduce) => {
                if !drain_one(&mut self.reduce) {
                    self.summarize = started(self.request.summarize);
                    self.stage = Some(MapReduceStage::Summarize);
                }
            }
            Some(MapReduceStage::Summarize) => {
                if !drain_one(&mut self.summarize) {
                    self.status = TaskStatus::Complete;
                    self.stage = None;
                }
            }
        }
    }

    fn active_stage(&self) -> Option<&StageStatus> {
        match self.stage? {
            MapReduceStage::Map => Some(&self.map),
            MapReduceStage::Reduce => Some(&self.reduce),
            MapReduceStage::Summarize => Some(&self.summarize),
            MapReduceStage::GetInput | MapReduceStage::Shuffle => None,
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let stage_percent_complete = match self.active_stage() {
            Some(s) if s.total > 0 => 100.0 * s.done() as f64 / s.total as f64,
            _ => 0.0,
        };
        // los conteos vienen directo del POST: nada de overflow
        let items = self
            .request
            .map
            .saturating_add(self.request.reduce)
            .saturating_add(self.request.summarize);

        StatusSnapshot {
            task_id: self.id.clone(),
            deployment_id: self.deployment_id.clone(),
            status: self.status,
            stage: self.stage,
            stage_percent_complete,
            size: items.saturating_mul(BYTES_PER_ITEM),
            map: self.map,
            reduce: self.reduce,
            summarize: self.summarize,
        }
    }
}
