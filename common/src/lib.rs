//! Tipos compartidos entre master, poller y client:
//! snapshot de estado, envelope de respuesta y proyección de progreso.

pub mod progress;
pub mod response;
pub mod snapshot;
pub mod task;

pub use progress::{
    observe_error_message, percent_complete, project, title_for, Indicator, ProgressView,
    StageDisplay, StageLabel,
};
pub use response::{EnvelopeError, StatusResponse};
pub use snapshot::{MapReduceStage, SnapshotError, StageStatus, StatusSnapshot, TaskId, TaskStatus};
pub use task::{TaskCreated, TaskRequest};
