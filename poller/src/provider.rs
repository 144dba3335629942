use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use common::StatusSnapshot;

use crate::error::PollError;

/// Fuente de snapshots. Cualquier falla (timeout, respuesta rara, error de
/// transporte) se reporta como un único `PollError` con mensaje legible.
#[async_trait]
pub trait StatusProvider: Send + Sync {
    async fn fetch_status(&self, task_id: &str) -> Result<StatusSnapshot, PollError>;
}

#[async_trait]
impl<P: StatusProvider + ?Sized> StatusProvider for Arc<P> {
    async fn fetch_status(&self, task_id: &str) -> Result<StatusSnapshot, PollError> {
        (**self).fetch_status(task_id).await
    }
}

/// Adapta una closure async como proveedor.
pub struct FnProvider<F> {
    f: F,
}

pub fn provider_fn<F, Fut>(f: F) -> FnProvider<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StatusSnapshot, PollError>> + Send,
{
    FnProvider { f }
}

#[async_trait]
impl<F, Fut> StatusProvider for FnProvider<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StatusSnapshot, PollError>> + Send,
{
    async fn fetch_status(&self, task_id: &str) -> Result<StatusSnapshot, PollError> {
        (self.f)(task_id.to_string()).await
    }
}
