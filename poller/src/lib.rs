//! Motor de polling del estado de una tarea map/reduce.
//!
//! - [`Poller`]: loop de consultas con intervalo y tolerancia a errores.
//! - [`StatusProvider`]: de dónde sale cada snapshot (HTTP, closure, etc.).
//! - [`EngineState`]: lo que ve quien se suscribe.

pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod provider;

pub use config::PollerConfig;
pub use engine::{EngineState, Poller, StateStream};
pub use error::PollError;
pub use http::{HttpProviderConfig, HttpStatusProvider};
pub use provider::{provider_fn, FnProvider, StatusProvider};
