use std::time::Duration;

use async_trait::async_trait;
use common::{StatusResponse, StatusSnapshot};
use reqwest::{Client, Url};
use tracing::debug;

use crate::error::PollError;
use crate::provider::StatusProvider;

#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// Endpoint de estado, ej: http://localhost:8080/api/v1/status
    pub status_url: String,
    pub request_timeout: Duration,
}

impl HttpProviderConfig {
    pub fn new(status_url: impl Into<String>) -> Self {
        Self {
            status_url: status_url.into(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Proveedor que consulta el endpoint de estado por HTTP:
/// `GET <status_url>?taskId=<id>` y espera el envelope `{success, status|message}`.
#[derive(Debug, Clone)]
pub struct HttpStatusProvider {
    client: Client,
    status_url: Url,
}

impl HttpStatusProvider {
    pub fn new(config: HttpProviderConfig) -> Result<Self, PollError> {
        let status_url = Url::parse(&config.status_url).map_err(|e| {
            PollError::InvalidConfiguration(format!(
                "invalid status url {}: {}",
                config.status_url, e
            ))
        })?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PollError::InvalidConfiguration(e.to_string()))?;

        Ok(Self { client, status_url })
    }

    /// Agrega `taskId` respetando la query que ya tenga la URL.
    fn url_for(&self, task_id: &str) -> Url {
        let mut url = self.status_url.clone();
        url.query_pairs_mut().append_pair("taskId", task_id);
        url
    }
}

#[async_trait]
impl StatusProvider for HttpStatusProvider {
    async fn fetch_status(&self, task_id: &str) -> Result<StatusSnapshot, PollError> {
        let url = self.url_for(task_id);
        debug!("GET {}", url);

        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PollError::Provider(format!(
                "Unexpected response code: {} {}.",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }

        let body = resp.bytes().await?;
        Ok(StatusResponse::parse(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{StageStatus, TaskStatus};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn snapshot_json(status: &str) -> serde_json::Value {
        json!({
            "taskId": "t1",
            "deploymentId": "d1",
            "status": status,
            "stage": null,
            "stagePercentComplete": 0,
            "size": 0,
            "map": { "pending": 1, "pendingBytes": 0, "total": 2 },
            "reduce": { "pending": 0, "pendingBytes": 0, "total": 0 },
            "summarize": { "pending": 0, "pendingBytes": 0, "total": 0 }
        })
    }

    async fn provider_for(server: &MockServer, suffix: &str) -> HttpStatusProvider {
        let url = format!("{}/api/v1/status{}", server.uri(), suffix);
        HttpStatusProvider::new(HttpProviderConfig::new(url)).unwrap()
    }

    #[tokio::test]
    async fn devuelve_snapshot_en_respuesta_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/status"))
            .and(query_param("taskId", "t1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "status": snapshot_json("PENDING")})),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server, "").await;
        let snap = provider.fetch_status("t1").await.unwrap();

        assert_eq!(snap.status, TaskStatus::Pending);
        assert_eq!(snap.map, StageStatus::new(1, 0, 2));
    }

    #[tokio::test]
    async fn respeta_query_existente() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/status"))
            .and(query_param("embedded", "1"))
            .and(query_param("taskId", "t1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "status": snapshot_json("COMPLETE")})),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server, "?embedded=1").await;
        let snap = provider.fetch_status("t1").await.unwrap();
        assert_eq!(snap.status, TaskStatus::Complete);
    }

    #[tokio::test]
    async fn codigo_no_exitoso_es_falla_del_proveedor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = provider_for(&server, "").await;
        let err = provider.fetch_status("t1").await.unwrap_err();

        assert_eq!(
            err,
            PollError::Provider("Unexpected response code: 500 Internal Server Error.".into())
        );
    }

    #[tokio::test]
    async fn success_false_propaga_el_mensaje() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "message": "Invalid task id: t1"})),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server, "").await;
        let err = provider.fetch_status("t1").await.unwrap_err();

        assert_eq!(err, PollError::Provider("Invalid task id: t1".into()));
    }

    #[tokio::test]
    async fn cuerpo_fuera_del_envelope_es_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let provider = provider_for(&server, "").await;
        let err = provider.fetch_status("t1").await.unwrap_err();

        assert!(matches!(err, PollError::MalformedResponse(_)));
    }

    #[test]
    fn url_invalida_es_error_de_configuracion() {
        let err = HttpStatusProvider::new(HttpProviderConfig::new("no es una url")).unwrap_err();
        assert!(matches!(err, PollError::InvalidConfiguration(_)));
    }
}
