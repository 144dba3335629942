use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use common::{StatusResponse, TaskCreated, TaskRequest};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/tasks", post(create_task))
        .route("/api/v1/status", get(get_status))
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// Crea una tarea simulada; el simulador la hace avanzar en segundo plano
async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<TaskRequest>,
) -> Json<TaskCreated> {
    let created = state.submit(req);
    info!("tarea {} creada", created.task_id);
    Json(created)
}

// Siempre responde 200: el resultado va en el envelope `success`.
// Acepta `taskId` o `taskid` (en ese orden).
async fn get_status(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<StatusResponse> {
    let task_id = params
        .get("taskId")
        .filter(|id| !id.is_empty())
        .or_else(|| params.get("taskid"))
        .cloned()
        .unwrap_or_default();

    let resp = match state.snapshot(&task_id) {
        Some(snapshot) if !task_id.is_empty() => StatusResponse::ok(snapshot),
        _ => {
            debug!("consulta de estado con task id inválido: {:?}", task_id);
            StatusResponse::error(format!("Invalid task id: {}", task_id))
        }
    };

    Json(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use common::TaskStatus;
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_responde_ok() {
        let app = build_router(AppState::new());
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn crear_y_consultar_tarea() {
        let state = AppState::new();
        let app = build_router(state.clone());

        let req = Request::post("/api/v1/tasks")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"map": 3, "reduce": 2}"#))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let created: TaskCreated = serde_json::from_slice(&body).unwrap();

        let (status, json) =
            get_json(app, &format!("/api/v1/status?taskId={}", created.task_id)).await;
        assert_eq!(status, StatusCode::OK);

        let snapshot = StatusResponse::parse(json.to_string().as_bytes()).unwrap();
        assert_eq!(snapshot.task_id, created.task_id);
        assert_eq!(snapshot.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn acepta_taskid_en_minusculas() {
        let state = AppState::new();
        let created = state.submit(TaskRequest::default());
        let app = build_router(state);

        let (_, json) =
            get_json(app, &format!("/api/v1/status?taskid={}", created.task_id)).await;
        assert_eq!(json["success"], true);
    }

    #[tokio::test]
    async fn taskid_en_ambas_formas_prefiere_camel_case() {
        let state = AppState::new();
        let created = state.submit(TaskRequest::default());
        let app = build_router(state);

        let uri = format!(
            "/api/v1/status?taskid=otra&taskId={}",
            created.task_id
        );
        let (status, json) = get_json(app, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["status"]["taskId"], created.task_id.as_str());
    }

    #[tokio::test]
    async fn crear_tarea_con_conteos_enormes_y_consultar() {
        let state = AppState::new();
        let created = state.submit(TaskRequest {
            map: u64::MAX,
            reduce: u64::MAX,
            summarize: u64::MAX,
            fail_after: None,
        });
        for _ in 0..3 {
            state.advance_all();
        }
        let app = build_router(state);

        let (status, json) =
            get_json(app, &format!("/api/v1/status?taskId={}", created.task_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
    }

    #[tokio::test]
    async fn task_id_desconocido_o_vacio() {
        let app = build_router(AppState::new());

        let (status, json) = get_json(app.clone(), "/api/v1/status?taskId=nope").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!({"success": false, "message": "Invalid task id: nope"})
        );

        let (_, json) = get_json(app, "/api/v1/status").await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Invalid task id: ");
    }
}
