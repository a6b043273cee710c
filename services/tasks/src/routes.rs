//! Task service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware},
    models::{ReplaceTasksRequest, ReplaceTasksResponse, TaskListResponse},
    state::AppState,
};

/// Create the router for the task service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/tasks", get(list_tasks).post(replace_tasks))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "tasks-service"
    }))
}

/// Get the caller's tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks = state.task_repository.list(&user.username).await?;

    Ok(Json(TaskListResponse {
        username: user.username,
        tasks,
    }))
}

/// Replace the caller's tasks
pub async fn replace_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<ReplaceTasksRequest>, ApiError>,
) -> ApiResult<Json<ReplaceTasksResponse>> {
    info!(
        "Replacing tasks for {} with {} entries",
        user.username,
        payload.tasks.len()
    );

    let ack = state
        .task_repository
        .replace(&user.username, &payload.tasks)
        .await?;

    Ok(Json(ReplaceTasksResponse {
        message: "Tasks updated successfully".to_string(),
        username: ack.username,
        count: ack.count,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use chrono::Utc;
    use common::error::StoreResult;
    use common::secrets::{MemorySecretStore, SIGNING_SECRET_NAME};
    use common::table::{MemoryTableStore, TableEntity, TableStore};
    use common::timeout::Bounded;
    use common::token::TokenService;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::repositories::TaskRepository;

    fn state_with(table: Arc<dyn TableStore>) -> AppState {
        let secrets = Arc::new(MemorySecretStore::with_secrets([(
            SIGNING_SECRET_NAME,
            "signing-key",
        )]));
        AppState {
            token_service: TokenService::new(secrets),
            task_repository: TaskRepository::new(table),
        }
    }

    fn test_state() -> AppState {
        state_with(Arc::new(MemoryTableStore::new()))
    }

    async fn token_for(state: &AppState, username: &str) -> String {
        state.token_service.issue(username).await.unwrap().token
    }

    async fn send(
        state: &AppState,
        method: &str,
        authorization: Option<String>,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri("/api/tasks");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn new_owner_gets_an_empty_list() {
        let state = test_state();
        let token = token_for(&state, "alice").await;

        let (status, body) = send(&state, "GET", Some(format!("Bearer {token}")), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["tasks"], json!([]));
    }

    #[tokio::test]
    async fn saved_tasks_are_listed_for_the_token_owner() {
        let state = test_state();
        let token = format!("Bearer {}", token_for(&state, "alice").await);

        let (status, body) = send(
            &state,
            "POST",
            Some(token.clone()),
            Some(r#"{"tasks":[{"name":"write report","status":"In Progress"}]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Tasks updated successfully");
        assert_eq!(body["username"], "alice");
        assert_eq!(body["count"], 1);

        let (status, body) = send(&state, "GET", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["tasks"],
            json!([{"name": "write report", "status": "In Progress"}])
        );

        let bob = format!("Bearer {}", token_for(&state, "bob").await);
        let (_, body) = send(&state, "GET", Some(bob), None).await;
        assert_eq!(body["tasks"], json!([]));
    }

    #[tokio::test]
    async fn invalid_status_is_rejected_and_list_unchanged() {
        let state = test_state();
        let token = format!("Bearer {}", token_for(&state, "alice").await);
        send(
            &state,
            "POST",
            Some(token.clone()),
            Some(r#"{"tasks":[{"name":"keep","status":"Completed"}]}"#),
        )
        .await;

        let (status, body) = send(
            &state,
            "POST",
            Some(token.clone()),
            Some(r#"{"tasks":[{"name":"new","status":"Done"}]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "task status must be one of Not Started, In Progress, Completed"
        );

        let (_, body) = send(&state, "GET", Some(token), None).await;
        assert_eq!(body["tasks"], json!([{"name": "keep", "status": "Completed"}]));
    }

    #[tokio::test]
    async fn malformed_bodies_are_bad_requests() {
        let state = test_state();
        let token = format!("Bearer {}", token_for(&state, "alice").await);

        for body in [r#"{}"#, r#"{"tasks":"nope"}"#, r#"{"tasks":["#] {
            let (status, json) = send(&state, "POST", Some(token.clone()), Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn requests_without_a_valid_bearer_token_are_unauthorized() {
        let state = test_state();
        let token = token_for(&state, "alice").await;

        for authorization in [
            None,
            Some(format!("Basic {token}")),
            Some("Bearer not.a.jwt".to_string()),
            Some(token.clone()),
        ] {
            let (status, body) = send(&state, "GET", authorization.clone(), None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{authorization:?}");
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let state = test_state();
        let issued = state
            .token_service
            .issue_at("alice", Utc::now() - chrono::Duration::seconds(3601))
            .await
            .unwrap();

        let (status, body) = send(
            &state,
            "POST",
            Some(format!("Bearer {}", issued.token)),
            Some(r#"{"tasks":[]}"#),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn token_signed_with_another_key_is_unauthorized() {
        let state = test_state();
        let foreign = TokenService::new(Arc::new(MemorySecretStore::with_secrets([(
            SIGNING_SECRET_NAME,
            "some-other-key",
        )])));
        let token = foreign.issue("alice").await.unwrap().token;

        let (status, _) = send(&state, "GET", Some(format!("Bearer {token}")), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    struct HungTable;

    #[async_trait::async_trait]
    impl TableStore for HungTable {
        async fn list_partition(&self, _partition_key: &str) -> StoreResult<Vec<TableEntity>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }

        async fn delete_row(&self, _partition_key: &str, _row_key: &str) -> StoreResult<()> {
            Ok(())
        }

        async fn insert_row(&self, _entity: &TableEntity) -> StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn hung_table_store_is_service_unavailable() {
        let table = Arc::new(Bounded::new(Arc::new(HungTable), Duration::from_millis(20)));
        let state = state_with(table);
        let token = format!("Bearer {}", token_for(&state, "alice").await);

        let (status, body) = send(&state, "GET", Some(token), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Service temporarily unavailable");
    }

    #[tokio::test]
    async fn health_needs_no_token() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = create_router(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
