use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use spycat_core::BreedCatalog;
use spycat_store::{Database, StoreResult};
use tracing::info;

mod cats;
mod dto;
mod error;
mod missions;

pub use error::{ApiError, ApiResult};

use dto::HealthDto;

pub struct AppState {
    db: Database,
    breeds: Arc<dyn BreedCatalog>,
}

impl AppState {
    pub fn new(db: Database, breeds: Arc<dyn BreedCatalog>) -> Self {
        Self { db, breeds }
    }

    /// Runs one store operation on the blocking pool. The operation opens its
    /// own connection and either commits whole or rolls back.
    async fn run<T, F>(&self, op: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|err| ApiError::internal(format!("store task failed: {err}")))?
            .map_err(ApiError::from)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/cat", post(cats::create_cat).get(cats::list_cats))
        .route("/cat/{id}", get(cats::get_cat).delete(cats::delete_cat))
        .route("/cat/{id}/salary", put(cats::update_salary))
        .route(
            "/mission",
            post(missions::create_mission).get(missions::list_missions),
        )
        .route(
            "/mission/{id}",
            get(missions::get_mission).delete(missions::delete_mission),
        )
        .route("/mission/{id}/complete", put(missions::complete_mission))
        .route("/mission/{id}/assign-cat", post(missions::assign_cat))
        .route("/mission/{id}/targets", post(missions::add_target))
        .route(
            "/mission/targets/{target_id}/notes",
            put(missions::update_target_notes),
        )
        .route(
            "/mission/targets/{target_id}/complete",
            put(missions::complete_target),
        )
        .route(
            "/mission/targets/{target_id}",
            axum::routing::delete(missions::delete_target),
        )
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

pub async fn serve(bind_addr: &str, state: AppState) -> Result<()> {
    let app = router(Arc::new(state));
    let addr: SocketAddr = bind_addr
        .parse()
        .with_context(|| format!("invalid bind address: {bind_addr}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "spycat api listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<HealthDto> {
    Json(HealthDto { status: "ok" })
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(req).await;
    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    response
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Method, StatusCode};
    use serde_json::{Value, json};
    use spycat_core::StaticBreedCatalog;
    use tempfile::{TempDir, tempdir};
    use tower::ServiceExt;

    use super::*;

    fn test_app() -> (TempDir, Router) {
        let tmp = tempdir().expect("tempdir");
        let db = Database::open(&tmp.path().join("spycat.db"), Duration::from_secs(2))
            .expect("open database");
        let breeds = Arc::new(StaticBreedCatalog::new(["Siamese", "Bengal"]));
        (tmp, router(Arc::new(AppState::new(db, breeds))))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create_cat(app: &Router, name: &str) -> i64 {
        let (status, body) = call(
            app,
            Method::POST,
            "/cat",
            Some(json!({"name": name, "years_of_experience": 3, "breed": "Siamese", "salary": 900.0})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().expect("cat id")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (_tmp, app) = test_app();
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_breed_is_rejected_before_storage() {
        let (_tmp, app) = test_app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/cat",
            Some(json!({"name": "Rex", "experience_in_years": 2, "breed": "Dragon", "salary": 10.0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap_or_default().contains("breed"));

        let (_, cats) = call(&app, Method::GET, "/cat", None).await;
        assert_eq!(cats, json!([]));
    }

    #[tokio::test]
    async fn cat_endpoints_map_missing_rows_to_404() {
        let (_tmp, app) = test_app();
        let id = create_cat(&app, "Tom").await;

        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("/cat/{id}/salary"),
            Some(json!({"salary": 1500.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, cat) = call(&app, Method::GET, &format!("/cat/{id}"), None).await;
        assert_eq!(cat["salary"], 1500.0);

        let (status, _) = call(&app, Method::DELETE, &format!("/cat/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, Method::DELETE, &format!("/cat/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::GET, "/cat/-3", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn assigned_mission_delete_is_a_conflict() {
        let (_tmp, app) = test_app();
        let cat_id = create_cat(&app, "Tom").await;
        let (status, mission) = call(&app, Method::POST, "/mission", Some(json!({"targets": []}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(mission["targets"], json!([]));
        let mission_id = mission["id"].as_i64().expect("mission id");

        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/mission/{mission_id}/assign-cat"),
            Some(json!({"cat_id": cat_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, Method::DELETE, &format!("/mission/{mission_id}"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "invariant violation: assigned");

        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/mission/{mission_id}/assign-cat"),
            Some(json!({"cat_id": cat_id})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn target_lifecycle_over_http() {
        let (_tmp, app) = test_app();
        let (_, mission) = call(
            &app,
            Method::POST,
            "/mission",
            Some(json!({
                "cat_id": null,
                "completed": true,
                "targets": [{"name": "Bird", "country": "FR", "notes": "", "complete": false}]
            })),
        )
        .await;
        assert_eq!(mission["completed"], false);
        let mission_id = mission["id"].as_i64().expect("mission id");
        let target_id = mission["targets"][0]["id"].as_i64().expect("target id");

        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("/mission/targets/{target_id}/notes"),
            Some(json!({"notes": "on the roof"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("/mission/targets/{target_id}/complete"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("/mission/targets/{target_id}/notes"),
            Some(json!({"notes": "new"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(&app, Method::DELETE, &format!("/mission/targets/{target_id}"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, loaded) = call(&app, Method::GET, &format!("/mission/{mission_id}"), None).await;
        assert_eq!(loaded["targets"][0]["notes"], "on the roof");
        assert_eq!(loaded["targets"][0]["complete"], true);
    }

    #[tokio::test]
    async fn completed_mission_rejects_new_targets() {
        let (_tmp, app) = test_app();
        let (_, mission) = call(&app, Method::POST, "/mission", Some(json!({}))).await;
        let mission_id = mission["id"].as_i64().expect("mission id");

        let (status, target) = call(
            &app,
            Method::POST,
            &format!("/mission/{mission_id}/targets"),
            Some(json!({"name": "Fish", "country": "JP"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(target["notes"], "");

        let (status, _) = call(&app, Method::PUT, &format!("/mission/{mission_id}/complete"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/mission/{mission_id}/targets"),
            Some(json!({"name": "Dog", "country": "US"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(&app, Method::POST, "/mission/999/targets", Some(json!({"name": "x", "country": "y"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn locked_database_returns_retryable_500() {
        let tmp = tempdir().expect("tempdir");
        let db = Database::open(&tmp.path().join("spycat.db"), Duration::from_millis(200))
            .expect("open database");
        let lock = db.connect().expect("lock connection");
        let app = router(Arc::new(AppState::new(
            db,
            Arc::new(StaticBreedCatalog::permissive()),
        )));

        lock.execute_batch("BEGIN IMMEDIATE;").expect("hold write lock");
        let (status, body) = call(&app, Method::POST, "/mission", Some(json!({"targets": []}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal error");
        assert_eq!(body["retryable"], true);

        lock.execute_batch("ROLLBACK;").expect("release write lock");
        let (status, body) = call(&app, Method::POST, "/mission", Some(json!({"targets": []}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.get("retryable").is_none());
        let (_, missions) = call(&app, Method::GET, "/mission", None).await;
        assert_eq!(missions.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn malformed_input_is_a_bad_request() {
        let (_tmp, app) = test_app();
        let (status, _) = call(&app, Method::GET, "/mission/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, Method::POST, "/mission/1/assign-cat", Some(json!({"cat": 1}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap_or_default().starts_with("invalid request body"));

        let (status, _) = call(&app, Method::DELETE, "/mission/7", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
