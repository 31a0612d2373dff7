use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

use crate::{handlers::rest, service::NoteService};

/// Builds the full HTTP surface: health check, notes resource, API docs.
pub fn build_router(service: Arc<NoteService>, cors_allow_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(rest::health_check))
        .route("/notes", post(rest::create_note).get(rest::get_all_notes))
        .route(
            "/notes/{id}",
            get(rest::get_one_note)
                .put(rest::update_note)
                .delete(rest::delete_note),
        )
        .merge(SwaggerUi::new("/docs").url("/openapi.json", rest::ApiDoc::openapi()))
        .with_state(service)
        .layer(cors_layer(cors_allow_origins))
        .layer(TraceLayer::new_for_http())
}

/// `*` anywhere in the list allows every origin by echoing it back, since a
/// literal wildcard cannot be combined with credentials. Otherwise only the
/// listed origins are allowed.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(AllowOrigin::mirror_request());
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use chrono::{DateTime, Utc};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use std::time::Duration;

    use crate::repository::tests::memory_repository;

    async fn app() -> Router {
        let service = NoteService::new(memory_repository().await);
        build_router(Arc::new(service), &["*".to_string()])
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, body)
    }

    fn timestamp(note: &Value, field: &str) -> DateTime<Utc> {
        serde_json::from_value(note[field].clone()).unwrap()
    }

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let app = app().await;

        let (status, body) = send(&app, Method::GET, "/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Healthy" }));
    }

    #[tokio::test]
    async fn groceries_lifecycle() {
        let app = app().await;

        let (status, created) = send(
            &app,
            Method::POST,
            "/notes",
            Some(json!({ "title": "Groceries", "content": "Milk, eggs" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);
        assert_eq!(created["content"], "Milk, eggs");
        assert_eq!(timestamp(&created, "created_at"), timestamp(&created, "updated_at"));

        tokio::time::sleep(Duration::from_millis(5)).await;

        let (status, updated) = send(
            &app,
            Method::PUT,
            "/notes/1",
            Some(json!({ "content": "Milk, eggs, bread" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Groceries");
        assert_eq!(updated["content"], "Milk, eggs, bread");
        assert!(timestamp(&updated, "updated_at") > timestamp(&created, "updated_at"));
        assert_eq!(updated["created_at"], created["created_at"]);

        let (status, body) = send(&app, Method::DELETE, "/notes/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, body) = send(&app, Method::GET, "/notes/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "detail": "Note not found" }));

        let (status, _) = send(&app, Method::DELETE, "/notes/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_defaults_content_and_round_trips() {
        let app = app().await;

        let (status, created) =
            send(&app, Method::POST, "/notes", Some(json!({ "title": "T" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["content"], "");

        let uri = format!("/notes/{}", created["id"]);
        let (status, fetched) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_rejects_bad_bodies() {
        let app = app().await;

        let (status, body) = send(&app, Method::POST, "/notes", Some(json!({ "title": "" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"][0]["loc"], json!(["body", "title"]));

        let long_title = "x".repeat(256);
        let (status, _) =
            send(&app, Method::POST, "/notes", Some(json!({ "title": long_title }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) =
            send(&app, Method::POST, "/notes", Some(json!({ "content": "no title" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"][0]["loc"], json!(["body"]));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/notes")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let (status, notes) = send(&app, Method::GET, "/notes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(notes, json!([]));
    }

    #[tokio::test]
    async fn update_validates_and_checks_existence() {
        let app = app().await;
        send(&app, Method::POST, "/notes", Some(json!({ "title": "T", "content": "C" }))).await;

        let (status, _) = send(&app, Method::PUT, "/notes/1", Some(json!({ "title": "" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&app, Method::PUT, "/notes/99", Some(json!({ "title": "X" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, updated) =
            send(&app, Method::PUT, "/notes/1", Some(json!({ "content": "" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "T");
        assert_eq!(updated["content"], "");
    }

    #[tokio::test]
    async fn identifiers_must_be_positive_integers() {
        let app = app().await;

        for uri in ["/notes/0", "/notes/-3", "/notes/abc"] {
            let (status, body) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
            assert_eq!(body["detail"][0]["loc"][0], "path");
        }

        let (status, _) = send(&app, Method::DELETE, "/notes/0", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn list_paginates_and_checks_bounds() {
        let app = app().await;
        for title in ["a", "b", "c"] {
            send(&app, Method::POST, "/notes", Some(json!({ "title": title }))).await;
        }

        let (_, first) = send(&app, Method::GET, "/notes?skip=0&limit=2", None).await;
        let (_, second) = send(&app, Method::GET, "/notes?skip=2&limit=2", None).await;
        let titles: Vec<&Value> = first
            .as_array()
            .unwrap()
            .iter()
            .chain(second.as_array().unwrap())
            .map(|note| &note["title"])
            .collect();
        assert_eq!(titles, [&json!("a"), &json!("b"), &json!("c")]);

        let (status, all) = send(&app, Method::GET, "/notes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all.as_array().unwrap().len(), 3);

        for uri in ["/notes?limit=1001", "/notes?limit=0", "/notes?skip=-1", "/notes?limit=ten"] {
            let (status, body) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
            assert_eq!(body["detail"][0]["loc"][0], "query");
        }

        let (status, _) = send(&app, Method::GET, "/notes?limit=1000", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = app().await;

        let (status, doc) = send(&app, Method::GET, "/openapi.json", None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/notes/{id}"].is_object());
    }

    /// Returns the `Access-Control-Allow-Origin` and
    /// `Access-Control-Allow-Credentials` headers of a cross-origin request.
    async fn cors_headers(origins: &[&str], origin: &str) -> (Option<String>, Option<String>) {
        let origins: Vec<String> = origins.iter().map(ToString::to_string).collect();
        let app = build_router(
            Arc::new(NoteService::new(memory_repository().await)),
            &origins,
        );
        let request = Request::builder()
            .uri("/")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let header_value = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .map(|value: &HeaderValue| value.to_str().unwrap().to_string())
        };

        (
            header_value(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            header_value(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
        )
    }

    #[tokio::test]
    async fn cors_echoes_any_origin_with_credentials_by_default() {
        let (allowed, credentials) = cors_headers(&["*"], "http://anywhere.test").await;

        assert_eq!(allowed.as_deref(), Some("http://anywhere.test"));
        assert_eq!(credentials.as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn cors_restricts_to_listed_origins() {
        let listed = ["http://localhost:3000"];

        let (allowed, credentials) = cors_headers(&listed, "http://localhost:3000").await;
        let (denied, _) = cors_headers(&listed, "http://evil.test").await;

        assert_eq!(allowed.as_deref(), Some("http://localhost:3000"));
        assert_eq!(credentials.as_deref(), Some("true"));
        assert_eq!(denied, None);
    }
}
