use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Local;
use serde_json::json;

use super::csv_io::write_csv;
use super::repository::{RepositoryError, TrackerRepository};
use super::service::{NewRowRequest, RowUpdateRequest, TrackerService, TrackerServiceError};
use super::TrackerError;

/// Router builder exposing the tracker document, its summary and row edits.
pub fn tracker_router<R>(service: Arc<TrackerService<R>>) -> Router
where
    R: TrackerRepository + 'static,
{
    Router::new()
        .route("/api/v1/tracker", get(document_handler::<R>))
        .route("/api/v1/tracker/summary", get(summary_handler::<R>))
        .route("/api/v1/tracker/validation", get(validation_handler::<R>))
        .route(
            "/api/v1/tracker/rows",
            axum::routing::patch(update_row_handler::<R>).post(add_row_handler::<R>),
        )
        .route("/api/v1/tracker/export.csv", get(export_handler::<R>))
        .with_state(service)
}

pub(crate) async fn document_handler<R>(State(service): State<Arc<TrackerService<R>>>) -> Response
where
    R: TrackerRepository + 'static,
{
    match service.document() {
        Ok(document) => (StatusCode::OK, axum::Json(document)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn summary_handler<R>(State(service): State<Arc<TrackerService<R>>>) -> Response
where
    R: TrackerRepository + 'static,
{
    match service.summary() {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn validation_handler<R>(
    State(service): State<Arc<TrackerService<R>>>,
) -> Response
where
    R: TrackerRepository + 'static,
{
    match service.validate() {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_row_handler<R>(
    State(service): State<Arc<TrackerService<R>>>,
    payload: Result<axum::Json<RowUpdateRequest>, JsonRejection>,
) -> Response
where
    R: TrackerRepository + 'static,
{
    let axum::Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    let today = Local::now().date_naive();
    match service.update_row(request, today) {
        Ok(row) => (StatusCode::OK, axum::Json(row)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn add_row_handler<R>(
    State(service): State<Arc<TrackerService<R>>>,
    payload: Result<axum::Json<NewRowRequest>, JsonRejection>,
) -> Response
where
    R: TrackerRepository + 'static,
{
    let axum::Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    let today = Local::now().date_naive();
    match service.add_row(request, today) {
        Ok(row) => (StatusCode::CREATED, axum::Json(row)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_handler<R>(State(service): State<Arc<TrackerService<R>>>) -> Response
where
    R: TrackerRepository + 'static,
{
    let document = match service.document() {
        Ok(document) => document,
        Err(err) => return error_response(err),
    };

    let mut buffer = Vec::new();
    match write_csv(&document, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            buffer,
        )
            .into_response(),
        Err(err) => error_response(TrackerServiceError::Tracker(err)),
    }
}

fn error_response(err: TrackerServiceError) -> Response {
    let status = match &err {
        TrackerServiceError::Endpoint(_)
        | TrackerServiceError::Tracker(
            TrackerError::EmptyField(_)
            | TrackerError::InvalidHeading { .. }
            | TrackerError::EmptyUpdate,
        ) => StatusCode::BAD_REQUEST,
        TrackerServiceError::Tracker(TrackerError::RowNotFound(_))
        | TrackerServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        TrackerServiceError::Tracker(TrackerError::DuplicateEndpoint { .. }) => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "tracker request failed");
    }

    error_body(status, err.to_string())
}

/// Malformed or mistyped JSON bodies, including statuses outside the legend.
fn rejection_response(rejection: JsonRejection) -> Response {
    error_body(StatusCode::BAD_REQUEST, rejection.body_text())
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RouteCatalog;
    use crate::tracker::domain::{Status, TrackerDocument};
    use crate::tracker::repository::InMemoryTrackerRepository;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    struct UnavailableRepository;

    impl TrackerRepository for UnavailableRepository {
        fn load(&self) -> Result<TrackerDocument, RepositoryError> {
            Err(RepositoryError::Unavailable("disk offline".to_string()))
        }

        fn save(&self, _document: &TrackerDocument) -> Result<(), RepositoryError> {
            Err(RepositoryError::Unavailable("disk offline".to_string()))
        }
    }

    fn seeded_service() -> Arc<TrackerService<InMemoryTrackerRepository>> {
        let document = RouteCatalog::standard().seed_document("API Integration Status");
        Arc::new(TrackerService::new(Arc::new(
            InMemoryTrackerRepository::new(document),
        )))
    }

    #[tokio::test]
    async fn update_handler_maps_missing_rows_to_not_found() {
        let request = RowUpdateRequest {
            endpoint: "GET /api/v1/unknown/".to_string(),
            status: Some(Status::Done),
            owner: None,
            blockers: None,
        };
        let response = update_row_handler(State(seeded_service()), Ok(axum::Json(request))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_handler_maps_bad_endpoints_to_bad_request() {
        let request = RowUpdateRequest {
            endpoint: "SEND /api/v1/messages/".to_string(),
            status: None,
            owner: None,
            blockers: None,
        };
        let response = update_row_handler(State(seeded_service()), Ok(axum::Json(request))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn repository_failures_are_internal_errors() {
        let service = Arc::new(TrackerService::new(Arc::new(UnavailableRepository)));
        let response = summary_handler(State(service)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn add_handler_rejects_blank_screens() {
        let request = NewRowRequest {
            section: "Rooms".to_string(),
            endpoint: "PUT /api/v1/rooms/{pk}/".to_string(),
            screen: "   ".to_string(),
            status: None,
            owner: None,
            blockers: None,
        };
        let response = add_row_handler(State(seeded_service()), Ok(axum::Json(request))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn add_handler_rejects_sections_that_cannot_be_headings() {
        let request = NewRowRequest {
            section: "C#".to_string(),
            endpoint: "PUT /api/v1/rooms/{pk}/".to_string(),
            screen: "Edit listing".to_string(),
            status: None,
            owner: None,
            blockers: None,
        };
        let response = add_row_handler(State(seeded_service()), Ok(axum::Json(request))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_handler_rejects_empty_updates() {
        let request = RowUpdateRequest {
            endpoint: "GET /api/v1/rooms/".to_string(),
            status: None,
            owner: None,
            blockers: None,
        };
        let response = update_row_handler(State(seeded_service()), Ok(axum::Json(request))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_tracker_document_is_not_found() {
        let service = Arc::new(TrackerService::new(Arc::new(
            InMemoryTrackerRepository::default(),
        )));
        let response = document_handler(State(service)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), 1024).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["error"], "tracker document not found");
    }

    #[tokio::test]
    async fn unknown_statuses_get_a_json_bad_request() {
        let request = Request::builder()
            .method("PATCH")
            .uri("/api/v1/tracker/rows")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "endpoint": "GET /api/v1/rooms/", "status": "Shipped" }).to_string(),
            ))
            .expect("request");

        let response = tracker_router(seeded_service())
            .oneshot(request)
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), 4096).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        let message = payload["error"].as_str().expect("error message");
        assert!(message.contains("status legend"), "message: {message}");
    }
}
