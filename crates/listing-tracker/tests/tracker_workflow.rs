//! End-to-end scenarios for the integration tracker: markdown in, edits through the HTTP
//! router, markdown and CSV out.

mod common {
    use listing_tracker::catalog::RouteCatalog;
    use listing_tracker::tracker::{
        parse_document, InMemoryTrackerRepository, TrackerDocument, TrackerService,
    };
    use std::sync::Arc;

    pub(super) const TRACKER: &str = "\
# API Integration Status

Frontend screens wired to the rental-listing API.

_Last updated: 2025-05-30_

Status legend: Todo, In Progress, Blocked, In Review, Done, Deferred

## Auth

| Endpoint | Screen | Status | Owner | Blockers |
|---|---|---|---|---|
| `POST /api/v1/auth/login/` | Log in | Done | priya | |
| `POST /api/v1/auth/logout/` | Account menu | In Progress | sam | |

## Rooms

Listing CRUD lands after the photo upload work.

| Endpoint | Screen | Status | Owner | Blockers |
|---|---|---|---|---|
| `GET /api/v1/rooms/` | Browse rooms | In Review | sam | |
| `PATCH /api/v1/rooms/<int:pk>/` | Edit listing | Blocked | | Waiting on ownership checks |
| `POST /api/v1/rooms/{pk}/soft-delete/` | My listings | Deferred | | |
";

    pub(super) fn document() -> TrackerDocument {
        let parsed = parse_document(TRACKER);
        assert!(parsed.issues.is_empty(), "fixture issues: {:?}", parsed.issues);
        parsed.document
    }

    pub(super) fn service() -> (
        Arc<TrackerService<InMemoryTrackerRepository>>,
        Arc<InMemoryTrackerRepository>,
    ) {
        let repository = Arc::new(InMemoryTrackerRepository::new(document()));
        let service = Arc::new(TrackerService::with_catalog(
            repository.clone(),
            RouteCatalog::standard(),
        ));
        (service, repository)
    }
}

mod document {
    use super::common;
    use listing_tracker::catalog::RouteCatalog;
    use listing_tracker::tracker::{
        parse_document, read_csv, render_markdown, validate, write_csv, Endpoint, IssueKind,
        Status, TrackerSummary,
    };

    #[test]
    fn rows_carry_legend_statuses_and_method_paths() {
        let document = common::document();
        assert_eq!(document.title, "API Integration Status");
        assert_eq!(document.row_count(), 5);

        for (_, row) in document.rows() {
            assert!(Status::legend().contains(&row.status));
            let reparsed = Endpoint::parse(&row.endpoint.to_string()).expect("endpoint");
            assert_eq!(reparsed, row.endpoint);
            assert!(row.endpoint.path.starts_with('/'));
        }

        let sections: Vec<_> = document
            .sections
            .iter()
            .map(|section| (section.name.as_str(), section.rows.len()))
            .collect();
        assert_eq!(sections, [("Auth", 2), ("Rooms", 3)]);
    }

    #[test]
    fn rendered_markdown_parses_back_to_the_same_document() {
        let document = common::document();
        let rendered = render_markdown(&document);
        let reparsed = parse_document(&rendered);

        assert!(reparsed.issues.is_empty());
        assert_eq!(reparsed.document, document);
        assert_eq!(render_markdown(&reparsed.document), rendered);
    }

    #[test]
    fn csv_export_feeds_a_new_tracker() {
        let document = common::document();
        let mut buffer = Vec::new();
        write_csv(&document, &mut buffer).expect("csv written");

        let imported = read_csv(buffer.as_slice(), &document.title).expect("csv read");
        assert_eq!(imported.row_count(), document.row_count());
        let names: Vec<_> = imported.sections.iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, ["Auth", "Rooms"]);
        let (_, blocked) = imported
            .find(&Endpoint::parse("PATCH /api/v1/rooms/{pk}/").expect("endpoint"))
            .expect("row imported");
        assert_eq!(blocked.blockers.as_deref(), Some("Waiting on ownership checks"));
    }

    #[test]
    fn validation_compares_against_the_catalog() {
        let parsed = parse_document(common::TRACKER);
        let catalog = RouteCatalog::standard();
        let report = validate(&parsed, Some(&catalog));

        assert!(report.is_valid());
        assert_eq!(report.rows_checked, 5);
        assert_eq!(report.of_kind(IssueKind::UnknownRoute).count(), 0);
        assert_eq!(
            report.of_kind(IssueKind::UntrackedRoute).count(),
            catalog.routes().len() - 5
        );
    }

    #[test]
    fn summary_reports_progress_and_blockers() {
        let summary = TrackerSummary::from_document(&common::document());
        assert_eq!(summary.count(Status::Done), 1);
        assert_eq!(summary.blocked.len(), 1);
        assert_eq!(summary.blocked[0].section, "Rooms");
        assert_eq!(summary.overall_completion_pct, 25.0);
    }
}

mod http {
    use super::common;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use listing_tracker::tracker::{
        parse_document, render_markdown, tracker_router, Endpoint, Status,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(router: axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.oneshot(request).await.expect("router dispatch");
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        (status, body.to_vec())
    }

    fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn patch_updates_a_row_and_stamps_the_document() {
        let (service, repository) = common::service();
        let router = tracker_router(service);

        let (status, body) = send(
            router,
            json_request(
                "PATCH",
                "/api/v1/tracker/rows",
                json!({
                    "endpoint": "PATCH /api/v1/rooms/{id}/",
                    "status": "In Review",
                    "blockers": ""
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["status"], "in_review");
        assert!(payload.get("blockers").map_or(true, Value::is_null));

        let stored = repository.snapshot().expect("document stored");
        assert_ne!(stored.updated_on, common::document().updated_on);
        let (_, row) = stored
            .find(&Endpoint::parse("PATCH /api/v1/rooms/<int:pk>/").expect("endpoint"))
            .expect("row present");
        assert_eq!(row.status, Status::InReview);
        assert_eq!(row.blockers, None);
    }

    #[tokio::test]
    async fn patch_rejects_unknown_statuses_with_a_json_error() {
        let (service, repository) = common::service();
        let router = tracker_router(service);

        let (status, body) = send(
            router,
            json_request(
                "PATCH",
                "/api/v1/tracker/rows",
                json!({ "endpoint": "GET /api/v1/rooms/", "status": "Shipped" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let payload: Value = serde_json::from_slice(&body).expect("json error body");
        let message = payload["error"].as_str().expect("error message");
        assert!(message.contains("'Shipped' is not in the status legend"));
        assert_eq!(repository.snapshot(), Some(common::document()));
    }

    #[tokio::test]
    async fn post_rejects_sections_markdown_would_rewrite() {
        let (service, repository) = common::service();

        for section in ["C#", "#"] {
            let (status, body) = send(
                tracker_router(service.clone()),
                json_request(
                    "POST",
                    "/api/v1/tracker/rows",
                    json!({
                        "section": section,
                        "endpoint": "GET /api/v1/messages/threads/",
                        "screen": "Inbox"
                    }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "section {section:?}");
            let payload: Value = serde_json::from_slice(&body).expect("json");
            assert!(payload["error"].is_string());
        }
        assert_eq!(repository.snapshot(), Some(common::document()));

        let (status, _) = send(
            tracker_router(service.clone()),
            json_request(
                "POST",
                "/api/v1/tracker/rows",
                json!({
                    "section": "Messaging\ninbox",
                    "endpoint": "GET /api/v1/messages/threads/",
                    "screen": "Inbox"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let document = service.document().expect("document");
        let reparsed = parse_document(&render_markdown(&document));
        assert!(reparsed.issues.is_empty());
        assert_eq!(reparsed.document, document);
        assert!(document.section("Messaging inbox").is_some());
    }

    #[tokio::test]
    async fn post_adds_rows_and_rejects_duplicates() {
        let (service, _) = common::service();
        let payload = json!({
            "section": "Photos",
            "endpoint": "POST /api/v1/rooms/{pk}/photos/",
            "screen": "Listing photos",
            "owner": "priya"
        });

        let (status, body) = send(
            tracker_router(service.clone()),
            json_request("POST", "/api/v1/tracker/rows", payload.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(created["status"], "todo");

        let (status, _) = send(
            tracker_router(service.clone()),
            json_request("POST", "/api/v1/tracker/rows", payload),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let document = service.document().expect("document");
        assert_eq!(document.row_count(), 6);
        assert!(document.section("Photos").is_some());
    }

    #[tokio::test]
    async fn export_serves_csv() {
        let (service, _) = common::service();
        let (status, body) = send(
            tracker_router(service),
            Request::builder()
                .uri("/api/v1/tracker/export.csv")
                .body(Body::empty())
                .expect("request"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Section,Endpoint,Screen,Status,Owner,Blockers")
        );
        assert_eq!(lines.count(), 5);
    }

    #[tokio::test]
    async fn summary_and_validation_are_json() {
        let (service, _) = common::service();

        let (status, body) = send(
            tracker_router(service.clone()),
            Request::builder()
                .uri("/api/v1/tracker/summary")
                .body(Body::empty())
                .expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let summary: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(summary["total_rows"], 5);

        let (status, body) = send(
            tracker_router(service),
            Request::builder()
                .uri("/api/v1/tracker/validation")
                .body(Body::empty())
                .expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let report: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(report["valid"], true);
    }
}
