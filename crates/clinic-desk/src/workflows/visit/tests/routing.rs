use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::http::{USER_EMAIL_HEADER, USER_ID_HEADER};
use crate::workflows::visit::visit_router;

fn signed_in(builder: axum::http::request::Builder) -> axum::http::request::Builder {
    builder
        .header(USER_ID_HEADER, "uid-reception")
        .header(USER_EMAIL_HEADER, "front.desk@clinic.in")
}

#[tokio::test]
async fn register_and_check_out_over_http() {
    let (service, _, _) = build_service();
    let router = visit_router(Arc::new(service));

    let created = router
        .clone()
        .oneshot(
            signed_in(Request::post("/api/v1/visits"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&walk_in()).unwrap()))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);
    let payload = read_json_body(created).await;
    let id = payload["id"].as_str().expect("id").to_string();

    let checked_out = router
        .clone()
        .oneshot(
            signed_in(Request::post(format!("/api/v1/visits/{id}/check-out")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(checked_out.status(), StatusCode::OK);
    let payload = read_json_body(checked_out).await;
    assert_eq!(payload["status"], "checked_out");

    let again = router
        .oneshot(
            signed_in(Request::post(format!("/api/v1/visits/{id}/check-out")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(again.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn mutations_require_a_signed_in_user() {
    let (service, _, _) = build_service();
    let visit = service.register(walk_in(), &receptionist()).expect("registered");
    let router = visit_router(Arc::new(service));

    let response = router
        .oneshot(
            Request::post(format!("/api/v1/visits/{}/toggle", visit.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_visit_is_not_found() {
    let (service, _, _) = build_service();
    let router = visit_router(Arc::new(service));

    let response = router
        .oneshot(
            Request::get("/api/v1/visits/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
