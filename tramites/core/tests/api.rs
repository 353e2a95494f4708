// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP routes driven through the router with in-memory gateways.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use common::*;
use tramites_core::application::Portal;
use tramites_core::presentation::api::{app, router, AppState, SESSION_HEADER};

struct TestApp {
    router: Router,
    gateways: Arc<FakeGateways>,
}

fn test_app() -> TestApp {
    let gateways = Arc::new(FakeGateways::default());
    let portal = Portal::new(config(), reqwest::Client::new(), gateways.clone(), None).unwrap();
    TestApp {
        router: app(Arc::new(portal)),
        gateways,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec(), headers)
}

async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body, _) = send(router, request).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

/// Signs in with a bearer token the fake gateways read back as the email
async fn sign_in(router: &Router, email: &str) -> String {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/session")
        .header(header::AUTHORIZATION, format!("Bearer {}", email))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(router, request).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["session_id"].as_str().unwrap().to_string()
}

fn authed(method: Method, uri: &str, session: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(SESSION_HEADER, session);
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn free_form_json(email: &str) -> Value {
    serde_json::to_value(free_form_fields(email)).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send_json(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["sessions"], 0);
}

#[tokio::test]
async fn test_lists_the_five_forms() {
    let app = test_app();
    let request = Request::builder().uri("/api/forms").body(Body::empty()).unwrap();
    let (status, body) = send_json(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys.len(), 5);
    assert!(keys.contains(&"apoyo_academico"));
    assert!(keys.contains(&"solicitud_libre"));
}

#[tokio::test]
async fn test_unknown_form_is_not_found() {
    let app = test_app();
    let request = Request::builder().uri("/api/forms/beca").body(Body::empty()).unwrap();
    let (status, body) = send_json(&app.router, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "generic");
}

#[tokio::test]
async fn test_form_page_prefills_signed_in_user() {
    let app = test_app();
    let session = sign_in(&app.router, "ana.lopez@uv.mx").await;

    let (status, body, headers) = send(
        &app.router,
        authed(Method::GET, "/forms/solicitud_libre", &session, None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("ana.lopez@uv.mx"));
}

#[tokio::test]
async fn test_sign_in_requires_bearer_token() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/session")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app.router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "auth_expired");
}

#[tokio::test]
async fn test_sign_in_outside_domain_is_forbidden() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/session")
        .header(header::AUTHORIZATION, "Bearer ana@gmail.com")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app.router, request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Solo se permiten emails del dominio @uv.mx");
}

#[tokio::test]
async fn test_unknown_session_is_unauthorized() {
    let app = test_app();
    let (status, body) = send_json(
        &app.router,
        authed(
            Method::GET,
            "/api/requests/mine",
            "00000000-0000-0000-0000-000000000000",
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No hay una sesión iniciada");
}

#[tokio::test]
async fn test_submit_then_list_own_requests() {
    let app = test_app();
    let session = sign_in(&app.router, "ana.lopez@uv.mx").await;

    let (status, receipt) = send_json(
        &app.router,
        authed(
            Method::POST,
            "/api/requests/solicitud_libre",
            &session,
            Some(free_form_json("ana.lopez@uv.mx")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{receipt}");
    assert!(receipt["folio"].as_str().unwrap().starts_with("LIB-"));
    assert_eq!(app.gateways.store.count(), 1);

    let (status, mine) = send_json(
        &app.router,
        authed(Method::GET, "/api/requests/mine", &session, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["folio"], receipt["folio"]);
}

#[tokio::test]
async fn test_invalid_submission_is_unprocessable() {
    let app = test_app();
    let session = sign_in(&app.router, "ana.lopez@uv.mx").await;
    let mut fields = free_form_json("ana.lopez@uv.mx");
    fields["correo"] = json!("ana@gmail.com");

    let (status, body) = send_json(
        &app.router,
        authed(Method::POST, "/api/requests/solicitud_libre", &session, Some(fields)),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Solo se permiten emails del dominio @uv.mx");
    assert_eq!(app.gateways.store.count(), 0);
}

#[tokio::test]
async fn test_member_cannot_open_admin_panel() {
    let app = test_app();
    let session = sign_in(&app.router, "ana.lopez@uv.mx").await;

    let (status, body) = send_json(
        &app.router,
        authed(Method::GET, "/api/admin/requests", &session, None),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "No tienes permisos para acceder al panel de administración"
    );
}

#[tokio::test]
async fn test_admin_exports_csv() {
    let app = test_app();
    let member = sign_in(&app.router, "ana.lopez@uv.mx").await;
    for _ in 0..2 {
        let (status, _) = send_json(
            &app.router,
            authed(
                Method::POST,
                "/api/requests/solicitud_libre",
                &member,
                Some(free_form_json("ana.lopez@uv.mx")),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let admin = sign_in(&app.router, "admin@uv.mx").await;
    let (status, dashboard) = send_json(
        &app.router,
        authed(Method::GET, "/api/admin/requests", &admin, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["stats"]["total"], 2);

    let (status, body, headers) = send(
        &app.router,
        authed(Method::GET, "/api/admin/export", &admin, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .starts_with("attachment; filename=\"CITRO_Solicitudes_"));

    let text = String::from_utf8(body).unwrap();
    assert!(text.starts_with('\u{feff}'));
    assert_eq!(text.trim_end().lines().count(), 3);
}

#[tokio::test]
async fn test_admin_updates_status() {
    let app = test_app();
    let admin = sign_in(&app.router, "admin@uv.mx").await;

    let (status, _) = send_json(
        &app.router,
        authed(
            Method::PATCH,
            "/api/admin/requests/7",
            &admin,
            Some(json!({"status": "Aprobado", "amount_authorized": 1200.0})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    let updates = app.gateways.repository.updates.lock();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "7");
}

#[tokio::test]
async fn test_calendar_without_date_returns_compose_link() {
    let app = test_app();
    let session = sign_in(&app.router, "ana.lopez@uv.mx").await;

    let (status, body) = send_json(
        &app.router,
        authed(
            Method::POST,
            "/api/calendar",
            &session,
            Some(json!({
                "folio": "LIB-20261019-093000",
                "request_type": "solicitud_libre",
                "fields": {"asunto": "Cambio de aula"}
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "fallback");
    assert!(body["url"]
        .as_str()
        .unwrap()
        .starts_with("https://outlook.office.com/calendar/"));
    assert!(app.gateways.calendar.events.lock().is_empty());
}

#[tokio::test]
async fn test_sign_out_forgets_session() {
    let app = test_app();
    let session = sign_in(&app.router, "ana.lopez@uv.mx").await;

    let (status, _) = send_json(
        &app.router,
        authed(Method::DELETE, "/api/session", &session, None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_json(&app.router, authed(Method::GET, "/api/session", &session, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_idle_sessions_are_evicted() {
    let portal = Portal::new(config(), reqwest::Client::new(), Arc::new(FakeGateways::default()), None).unwrap();
    let state = Arc::new(AppState::new(Arc::new(portal)).with_idle_ttl(Duration::from_millis(200)));
    let router = router(state.clone());

    let abandoned = sign_in(&router, "ana.lopez@uv.mx").await;
    assert_eq!(state.sessions.len(), 1);
    tokio::time::sleep(Duration::from_millis(300)).await;

    // A new sign-in sweeps the abandoned one
    let active = sign_in(&router, "luis.perez@uv.mx").await;
    assert_eq!(state.sessions.len(), 1);

    let (status, _) = send_json(&router, authed(Method::GET, "/api/session", &abandoned, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_json(&router, authed(Method::GET, "/api/session", &active, None)).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    // Idle past the TTL on direct access as well
    tokio::time::sleep(Duration::from_millis(300)).await;
    let (status, _) = send_json(&router, authed(Method::GET, "/api/session", &active, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(state.sessions.len(), 0);
    assert_eq!(state.evict_idle(), 0);
}
