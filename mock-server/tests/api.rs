use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, model::Status, MockState};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn authed(method: &str, uri: &str, token: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- catalog ---

#[tokio::test]
async fn categories_are_public() {
    let resp = app().oneshot(get("/categories")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["subcategories"][0]["name"], "Redes");
}

#[tokio::test]
async fn category_search_with_null_subcategory() {
    let resp = app()
        .oneshot(get("/providers/category-search/1/null"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["providers"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 2);
}

#[tokio::test]
async fn category_search_narrowed_to_subcategory() {
    let resp = app()
        .oneshot(get("/providers/category-search/1/3"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    let providers = body["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0]["user"]["first_name"], "Luis");
}

#[tokio::test]
async fn category_search_rejects_garbage() {
    let resp = app()
        .oneshot(get("/providers/category-search/1/abc"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_lookup() {
    let resp = app().oneshot(get("/providers/3")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["user"]["first_name"], "Marta");

    let resp = app().oneshot(get("/providers/99")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn geo_search_filters_by_distance() {
    let near = r#"{"lat":10.63,"long":-85.44,"range_km":10}"#;
    let resp = app()
        .oneshot(json_request("POST", "/providers/geo-search", near))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let wide = r#"{"lat":10.63,"long":-85.44,"range_km":100,"experience_years":5}"#;
    let resp = app()
        .oneshot(json_request("POST", "/providers/geo-search", wide))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["user"]["first_name"], "Marta");
}

// --- accounts ---

#[tokio::test]
async fn register_then_duplicate() {
    let state = MockState::seeded();
    let form = r#"{"first_name":"Eva","last_name":"Ruiz","cedula":"504440222","email":"eva@example.com",
        "personal_phone_number":"88881111","password":"clave1234","password_confirmation":"clave1234"}"#;

    let resp = app_with_state(state.clone())
        .oneshot(json_request("POST", "/register/client", form))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["user"]["roles"][0], "Client");

    let resp = app_with_state(state)
        .oneshot(json_request("POST", "/register/client", form))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(resp).await["message"],
        "The email has already been taken."
    );
}

#[tokio::test]
async fn profile_requires_token() {
    let resp = app().oneshot(get("/profile")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_roundtrip_and_logout() {
    let state = MockState::seeded();
    let token = state.issue_token(7).await;

    let resp = app_with_state(state.clone())
        .oneshot(authed("GET", "/profile", &token, ""))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"]["roles"][1], "Provider");
    assert_eq!(body["data"]["provider"]["location"], "Liberia");

    let resp = app_with_state(state.clone())
        .oneshot(authed("PUT", "/profile", &token, r#"{"location":"Nicoya"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["provider"]["location"], "Nicoya");

    let resp = app_with_state(state.clone())
        .oneshot(authed("POST", "/logout", &token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app_with_state(state)
        .oneshot(authed("GET", "/profile", &token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_change_needs_current_password() {
    let state = MockState::seeded();
    let token = state.issue_token(5).await;
    let resp = app_with_state(state)
        .oneshot(authed(
            "PUT",
            "/profile",
            &token,
            r#"{"current_password":"wrong","new_password":"n","new_password_confirmation":"n"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- appointments ---

#[tokio::test]
async fn client_sees_own_appointments_only() {
    let state = MockState::seeded();
    let token = state.issue_token(5).await;

    let resp = app_with_state(state.clone())
        .oneshot(authed("GET", "/appointments/client/all/5", &token, ""))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[0]["status_text"], "Pendiente");

    let resp = app_with_state(state.clone())
        .oneshot(authed("GET", "/appointments/client/all/9", &token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app_with_state(state)
        .oneshot(authed("GET", "/appointments/client/confirmed", &token, ""))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn provider_by_user_wraps_payload() {
    let state = MockState::seeded();
    let token = state.issue_token(7).await;

    let resp = app_with_state(state.clone())
        .oneshot(authed("GET", "/appointments/provider/user/7", &token, ""))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["appointments"].as_array().unwrap().len(), 2);
    assert_eq!(body["provider_info"]["provider_id"], 2);

    let resp = app_with_state(state.clone())
        .oneshot(authed("GET", "/appointments/provider/user/5", &token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app_with_state(state)
        .oneshot(authed("GET", "/appointments/provider/user/404", &token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_the_provider_confirms() {
    let state = MockState::seeded();
    let client = state.issue_token(5).await;
    let provider = state.issue_token(7).await;

    let resp = app_with_state(state.clone())
        .oneshot(authed("PATCH", "/appointments/42/confirm", &client, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(state.appointment_status(42).await, Some(Status::Pending));

    let resp = app_with_state(state.clone())
        .oneshot(authed("PATCH", "/appointments/42/confirm", &provider, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["success"], true);
    assert_eq!(state.appointment_status(42).await, Some(Status::Confirmed));
}

#[tokio::test]
async fn client_may_cancel_own_appointment() {
    let state = MockState::seeded();
    let token = state.issue_token(5).await;
    let resp = app_with_state(state.clone())
        .oneshot(authed("PATCH", "/appointments/43/cancel", &token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(state.appointment_status(43).await, Some(Status::Cancelled));

    let resp = app_with_state(state)
        .oneshot(authed("PATCH", "/appointments/999/cancel", &token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let resp = app().oneshot(get("/nonexistent")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(resp).await.is_empty());
}
