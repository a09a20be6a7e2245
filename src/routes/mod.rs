mod admin;
mod device;
mod system;

use crate::middlewares::trace_id::{TraceId, TraceIdLayer};
use crate::state::AppState;
use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use axum::http::{HeaderValue, Request};
use axum::response::Response;
use axum::{
    Router,
    routing::{get, post},
};
use std::time::Duration;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::Span;

/// Panel pages and panel API. Every response forbids caching.
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::panel))
        .route("/admin/login", get(admin::login_page).post(admin::login))
        .route("/admin/logout", post(admin::logout))
        .route("/admin/api/list", get(admin::list))
        .route("/admin/api/save", post(admin::save))
        .route("/admin/api/delete", post(admin::delete))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            EXPIRES,
            HeaderValue::from_static("0"),
        ))
}

pub fn build() -> Router<AppState> {
    Router::new()
        .route("/health", get(system::health))
        .route("/version", get(system::version))
        .route("/check", get(device::check))
        .route("/update", post(device::update))
        .merge(admin_routes())
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let trace_id = request
                        .extensions()
                        .get::<TraceId>()
                        .map(|it| it.to_string())
                        .unwrap_or_default();
                    tracing::debug_span!("request", trace_id = %trace_id)
                })
                .on_request(|req: &Request<Body>, _span: &Span| {
                    tracing::trace!(
                        method = %req.method(),
                        uri = %req.uri(),
                        version = %format!("{:?}", req.version()),
                        "started processing request"
                    );
                })
                .on_response(|res: &Response, latency: Duration, _span: &Span| {
                    tracing::trace!(
                        status = ?res.status(),
                        latency = %format!("{}ms", latency.as_millis()),
                        "finished processing request"
                    );
                }),
        )
        .layer(TraceIdLayer::new())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ]),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::MemoryRecordStore;
    use axum::http::header::{
        AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE, USER_AGENT,
    };
    use axum::http::{Method, StatusCode};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    const UA: &str = "Mozilla/5.0 (test)";

    fn test_config() -> Config {
        let mut config = Config::default();
        config.admin.api_key = String::from("test-key");
        config.admin.username = String::from("operator");
        config.admin.password = String::from("pa55word");
        config
    }

    fn app_with(config: Config) -> (Router, AppState) {
        let state = AppState::build(config, Arc::new(MemoryRecordStore::new()));
        (build().with_state(state.clone()), state)
    }

    fn app() -> (Router, AppState) {
        app_with(test_config())
    }

    async fn send(
        app: &Router,
        request: Request<Body>,
    ) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri).header(USER_AGENT, UA);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(USER_AGENT, UA)
            .header(CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn update(key: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/update")
            .header(AUTHORIZATION, key)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Logs in and returns the `name=value` pair to send back as a cookie.
    async fn login(app: &Router) -> String {
        let (status, headers, body) = send(
            app,
            post_json(
                "/admin/login",
                json!({"username": "operator", "password": "pa55word"}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        let set_cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn unknown_device_is_not_found() {
        let (app, _) = app();
        let (status, _, body) = send(&app, get("/check?device=nope-1", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["status"], "not_found");
        assert_eq!(body["device_code"], "NOPE-1");
        assert_eq!(body["plan"], "");
        assert_eq!(body["expiry"], "");
        assert_eq!(body["notes"], "");
    }

    #[tokio::test]
    async fn check_without_device_is_bad_request() {
        let (app, _) = app();
        for uri in ["/check", "/check?device=", "/check?device=%20%20"] {
            let (status, _, body) = send(&app, get(uri, None)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({"ok": false, "error": "missing_device_code"}));
        }
    }

    #[tokio::test]
    async fn update_then_check_follows_expiry() {
        let (app, _) = app();
        let cases = [
            ("DEV-A", "", "active"),
            ("DEV-B", "2000-01-01T00:00:00Z", "inactive"),
            ("DEV-C", "2999-01-01T00:00:00Z", "active"),
            ("DEV-D", "not a date", "active"),
        ];
        for (device, expiry, _) in cases {
            let (status, _, body) = send(
                &app,
                update(
                    "Bearer test-key",
                    json!({
                        "device": device,
                        "status": "active",
                        "plan": "Monthly",
                        "expiry": expiry,
                        "notes": "n"
                    }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["ok"], true);
            assert_eq!(body["device_code"], device);
            assert_eq!(body["data"]["expiry"], expiry);
        }
        for (device, _, expected) in cases {
            let (_, _, body) = send(&app, get(&format!("/check?device={device}"), None)).await;
            assert_eq!(body["status"], expected, "device {device}");
            assert_eq!(body["plan"], "Monthly");
        }
    }

    #[tokio::test]
    async fn codes_are_case_and_whitespace_insensitive() {
        let (app, _) = app();
        let (status, _, body) = send(
            &app,
            update("test-key", json!({"device": " abc01 ", "status": "active", "plan": "Yearly"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["device_code"], "ABC01");
        let (_, _, body) = send(&app, get("/check?device=ABC01", None)).await;
        assert_eq!(body["status"], "active");
        assert_eq!(body["plan"], "Yearly");
        let (_, _, body) = send(&app, get("/check?device=%20abc01", None)).await;
        assert_eq!(body["plan"], "Yearly");
    }

    #[tokio::test]
    async fn update_with_wrong_key_is_forbidden_and_does_not_write() {
        let (app, state) = app();
        for key in ["Bearer wrong", "wrong", ""] {
            let (status, _, body) = send(
                &app,
                update(key, json!({"device": "X1", "status": "active"})),
            )
            .await;
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert_eq!(body, json!({"ok": false, "error": "unauthorized"}));
        }
        assert!(state.store.list().await.is_empty());
        let (_, _, body) = send(&app, get("/check?device=X1", None)).await;
        assert_eq!(body["status"], "not_found");
    }

    #[tokio::test]
    async fn update_without_device_is_bad_request() {
        let (app, _) = app();
        let (status, _, body) = send(&app, update("test-key", json!({"status": "active"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_device");
    }

    #[tokio::test]
    async fn wrong_credentials_issue_no_session() {
        let (app, state) = app();
        let (status, headers, body) = send(
            &app,
            post_json(
                "/admin/login",
                json!({"username": "operator", "password": "nope"}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_credentials");
        assert!(headers.get(SET_COOKIE).is_none());
        assert_eq!(state.sessions.len(), 0);

        let (status, headers, body) = send(&app, get("/admin/api/list", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"ok": false, "error": "not_authenticated"}));
        assert_eq!(
            headers.get(CACHE_CONTROL).unwrap(),
            "no-store, no-cache, must-revalidate, private"
        );
    }

    #[tokio::test]
    async fn session_cookie_attributes() {
        let (app, _) = app();
        let (_, headers, _) = send(
            &app,
            post_json(
                "/admin/login",
                json!({"username": "operator", "password": "pa55word"}),
                None,
            ),
        )
        .await;
        let set_cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("admin_session="));
        for attribute in ["Path=/", "HttpOnly", "SameSite=Lax", "Secure"] {
            assert!(set_cookie.contains(attribute), "missing {attribute}");
        }
        assert_eq!(headers.get(PRAGMA).unwrap(), "no-cache");
        assert_eq!(headers.get(EXPIRES).unwrap(), "0");
    }

    #[tokio::test]
    async fn form_login_redirects_to_panel() {
        let (app, _) = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/admin/login")
            .header(USER_AGENT, UA)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("username=operator&password=pa55word"))
            .unwrap();
        let (status, headers, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers.get(LOCATION).unwrap(), "/admin");
        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        let cookie = cookie.split(';').next().unwrap();

        let response = app.clone().oneshot(get("/admin", Some(cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn panel_redirects_without_session() {
        let (app, _) = app();
        let (status, headers, _) = send(&app, get("/admin", None)).await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers.get(LOCATION).unwrap(), "/admin/login");
        assert!(headers.get(CACHE_CONTROL).is_some());

        let response = app.clone().oneshot(get("/admin/login", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_page_redirects_active_session() {
        let (app, _) = app();
        let cookie = login(&app).await;
        let (status, headers, _) = send(&app, get("/admin/login", Some(&cookie))).await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers.get(LOCATION).unwrap(), "/admin");
    }

    #[tokio::test]
    async fn save_then_list_is_sorted() {
        let (app, _) = app();
        let cookie = login(&app).await;
        for device in ["zz-9", "aa-1", "Mm-5"] {
            let (status, _, body) = send(
                &app,
                post_json(
                    "/admin/api/save",
                    json!({
                        "device": device,
                        "status": "active",
                        "plan": "Monthly",
                        "expiry": "",
                        "notes": ""
                    }),
                    Some(&cookie),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["ok"], true);
            assert_eq!(body["device"], device.to_uppercase());
            assert_eq!(body["data"]["status"], "active");
        }
        let (status, _, body) = send(&app, get("/admin/api/list", Some(&cookie))).await;
        assert_eq!(status, StatusCode::OK);
        let devices: Vec<_> = body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|it| it["device"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(devices, vec!["AA-1", "MM-5", "ZZ-9"]);
        assert_eq!(body["items"][0]["plan"], "Monthly");
    }

    #[tokio::test]
    async fn save_overwrites_whole_record() {
        let (app, _) = app();
        let cookie = login(&app).await;
        let save = |body: Value| post_json("/admin/api/save", body, Some(&cookie));
        send(
            &app,
            save(json!({"device": "W1", "status": "active", "plan": "Yearly", "notes": "first"})),
        )
        .await;
        let (_, _, body) = send(&app, save(json!({"device": "w1", "status": "disabled"}))).await;
        assert_eq!(
            body["data"],
            json!({"status": "disabled", "plan": "", "expiry": "", "notes": ""})
        );
        let (_, _, body) = send(&app, get("/check?device=w1", None)).await;
        assert_eq!(body["status"], "inactive");
        assert_eq!(body["notes"], "");
    }

    #[tokio::test]
    async fn delete_makes_device_not_found() {
        let (app, _) = app();
        let cookie = login(&app).await;
        send(
            &app,
            post_json(
                "/admin/api/save",
                json!({"device": "DEL-1", "status": "active"}),
                Some(&cookie),
            ),
        )
        .await;
        let (status, _, body) = send(
            &app,
            post_json("/admin/api/delete", json!({"device": " del-1 "}), Some(&cookie)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
        let (_, _, body) = send(&app, get("/check?device=DEL-1", None)).await;
        assert_eq!(body["status"], "not_found");

        let (status, _, body) =
            send(&app, post_json("/admin/api/delete", json!({}), Some(&cookie))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_device");
    }

    #[tokio::test]
    async fn admin_api_requires_session_for_mutations() {
        let (app, state) = app();
        let (status, _, _) = send(
            &app,
            post_json("/admin/api/save", json!({"device": "S1", "status": "active"}), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _, _) = send(
            &app,
            post_json(
                "/admin/api/save",
                json!({"device": "S1", "status": "active"}),
                Some("admin_session=forged"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(state.store.list().await.is_empty());
    }

    #[tokio::test]
    async fn session_is_bound_to_user_agent() {
        let (app, state) = app();
        let cookie = login(&app).await;
        let request = Request::builder()
            .uri("/admin/api/list")
            .header(USER_AGENT, "curl/8.0")
            .header(COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(state.sessions.len(), 0);
        let (status, _, _) = send(&app, get("/admin/api/list", Some(&cookie))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn idle_session_is_rejected_and_removed() {
        let mut config = test_config();
        config.session.idle_timeout_secs = 0;
        let (app, state) = app_with(config);
        let cookie = login(&app).await;
        assert_eq!(state.sessions.len(), 1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let (status, _, body) = send(&app, get("/admin/api/list", Some(&cookie))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "not_authenticated");
        assert_eq!(state.sessions.len(), 0);
    }

    #[tokio::test]
    async fn logout_invalidates_session() {
        let (app, state) = app();
        let cookie = login(&app).await;
        let (status, _, _) = send(&app, get("/admin/api/list", Some(&cookie))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, headers, body) =
            send(&app, post_json("/admin/logout", json!({}), Some(&cookie))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
        let cleared = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cleared.starts_with("admin_session=;"));
        assert!(cleared.contains("Max-Age=0"));
        assert_eq!(state.sessions.len(), 0);

        let (status, _, _) = send(&app, get("/admin/api/list", Some(&cookie))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_without_session_still_clears_cookie() {
        let (app, _) = app();
        let (status, headers, body) = send(&app, post_json("/admin/logout", json!({}), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert!(headers.get(SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (app, _) = app();
        let response = app.clone().oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-request-id").is_some());
        assert!(response.headers().get(CACHE_CONTROL).is_none());
    }
}
