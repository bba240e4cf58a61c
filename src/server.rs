use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Environment;
use crate::handlers::{elevated, protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Full application router over the shared state
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .route("/api/test", get(public::system::connectivity_get))
        .merge(public_routes())
        // Bearer required
        .merge(protected_routes(state.clone()))
        .merge(elevated_routes(state.clone()))
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::{auth, dashboard, users};

    Router::new()
        .route("/api/auth/login", post(auth::session_login))
        .route("/api/dashboard", get(dashboard::dashboard_get))
        .route("/api/dashboard/:role", get(dashboard::dashboard_role_get))
        .route("/api/user-role", post(users::user_role_post))
        .route("/api/ensure-user", post(users::ensure_user_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth/whoami", get(auth::session_whoami))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn elevated_routes(state: AppState) -> Router<AppState> {
    use elevated::admin;

    Router::new()
        .route("/api/admin/credentials", post(admin::admin_credentials))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    if state.config.environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = state
        .config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let mut config = AppConfig::for_tests();
        config.auth.local_password = Some("router-test-pass".to_string());
        app(AppState::new(config))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn login_request(email: &str, password: &str) -> Request<Body> {
        Request::post("/api/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "email": email, "password": password }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_missing_database() {
        let (status, body) = send(test_app(), Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn dashboard_without_bearer_asks_for_login() {
        let (status, body) = send(test_app(), Request::get("/api/dashboard").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["decision"], "login");
        assert_eq!(body["route"], "/login");
    }

    #[tokio::test]
    async fn local_login_token_resolves_dashboard() {
        let (status, body) = send(test_app(), login_request("store@qube.com", "router-test-pass")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fallbackAuth"], true);
        assert_eq!(body["role"], "store-incharge");
        let token = body["access_token"].as_str().unwrap().to_string();

        let request = Request::get("/api/dashboard/sales-co-ordinator")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (_, body) = send(test_app(), request).await;
        assert_eq!(body["decision"], "redirect");
        assert_eq!(body["route"], "/dashboard/store-incharge");
    }

    #[tokio::test]
    async fn wrong_local_password_is_unauthorized() {
        let (status, body) = send(test_app(), login_request("store@qube.com", "nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn whoami_requires_bearer() {
        let (status, _) = send(test_app(), Request::get("/api/auth/whoami").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    fn ensure_user_request(email: &str) -> Request<Body> {
        Request::post("/api/ensure-user")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "email": email, "password": "a-long-password" }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn ensure_user_refuses_super_admin_email() {
        for email in ["admin@qube.com", "  Admin@Qube.com "] {
            let (status, body) = send(test_app(), ensure_user_request(email)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "email {:?}", email);
            assert!(
                body["message"].as_str().unwrap().contains("super admin"),
                "unexpected body: {}",
                body
            );
        }
    }

    #[tokio::test]
    async fn ensure_user_refuses_unlisted_email() {
        let (status, body) = send(test_app(), ensure_user_request("stranger@example.com")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["ok"], false);
    }
}
