//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `chamados hash-password <senha>` gera o valor de PLANNER_PASSWORD_HASH
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [command, secret] = args.as_slice() {
        if command == "hash-password" {
            println!("{}", bcrypt::hash(secret, bcrypt::DEFAULT_COST)?);
            return Ok(());
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chamados=info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    let app = app(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn app(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/planner/login", post(handlers::auth::planner_login))
        .route(
            "/logout",
            post(handlers::auth::logout).layer(axum_middleware::from_fn_with_state(
                app_state.clone(),
                auth_guard,
            )),
        );

    let catalog_routes = Router::new()
        .route("/categories", get(handlers::catalog::list_categories))
        .route("/categories/{id}", get(handlers::catalog::get_category))
        .route("/labels", get(handlers::catalog::get_labels));

    // Define as rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let request_routes = Router::new()
        .route("/"
               ,post(handlers::requests::create_request)
               .get(handlers::requests::list_requests)
        )
        .route("/mine", get(handlers::requests::list_my_requests))
        .route("/events", get(handlers::events::stream_changes))
        .route("/owner/{user_id}", get(handlers::requests::list_owner_requests))
        .route("/{id}"
               ,get(handlers::requests::get_request)
               .patch(handlers::requests::update_request)
               .delete(handlers::requests::delete_request)
        )
        .route("/{id}/payment/settle", post(handlers::requests::settle_payment))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let dashboard_routes = Router::new()
        .route("/stats", get(handlers::dashboard::get_stats))
        .route("/financial", get(handlers::dashboard::get_financial_summary))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/catalog", catalog_routes)
        .nest("/api/users", user_routes)
        .nest("/api/requests", request_routes)
        .nest("/api/dashboard", dashboard_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::tests::test_config;
    use crate::db::{InMemoryRequestStore, InMemoryUserDirectory};
    use crate::services::auth::tests::PLANNER_PASSWORD;
    use crate::services::events::ChangeFeed;

    fn test_app() -> Router {
        let config = test_config(Some(bcrypt::hash(PLANNER_PASSWORD, 4).unwrap()));
        let state = AppState::from_stores(
            &config,
            Arc::new(InMemoryRequestStore::new()),
            Arc::new(InMemoryUserDirectory::new()),
            ChangeFeed::default(),
        )
        .unwrap();
        app(state)
    }

    async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn planner_token(app: &Router) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/auth/planner/login",
            None,
            Some(json!({ "password": PLANNER_PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn client_token(app: &Router) -> String {
        let (status, _) = call(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "firstName": "João",
                "lastName": "Silva",
                "whatsapp": "(11) 98765-4321",
                "email": "joao@email.com"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "firstName": "joão", "whatsappLast4": "4321" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = test_app();
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_category_resolves_to_other() {
        let app = test_app();
        let (status, body) = call(&app, Method::GET, "/api/catalog/categories/plumbing", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "other");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = test_app();
        let (status, body) = call(&app, Method::GET, "/api/requests", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _) = call(&app, Method::GET, "/api/users/me", Some("lixo"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn request_lifecycle_over_http() {
        let app = test_app();
        let client = client_token(&app).await;
        let planner = planner_token(&app).await;

        let (status, created) = call(
            &app,
            Method::POST,
            "/api/requests",
            Some(&client),
            Some(json!({
                "title": "Leak",
                "description": "Torneira pingando",
                "category": "hydraulic",
                "location": "Apto 301",
                "status": "completed"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "pending");
        assert_eq!(created["contact"], "WhatsApp: 4321");
        let id = created["id"].as_str().unwrap().to_string();

        // Morador não altera status
        let (status, _) = call(
            &app,
            Method::PATCH,
            &format!("/api/requests/{}", id),
            Some(&client),
            Some(json!({ "status": "scheduled" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, scheduled) = call(
            &app,
            Method::PATCH,
            &format!("/api/requests/{}", id),
            Some(&planner),
            Some(json!({ "status": "scheduled", "scheduledDays": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(scheduled["status"], "scheduled");
        assert!(scheduled["scheduledDate"].is_string());

        let (status, completed) = call(
            &app,
            Method::PATCH,
            &format!("/api/requests/{}", id),
            Some(&planner),
            Some(json!({ "status": "completed", "paymentAmount": 45.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(completed["payment"]["isPaid"], false);

        let (status, _) = call(
            &app,
            Method::PATCH,
            &format!("/api/requests/{}", id),
            Some(&planner),
            Some(json!({ "status": "pending" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let settle = format!("/api/requests/{}/payment/settle", id);
        let (status, _) = call(&app, Method::POST, &settle, Some(&planner), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, paid) = call(&app, Method::POST, &settle, Some(&planner), Some(json!({ "paymentMethod": "pix" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["payment"]["isPaid"], true);

        let (status, _) = call(&app, Method::POST, &settle, Some(&planner), Some(json!({ "paymentMethod": "cash" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, stats) = call(&app, Method::GET, "/api/dashboard/stats", Some(&planner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["completed"], 1);
        assert_eq!(stats["totalRevenue"], 45.0);

        let (status, _) = call(&app, Method::GET, "/api/dashboard/financial", Some(&client), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn clients_only_see_their_own_requests() {
        let app = test_app();
        let client = client_token(&app).await;
        let planner = planner_token(&app).await;

        let (_, created) = call(
            &app,
            Method::POST,
            "/api/requests",
            Some(&planner),
            Some(json!({
                "title": "Portão",
                "description": "Portão da garagem travando",
                "category": "security",
                "location": "Garagem"
            })),
        )
        .await;
        let id = created["id"].as_str().unwrap();

        let (status, _) = call(&app, Method::GET, &format!("/api/requests/{}", id), Some(&client), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, mine) = call(&app, Method::GET, "/api/requests/mine", Some(&client), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.as_array().map(Vec::len), Some(0));

        let (status, _) = call(&app, Method::GET, "/api/requests?status=pending", Some(&client), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, pending) = call(&app, Method::GET, "/api/requests?status=pending", Some(&planner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn logout_invalidates_the_token() {
        let app = test_app();
        let client = client_token(&app).await;

        let (status, me) = call(&app, Method::GET, "/api/users/me", Some(&client), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["fullName"], "João Silva");

        let (status, _) = call(&app, Method::POST, "/api/auth/logout", Some(&client), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(&app, Method::GET, "/api/users/me", Some(&client), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn errors_follow_accept_language() {
        let app = test_app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT_LANGUAGE, "en-US")
            .body(Body::from(json!({ "firstName": "Ana", "whatsappLast4": "0000" }).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let pt_message = crate::common::i18n::I18nStore::load().unwrap().message("pt", "invalid_credentials");
        assert_ne!(body["error"], pt_message);
    }
}
