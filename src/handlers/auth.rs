// src/handlers/auth.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{AuthResponse, LoginUserPayload, PlannerLoginPayload, RegisterUserPayload, RegisteredUser, User},
};

// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Morador cadastrado", body = RegisteredUser),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "WhatsApp ou nome + final já cadastrados")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .auth_service
        .register_user(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(user)))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Sessão do morador", body = AuthResponse),
        (status = 401, description = "Nome ou final do WhatsApp não conferem")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .auth_service
        .login_user(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(response))
}

// POST /api/auth/planner/login
#[utoipa::path(
    post,
    path = "/api/auth/planner/login",
    tag = "Auth",
    request_body = PlannerLoginPayload,
    responses(
        (status = 200, description = "Sessão do planejador", body = AuthResponse),
        (status = 401, description = "Senha incorreta")
    )
)]
pub async fn planner_login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<PlannerLoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .auth_service
        .login_planner(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(response))
}

// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 204, description = "Token revogado"),
        (status = 401, description = "Não autenticado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn logout(
    State(app_state): State<AppState>,
    AuthenticatedUser(session): AuthenticatedUser,
) -> StatusCode {
    app_state.auth_service.logout(&session).await;
    StatusCode::NO_CONTENT
}

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Usuário da sessão", body = User),
        (status = 401, description = "Não autenticado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_me(AuthenticatedUser(session): AuthenticatedUser) -> Json<User> {
    Json(session.user)
}
