// src/handlers/dashboard.rs

use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, rbac::RequirePlanner},
    models::dashboard::{DashboardStats, FinancialSummary},
};

// GET /api/dashboard/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Contadores do painel (planejador: todos; morador: os próprios)", body = DashboardStats),
        (status = 401, description = "Não autenticado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .dashboard_service
        .get_stats(&session, Utc::now())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stats))
}

// GET /api/dashboard/financial
#[utoipa::path(
    get,
    path = "/api/dashboard/financial",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Cobranças pagas, pendentes e vencidas", body = FinancialSummary),
        (status = 403, description = "Restrito ao planejador")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_financial_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePlanner(session): RequirePlanner,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .dashboard_service
        .get_financial_summary(&session, Utc::now())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}
