// src/handlers/requests.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, rbac::RequirePlanner},
    models::service_request::{
        NewServiceRequest, RequestUpdate, ServiceRequest, SettlePaymentPayload, StatusFilter,
    },
};

// POST /api/requests
#[utoipa::path(
    post,
    path = "/api/requests",
    tag = "Requests",
    request_body = NewServiceRequest,
    responses(
        (status = 201, description = "Chamado aberto como pendente", body = ServiceRequest),
        (status = 400, description = "Campos obrigatórios ausentes"),
        (status = 401, description = "Não autenticado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_request(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Json(payload): Json<NewServiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = app_state
        .request_service
        .create(&session, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(request)))
}

// GET /api/requests
#[utoipa::path(
    get,
    path = "/api/requests",
    tag = "Requests",
    params(StatusFilter),
    responses(
        (status = 200, description = "Planejador: todos (ou por status). Morador: os próprios.", body = Vec<ServiceRequest>),
        (status = 403, description = "Filtro por status restrito ao planejador")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_requests(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Query(filter): Query<StatusFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = match filter.status {
        Some(status) => app_state.request_service.list_by_status(&session, status).await,
        None => app_state.request_service.list_visible(&session).await,
    }
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(requests))
}

// GET /api/requests/mine
#[utoipa::path(
    get,
    path = "/api/requests/mine",
    tag = "Requests",
    responses(
        (status = 200, description = "Chamados do usuário da sessão", body = Vec<ServiceRequest>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_my_requests(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let requests = app_state
        .request_service
        .list_by_owner(&session, &session.user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(requests))
}

// GET /api/requests/owner/{user_id}
#[utoipa::path(
    get,
    path = "/api/requests/owner/{user_id}",
    tag = "Requests",
    params(
        ("user_id" = String, Path, description = "Id do morador")
    ),
    responses(
        (status = 200, description = "Chamados do morador", body = Vec<ServiceRequest>),
        (status = 403, description = "Morador consultando outro morador")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_owner_requests(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = app_state
        .request_service
        .list_by_owner(&session, &user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(requests))
}

// GET /api/requests/{id}
#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    tag = "Requests",
    params(
        ("id" = Uuid, Path, description = "Id do chamado")
    ),
    responses(
        (status = 200, description = "Chamado", body = ServiceRequest),
        (status = 404, description = "Inexistente ou de outro morador")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_request(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let request = app_state
        .request_service
        .get(&session, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}

// PATCH /api/requests/{id}
#[utoipa::path(
    patch,
    path = "/api/requests/{id}",
    tag = "Requests",
    request_body = RequestUpdate,
    params(
        ("id" = Uuid, Path, description = "Id do chamado")
    ),
    responses(
        (status = 200, description = "Chamado atualizado", body = ServiceRequest),
        (status = 403, description = "Restrito ao planejador"),
        (status = 404, description = "Chamado não encontrado"),
        (status = 409, description = "Transição de status inválida")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_request(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePlanner(session): RequirePlanner,
    Path(id): Path<Uuid>,
    Json(payload): Json<RequestUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let request = app_state
        .request_service
        .update(&session, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}

// DELETE /api/requests/{id}
#[utoipa::path(
    delete,
    path = "/api/requests/{id}",
    tag = "Requests",
    params(
        ("id" = Uuid, Path, description = "Id do chamado")
    ),
    responses(
        (status = 204, description = "Chamado removido"),
        (status = 403, description = "Restrito ao planejador"),
        (status = 404, description = "Chamado não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_request(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePlanner(session): RequirePlanner,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .request_service
        .delete(&session, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/requests/{id}/payment/settle
#[utoipa::path(
    post,
    path = "/api/requests/{id}/payment/settle",
    tag = "Requests",
    request_body = SettlePaymentPayload,
    params(
        ("id" = Uuid, Path, description = "Id do chamado")
    ),
    responses(
        (status = 200, description = "Pagamento registrado", body = ServiceRequest),
        (status = 400, description = "Sem cobrança ou forma de pagamento ausente"),
        (status = 409, description = "Pagamento já registrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn settle_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePlanner(session): RequirePlanner,
    Path(id): Path<Uuid>,
    Json(payload): Json<SettlePaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let request = app_state
        .request_service
        .settle_payment(&session, id, payload.payment_method.as_deref(), payload.notes.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}
