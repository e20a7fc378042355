// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::Session,
};

/// Valida o token Bearer e injeta a `Session` nos extensions da requisição.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(AppError::NotAuthenticated.to_api_error(&locale, &app_state.i18n_store));
    };

    let session = app_state
        .auth_service
        .validate_token(bearer.token())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

// Extrator para obter a sessão autenticada diretamente nos handlers
pub struct AuthenticatedUser(pub Session);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(AuthenticatedUser(session.clone()));
        }

        // Rota montada sem o auth_guard
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);
        Err(AppError::NotAuthenticated.to_api_error(&locale, &app_state.i18n_store))
    }
}
