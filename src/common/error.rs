// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;
use crate::models::service_request::Status;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Regras de negócio violadas antes de tocar no armazenamento
    #[error("Dado inválido: {0}")]
    InvalidInput(&'static str),

    #[error("Sessão ausente ou expirada")]
    NotAuthenticated,

    #[error("Operação restrita ao planejador")]
    NotAuthorized,

    #[error("Chamado não encontrado")]
    NotFound,

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidTransition { from: Status, to: Status },

    #[error("Forma de pagamento obrigatória")]
    PaymentMethodRequired,

    #[error("Chamado sem cobrança")]
    NoPaymentAttached,

    #[error("Pagamento já registrado")]
    PaymentAlreadySettled,

    #[error("Usuário já cadastrado")]
    DuplicateUser,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Armazenamento não respondeu a tempo")]
    StoreTimeout,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Chave usada no catálogo de mensagens.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => "validation_error",
            AppError::NotAuthenticated => "not_authenticated",
            AppError::NotAuthorized => "not_authorized",
            AppError::NotFound => "not_found",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::PaymentMethodRequired => "payment_method_required",
            AppError::NoPaymentAttached => "no_payment_attached",
            AppError::PaymentAlreadySettled => "payment_already_settled",
            AppError::DuplicateUser => "duplicate_user",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::StoreTimeout | AppError::DatabaseError(_) => "store_unavailable",
            AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::PaymentMethodRequired
            | AppError::NoPaymentAttached => StatusCode::BAD_REQUEST,
            AppError::NotAuthenticated
            | AppError::InvalidCredentials
            | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::NotAuthorized => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::DuplicateUser
            | AppError::InvalidTransition { .. }
            | AppError::PaymentAlreadySettled => StatusCode::CONFLICT,
            AppError::StoreTimeout | AppError::DatabaseError(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta HTTP, no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        let error = i18n.message(&locale.0, self.code());

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut fields = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let key = e.message.as_deref().unwrap_or(e.code.as_ref());
                            Value::String(i18n.message(&locale.0, key))
                        })
                        .collect();
                    fields.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(fields))
            }
            AppError::InvalidInput(key) => Some(json!({ "reason": i18n.message(&locale.0, key) })),
            AppError::InvalidTransition { from, to } => Some(json!({ "from": from, "to": to })),
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!("Falha ao processar requisição: {}", self);
        }

        ApiError { status, error, details }
    }
}

/// Resposta de erro já traduzida.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}
