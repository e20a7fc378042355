// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::common::validation::{four_digits, not_blank, whatsapp_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Planner,
}

/// Morador cadastrado (diretório de clientes). Criado uma vez, nunca alterado.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: Uuid,
    #[schema(example = "João")]
    pub first_name: String,
    #[schema(example = "Silva")]
    pub last_name: String,
    #[schema(example = "11987654321")]
    pub whatsapp: String,
    #[schema(example = "4321")]
    pub whatsapp_last4: String,
    #[schema(example = "joao@email.com")]
    pub email: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl RegisteredUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Identidade autenticada usada pela interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[schema(example = "João")]
    pub first_name: String,
    #[schema(example = "João Silva")]
    pub full_name: String,
    pub role: Role,
    #[schema(example = "4321")]
    pub whatsapp_last4: Option<String>,
}

impl User {
    pub fn client_from(registered: &RegisteredUser) -> Self {
        Self {
            id: registered.id.to_string(),
            first_name: registered.first_name.clone(),
            full_name: registered.full_name(),
            role: Role::Client,
            whatsapp_last4: Some(registered.whatsapp_last4.clone()),
        }
    }

    /// Identidade fixa do planejador.
    pub fn planner() -> Self {
        Self {
            id: "planner".to_string(),
            first_name: "Planejador".to_string(),
            full_name: "Planejador CGPL".to_string(),
            role: Role::Planner,
            whatsapp_last4: None,
        }
    }
}

/// Sessão explícita: quem está agindo, até quando, e o id do token que a carrega.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_planner(&self) -> bool {
        self.user.role == Role::Planner
    }

    /// Garante que a sessão ainda vale no instante `now`.
    pub fn ensure_active(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        if now >= self.expires_at {
            return Err(AppError::NotAuthenticated);
        }
        Ok(())
    }

    pub fn require_planner(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        self.ensure_active(now)?;
        if !self.is_planner() {
            return Err(AppError::NotAuthorized);
        }
        Ok(())
    }
}

// Dados para registro de um novo morador
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(custom(function = "not_blank"))]
    #[schema(example = "João")]
    pub first_name: String,

    #[validate(custom(function = "not_blank"))]
    #[schema(example = "Silva")]
    pub last_name: String,

    #[validate(custom(function = "whatsapp_number"))]
    #[schema(example = "(11) 98765-4321")]
    pub whatsapp: String,

    #[validate(email(message = "invalid_email"))]
    #[schema(example = "joao@email.com")]
    pub email: Option<String>,
}

// Login do morador: primeiro nome + últimos 4 dígitos do WhatsApp
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUserPayload {
    #[validate(custom(function = "not_blank"))]
    #[schema(example = "João")]
    pub first_name: String,

    #[validate(custom(function = "four_digits"))]
    #[schema(example = "4321")]
    pub whatsapp_last4: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PlannerLoginPayload {
    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub first_name: String,
    pub full_name: String,
    pub role: Role,
    pub last4: Option<String>,
    pub jti: Uuid,
    pub exp: usize,
    pub iat: usize,
}
