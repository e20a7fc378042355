// src/models/service_request.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{non_negative, not_blank};

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Pending,
    Scheduled,
    InProgress,
    Completed,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Pending, Status::Scheduled, Status::InProgress, Status::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Scheduled => "scheduled",
            Status::InProgress => "in-progress",
            Status::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "Pendente",
            Status::Scheduled => "Agendado",
            Status::InProgress => "Em Andamento",
            Status::Completed => "Concluído",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Baixa",
            Priority::Medium => "Média",
            Priority::High => "Alta",
            Priority::Urgent => "Urgente",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Pix,
    Cash,
    Card,
    Transfer,
    Boleto,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Pix,
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Transfer,
        PaymentMethod::Boleto,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Pix => "pix",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Boleto => "boleto",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Pix => "PIX",
            PaymentMethod::Cash => "Dinheiro",
            PaymentMethod::Card => "Cartão",
            PaymentMethod::Transfer => "Transferência",
            PaymentMethod::Boleto => "Boleto",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(value))
            .ok_or(())
    }
}

// --- Structs ---

/// Cobrança anexada a um chamado concluído.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[schema(value_type = f64, example = 45.0)]
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    #[schema(example = "Pagamento via PIX confirmado")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: Uuid,
    /// Dono do chamado. Nunca muda depois da criação.
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub user_id: String,
    #[schema(example = "Vazamento na torneira da cozinha")]
    pub title: String,
    pub description: String,
    #[schema(example = "hydraulic")]
    pub category: String,
    #[schema(example = "Apartamento 301 - Cozinha")]
    pub location: String,
    #[schema(example = "João Silva")]
    pub requester: String,
    #[schema(example = "(11) 98765-4321")]
    pub contact: String,
    pub priority: Priority,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    #[schema(example = 3)]
    pub scheduled_days: Option<i32>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub payment: Option<Payment>,
}

/// Linha da tabela `service_requests`: a cobrança fica "achatada" nas colunas `payment_*`.
#[derive(Debug, Clone, FromRow)]
pub struct ServiceRequestRow {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub requester: String,
    pub contact: String,
    pub priority: Priority,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub scheduled_days: Option<i32>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub payment_amount: Option<Decimal>,
    pub payment_due_date: Option<DateTime<Utc>>,
    pub payment_is_paid: Option<bool>,
    pub payment_paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_notes: Option<String>,
}

impl From<ServiceRequestRow> for ServiceRequest {
    fn from(row: ServiceRequestRow) -> Self {
        // Só existe cobrança quando há valor e vencimento gravados
        let payment = match (row.payment_amount, row.payment_due_date) {
            (Some(amount), Some(due_date)) => Some(Payment {
                amount,
                due_date,
                is_paid: row.payment_is_paid.unwrap_or(false),
                paid_at: row.payment_paid_at,
                payment_method: row.payment_method,
                notes: row.payment_notes,
            }),
            _ => None,
        };

        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            category: row.category,
            location: row.location,
            requester: row.requester,
            contact: row.contact,
            priority: row.priority,
            status: row.status,
            created_at: row.created_at,
            scheduled_days: row.scheduled_days,
            scheduled_date: row.scheduled_date,
            completed_at: row.completed_at,
            payment,
        }
    }
}

// --- Entradas ---

/// Dados de abertura de um chamado. Campos de status ou cobrança enviados
/// pelo cliente são ignorados: todo chamado nasce pendente e sem cobrança.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewServiceRequest {
    #[validate(custom(function = "not_blank"))]
    #[schema(example = "Vazamento")]
    pub title: String,

    #[validate(custom(function = "not_blank"))]
    #[schema(example = "Torneira da pia da cozinha está pingando constantemente.")]
    pub description: String,

    #[validate(custom(function = "not_blank"))]
    #[schema(example = "hydraulic")]
    pub category: String,

    #[validate(custom(function = "not_blank"))]
    #[schema(example = "Apartamento 301 - Cozinha")]
    pub location: String,

    #[serde(default)]
    pub contact: Option<String>,

    #[serde(default)]
    pub priority: Option<Priority>,
}

/// Edição do planejador. Os campos de ciclo de vida passam pela tabela de transições.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestUpdate {
    #[validate(custom(function = "not_blank"))]
    pub title: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub description: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub category: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub location: Option<String>,
    pub contact: Option<String>,
    pub priority: Option<Priority>,

    pub status: Option<Status>,

    #[validate(range(min = 1, max = 365, message = "scheduled_days_range"))]
    #[schema(example = 5)]
    pub scheduled_days: Option<i32>,

    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = Option<f64>, example = 45.0)]
    pub payment_amount: Option<Decimal>,

    pub payment_notes: Option<String>,
}

/// Baixa de pagamento. A forma de pagamento chega como texto para que ausência
/// e valor desconhecido resultem no mesmo erro de negócio.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlePaymentPayload {
    #[schema(example = "pix")]
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

/// Mescla parcial aplicada pelo armazenamento. `Some` sobrescreve o campo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub contact: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub scheduled_days: Option<i32>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub payment: Option<Payment>,
}

impl RequestPatch {
    pub fn is_empty(&self) -> bool {
        *self == RequestPatch::default()
    }

    /// Mexe em status, datas ou cobrança (campos decididos pelo ciclo de vida).
    pub fn touches_lifecycle(&self) -> bool {
        self.status.is_some()
            || self.scheduled_days.is_some()
            || self.scheduled_date.is_some()
            || self.completed_at.is_some()
            || self.payment.is_some()
    }

    /// Aplica a mescla sobre um registro (usado pelo armazenamento em memória).
    pub fn apply_to(&self, request: &mut ServiceRequest) {
        if let Some(v) = &self.title {
            request.title = v.clone();
        }
        if let Some(v) = &self.description {
            request.description = v.clone();
        }
        if let Some(v) = &self.category {
            request.category = v.clone();
        }
        if let Some(v) = &self.location {
            request.location = v.clone();
        }
        if let Some(v) = &self.contact {
            request.contact = v.clone();
        }
        if let Some(v) = self.priority {
            request.priority = v;
        }
        if let Some(v) = self.status {
            request.status = v;
        }
        if let Some(v) = self.scheduled_days {
            request.scheduled_days = Some(v);
        }
        if let Some(v) = self.scheduled_date {
            request.scheduled_date = Some(v);
        }
        if let Some(v) = self.completed_at {
            request.completed_at = Some(v);
        }
        if let Some(v) = &self.payment {
            request.payment = Some(v.clone());
        }
    }
}

// GET /api/requests?status=...
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusFilter {
    pub status: Option<Status>,
}
