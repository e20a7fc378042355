pub mod listener;
pub mod memory;
pub mod request_repo;
pub mod user_repo;

pub use listener::spawn_change_listener;
pub use memory::{InMemoryRequestStore, InMemoryUserDirectory};
pub use request_repo::RequestRepository;
pub use user_repo::UserRepository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::RegisteredUser,
        service_request::{RequestPatch, ServiceRequest, Status},
    },
};

/// Estado que o registro ainda precisa ter no momento da gravação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// O status gravado é o mesmo lido antes de planejar a mescla.
    StatusIs(Status),
    /// Há cobrança e ela ainda não foi baixada.
    PaymentOpen,
}

impl Precondition {
    pub fn holds_for(self, request: &ServiceRequest) -> bool {
        match self {
            Precondition::StatusIs(expected) => request.status == expected,
            Precondition::PaymentOpen => request.payment.as_ref().is_some_and(|p| !p.is_paid),
        }
    }

    /// Erro de negócio correspondente, avaliado contra o registro já alterado por outra escrita.
    pub fn violation(self, current: &ServiceRequest, patch: &RequestPatch) -> AppError {
        match self {
            Precondition::StatusIs(expected) => AppError::InvalidTransition {
                from: current.status,
                to: patch.status.unwrap_or(expected),
            },
            Precondition::PaymentOpen => match current.payment {
                Some(_) => AppError::PaymentAlreadySettled,
                None => AppError::NoPaymentAttached,
            },
        }
    }
}

/// Coleção autoritativa de chamados. Postgres em produção, memória em testes/local.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn insert(&self, request: &ServiceRequest) -> Result<(), AppError>;

    /// Mescla os campos presentes; `NotFound` se o id não existir.
    /// A pré-condição é conferida no mesmo passo da gravação: se falhar, nada é gravado.
    async fn update(
        &self,
        id: Uuid,
        patch: &RequestPatch,
        precondition: Option<Precondition>,
    ) -> Result<ServiceRequest, AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ServiceRequest>, AppError>;

    async fn list_all(&self) -> Result<Vec<ServiceRequest>, AppError>;

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<ServiceRequest>, AppError>;

    async fn list_by_status(&self, status: Status) -> Result<Vec<ServiceRequest>, AppError>;

    /// true quando o próprio armazenamento avisa o feed de alterações (LISTEN/NOTIFY).
    fn pushes_changes(&self) -> bool {
        false
    }
}

/// Diretório de moradores cadastrados.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Insere o morador; `DuplicateUser` se o WhatsApp ou nome+final já existirem.
    async fn insert(&self, user: &RegisteredUser) -> Result<(), AppError>;

    /// Verdadeiro se o WhatsApp ou a combinação nome (sem caixa) + 4 dígitos já existir.
    async fn conflicts_with(&self, whatsapp: &str, first_name: &str, whatsapp_last4: &str) -> Result<bool, AppError>;

    async fn find_by_login(&self, first_name: &str, whatsapp_last4: &str) -> Result<Option<RegisteredUser>, AppError>;
}
