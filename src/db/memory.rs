// src/db/memory.rs
//
// Armazenamento em memória: mesma interface dos repositórios Postgres.
// Mantém a ordem de inserção nas consultas.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{Precondition, RequestStore, UserDirectory},
    models::{
        auth::RegisteredUser,
        service_request::{Payment, PaymentMethod, Priority, RequestPatch, ServiceRequest, Status},
    },
};

#[derive(Default)]
pub struct InMemoryRequestStore {
    requests: RwLock<Vec<ServiceRequest>>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_requests(requests: Vec<ServiceRequest>) -> Self {
        Self { requests: RwLock::new(requests) }
    }

    async fn filtered<P>(&self, predicate: P) -> Vec<ServiceRequest>
    where
        P: Fn(&ServiceRequest) -> bool,
    {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn insert(&self, request: &ServiceRequest) -> Result<(), AppError> {
        self.requests.write().await.push(request.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        patch: &RequestPatch,
        precondition: Option<Precondition>,
    ) -> Result<ServiceRequest, AppError> {
        let mut requests = self.requests.write().await;
        let request = requests.iter_mut().find(|r| r.id == id).ok_or(AppError::NotFound)?;
        // Conferência e gravação sob o mesmo lock
        if let Some(precondition) = precondition {
            if !precondition.holds_for(request) {
                return Err(precondition.violation(request, patch));
            }
        }
        patch.apply_to(request);
        Ok(request.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut requests = self.requests.write().await;
        let before = requests.len();
        requests.retain(|r| r.id != id);
        if requests.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ServiceRequest>, AppError> {
        Ok(self.requests.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ServiceRequest>, AppError> {
        Ok(self.requests.read().await.clone())
    }

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<ServiceRequest>, AppError> {
        Ok(self.filtered(|r| r.user_id == user_id).await)
    }

    async fn list_by_status(&self, status: Status) -> Result<Vec<ServiceRequest>, AppError> {
        Ok(self.filtered(|r| r.status == status).await)
    }
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<Vec<RegisteredUser>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<RegisteredUser>) -> Self {
        Self { users: RwLock::new(users) }
    }
}

fn same_login(user: &RegisteredUser, first_name: &str, whatsapp_last4: &str) -> bool {
    user.first_name.to_lowercase() == first_name.to_lowercase() && user.whatsapp_last4 == whatsapp_last4
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn insert(&self, user: &RegisteredUser) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        // Checagem e inserção sob o mesmo lock
        if users
            .iter()
            .any(|u| u.whatsapp == user.whatsapp || same_login(u, &user.first_name, &user.whatsapp_last4))
        {
            return Err(AppError::DuplicateUser);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn conflicts_with(&self, whatsapp: &str, first_name: &str, whatsapp_last4: &str) -> Result<bool, AppError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .any(|u| u.whatsapp == whatsapp || same_login(u, first_name, whatsapp_last4)))
    }

    async fn find_by_login(&self, first_name: &str, whatsapp_last4: &str) -> Result<Option<RegisteredUser>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| same_login(u, first_name, whatsapp_last4))
            .cloned())
    }
}

// --- Dados de demonstração (SEED_DEMO_DATA) ---

pub fn demo_users() -> Vec<RegisteredUser> {
    let now = Utc::now();
    vec![
        RegisteredUser {
            id: Uuid::new_v4(),
            first_name: "João".into(),
            last_name: "Silva".into(),
            whatsapp: "11987654321".into(),
            whatsapp_last4: "4321".into(),
            email: Some("joao@email.com".into()),
            registered_at: now - TimeDelta::days(30),
        },
        RegisteredUser {
            id: Uuid::new_v4(),
            first_name: "Maria".into(),
            last_name: "Santos".into(),
            whatsapp: "11976543210".into(),
            whatsapp_last4: "3210".into(),
            email: Some("maria@email.com".into()),
            registered_at: now - TimeDelta::days(20),
        },
    ]
}

pub fn demo_requests(users: &[RegisteredUser]) -> Vec<ServiceRequest> {
    let now = Utc::now();
    let owner = |i: usize| users.get(i).map(|u| u.id.to_string()).unwrap_or_default();
    let requester = |i: usize| users.get(i).map(|u| u.full_name()).unwrap_or_default();

    vec![
        ServiceRequest {
            id: Uuid::new_v4(),
            user_id: owner(0),
            title: "Vazamento na torneira da cozinha".into(),
            description: "Torneira da pia da cozinha está pingando constantemente. Já tentei apertar, mas não resolve.".into(),
            category: "hydraulic".into(),
            location: "Apartamento 301 - Cozinha".into(),
            requester: requester(0),
            contact: "(11) 98765-4321".into(),
            priority: Priority::Medium,
            status: Status::Pending,
            created_at: now - TimeDelta::days(1),
            scheduled_days: None,
            scheduled_date: None,
            completed_at: None,
            payment: None,
        },
        ServiceRequest {
            id: Uuid::new_v4(),
            user_id: owner(1),
            title: "Lâmpada queimada no corredor".into(),
            description: "Lâmpada do corredor principal queimou. Necessário trocar por LED.".into(),
            category: "electrical".into(),
            location: "Apartamento 205 - Corredor".into(),
            requester: requester(1),
            contact: "(11) 97654-3210".into(),
            priority: Priority::Low,
            status: Status::Completed,
            created_at: now - TimeDelta::days(10),
            scheduled_days: Some(2),
            scheduled_date: Some(now - TimeDelta::days(8)),
            completed_at: Some(now - TimeDelta::days(8)),
            payment: Some(Payment {
                amount: Decimal::new(4500, 2),
                due_date: now - TimeDelta::days(1),
                is_paid: true,
                paid_at: Some(now - TimeDelta::days(3)),
                payment_method: Some(PaymentMethod::Pix),
                notes: Some("Pagamento via PIX confirmado".into()),
            }),
        },
        ServiceRequest {
            id: Uuid::new_v4(),
            user_id: owner(0),
            title: "Ar condicionado não liga".into(),
            description: "Ar condicionado do quarto não está ligando. Controle funciona mas o aparelho não responde.".into(),
            category: "air-conditioning".into(),
            location: "Apartamento 102 - Quarto".into(),
            requester: requester(0),
            contact: "(11) 98765-4321".into(),
            priority: Priority::High,
            status: Status::Scheduled,
            created_at: now - TimeDelta::days(2),
            scheduled_days: Some(3),
            scheduled_date: Some(now + TimeDelta::days(1)),
            completed_at: None,
            payment: None,
        },
    ]
}
