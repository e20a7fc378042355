// src/services/request_service.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{db_utils::within_store_timeout, error::AppError},
    db::{Precondition, RequestStore},
    models::{
        auth::Session,
        service_request::{NewServiceRequest, RequestUpdate, ServiceRequest, Status},
    },
    services::{
        events::{ChangeEvent, ChangeFeed, ChangeKind},
        lifecycle,
    },
};

/// Único ponto de mutação dos chamados. Toda operação recebe a sessão explicitamente.
#[derive(Clone)]
pub struct RequestService {
    store: Arc<dyn RequestStore>,
    feed: ChangeFeed,
    timeout: Duration,
}

impl RequestService {
    pub fn new(store: Arc<dyn RequestStore>, feed: ChangeFeed, timeout: Duration) -> Self {
        Self { store, feed, timeout }
    }

    fn notify(&self, kind: ChangeKind, id: Uuid) {
        // O Postgres avisa via trigger; aqui só quando o armazenamento não o faz
        if !self.store.pushes_changes() {
            self.feed.publish(ChangeEvent::new(kind, Some(id)));
        }
    }

    async fn load(&self, id: Uuid) -> Result<ServiceRequest, AppError> {
        within_store_timeout(self.timeout, self.store.find_by_id(id))
            .await?
            .ok_or(AppError::NotFound)
    }

    // --- ABERTURA ---

    pub async fn create(&self, session: &Session, input: NewServiceRequest) -> Result<ServiceRequest, AppError> {
        let now = Utc::now();
        session.ensure_active(now)?;
        input.validate()?;

        let contact = input
            .contact
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .or_else(|| session.user.whatsapp_last4.as_ref().map(|d| format!("WhatsApp: {}", d)))
            .unwrap_or_default();

        // Status e cobrança nunca vêm da entrada
        let request = ServiceRequest {
            id: Uuid::new_v4(),
            user_id: session.user.id.clone(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            category: input.category.trim().to_string(),
            location: input.location.trim().to_string(),
            requester: session.user.full_name.clone(),
            contact,
            priority: input.priority.unwrap_or_default(),
            status: Status::Pending,
            created_at: now,
            scheduled_days: None,
            scheduled_date: None,
            completed_at: None,
            payment: None,
        };

        within_store_timeout(self.timeout, self.store.insert(&request)).await?;

        tracing::info!("📝 Chamado {} aberto por {}", request.id, request.user_id);
        self.notify(ChangeKind::Created, request.id);

        Ok(request)
    }

    // --- EDIÇÃO DO PLANEJADOR ---

    pub async fn update(&self, session: &Session, id: Uuid, update: RequestUpdate) -> Result<ServiceRequest, AppError> {
        let now = Utc::now();
        session.require_planner(now)?;
        update.validate()?;

        let current = self.load(id).await?;
        let patch = lifecycle::plan_update(&current, &update, now).inspect_err(|e| {
            tracing::warn!("Edição recusada no chamado {}: {}", id, e);
        })?;

        if patch.is_empty() {
            return Ok(current);
        }

        // O plano vale só para o status lido; outra escrita no meio derruba esta
        let precondition = patch.touches_lifecycle().then_some(Precondition::StatusIs(current.status));
        let updated = within_store_timeout(self.timeout, self.store.update(id, &patch, precondition))
            .await
            .inspect_err(|e| tracing::warn!("Edição recusada no chamado {}: {}", id, e))?;

        if updated.status != current.status {
            tracing::info!("🔁 Chamado {}: {} -> {}", id, current.status, updated.status);
        }
        self.notify(ChangeKind::Updated, id);

        Ok(updated)
    }

    pub async fn settle_payment(
        &self,
        session: &Session,
        id: Uuid,
        payment_method: Option<&str>,
        notes: Option<&str>,
    ) -> Result<ServiceRequest, AppError> {
        let now = Utc::now();
        session.require_planner(now)?;

        let current = self.load(id).await?;
        let patch = lifecycle::plan_settlement(&current, payment_method, notes, now)?;

        let updated =
            within_store_timeout(self.timeout, self.store.update(id, &patch, Some(Precondition::PaymentOpen))).await?;

        tracing::info!("💰 Pagamento do chamado {} registrado", id);
        self.notify(ChangeKind::Updated, id);

        Ok(updated)
    }

    pub async fn delete(&self, session: &Session, id: Uuid) -> Result<(), AppError> {
        session.require_planner(Utc::now())?;

        within_store_timeout(self.timeout, self.store.delete(id)).await?;

        tracing::info!("🗑️ Chamado {} removido", id);
        self.notify(ChangeKind::Deleted, id);
        Ok(())
    }

    // --- CONSULTAS ---

    /// Planejador lê qualquer chamado; morador só os próprios (os demais "não existem").
    pub async fn get(&self, session: &Session, id: Uuid) -> Result<ServiceRequest, AppError> {
        session.ensure_active(Utc::now())?;

        let request = self.load(id).await?;
        if !session.is_planner() && request.user_id != session.user.id {
            return Err(AppError::NotFound);
        }
        Ok(request)
    }

    pub async fn list_visible(&self, session: &Session) -> Result<Vec<ServiceRequest>, AppError> {
        session.ensure_active(Utc::now())?;

        if session.is_planner() {
            within_store_timeout(self.timeout, self.store.list_all()).await
        } else {
            within_store_timeout(self.timeout, self.store.list_by_owner(&session.user.id)).await
        }
    }

    pub async fn list_by_owner(&self, session: &Session, owner_id: &str) -> Result<Vec<ServiceRequest>, AppError> {
        session.ensure_active(Utc::now())?;

        if !session.is_planner() && session.user.id != owner_id {
            return Err(AppError::NotAuthorized);
        }
        within_store_timeout(self.timeout, self.store.list_by_owner(owner_id)).await
    }

    pub async fn list_by_status(&self, session: &Session, status: Status) -> Result<Vec<ServiceRequest>, AppError> {
        session.require_planner(Utc::now())?;
        within_store_timeout(self.timeout, self.store.list_by_status(status)).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::InMemoryRequestStore;
    use crate::models::auth::{Role, User};
    use crate::models::service_request::{PaymentMethod, Priority};
    use crate::services::dashboard_service::compute_stats;
    use chrono::TimeDelta;
    use rust_decimal::Decimal;

    pub(crate) fn planner_session() -> Session {
        Session {
            user: User::planner(),
            token_id: Uuid::new_v4(),
            expires_at: Utc::now() + TimeDelta::hours(1),
        }
    }

    pub(crate) fn client_session(id: &str) -> Session {
        Session {
            user: User {
                id: id.to_string(),
                first_name: "João".into(),
                full_name: "João Silva".into(),
                role: Role::Client,
                whatsapp_last4: Some("4321".into()),
            },
            token_id: Uuid::new_v4(),
            expires_at: Utc::now() + TimeDelta::hours(1),
        }
    }

    pub(crate) fn leak() -> NewServiceRequest {
        NewServiceRequest {
            title: "Leak".into(),
            description: "Torneira pingando".into(),
            category: "hydraulic".into(),
            location: "Apto 301".into(),
            contact: None,
            priority: Some(Priority::Medium),
        }
    }

    fn service() -> (RequestService, ChangeFeed) {
        let feed = ChangeFeed::default();
        let store = Arc::new(InMemoryRequestStore::new());
        (RequestService::new(store, feed.clone(), Duration::from_secs(1)), feed)
    }

    #[tokio::test]
    async fn create_forces_pending_without_payment() {
        let (svc, _) = service();
        let u1 = client_session("u1");

        let created = svc.create(&u1, leak()).await.unwrap();

        assert_eq!(created.status, Status::Pending);
        assert!(created.payment.is_none());
        assert_eq!(created.user_id, "u1");
        assert_eq!(created.requester, "João Silva");
        assert_eq!(created.contact, "WhatsApp: 4321");
    }

    #[tokio::test]
    async fn create_rejects_expired_session_and_blank_fields() {
        let (svc, _) = service();
        let mut expired = client_session("u1");
        expired.expires_at = Utc::now() - TimeDelta::minutes(1);
        assert!(matches!(svc.create(&expired, leak()).await, Err(AppError::NotAuthenticated)));

        let mut blank = leak();
        blank.title = "   ".into();
        assert!(matches!(svc.create(&client_session("u1"), blank).await, Err(AppError::ValidationError(_))));
        assert!(svc.list_visible(&planner_session()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clients_cannot_use_planner_operations() {
        let (svc, _) = service();
        let u1 = client_session("u1");
        let created = svc.create(&u1, leak()).await.unwrap();

        let update = RequestUpdate { status: Some(Status::Scheduled), ..RequestUpdate::default() };
        assert!(matches!(svc.update(&u1, created.id, update).await, Err(AppError::NotAuthorized)));
        assert!(matches!(
            svc.settle_payment(&u1, created.id, Some("pix"), None).await,
            Err(AppError::NotAuthorized)
        ));
        assert!(matches!(svc.delete(&u1, created.id).await, Err(AppError::NotAuthorized)));
        assert!(matches!(svc.list_by_status(&u1, Status::Pending).await, Err(AppError::NotAuthorized)));
        assert!(matches!(svc.list_by_owner(&u1, "u2").await, Err(AppError::NotAuthorized)));
    }

    #[tokio::test]
    async fn owner_query_returns_exactly_the_owner_subset() {
        let (svc, _) = service();
        let planner = planner_session();
        let a = svc.create(&client_session("u1"), leak()).await.unwrap();
        svc.create(&client_session("u2"), leak()).await.unwrap();
        let c = svc.create(&client_session("u1"), leak()).await.unwrap();

        let mine: Vec<_> = svc.list_by_owner(&planner, "u1").await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(mine, vec![a.id, c.id]);
        assert!(svc.list_by_owner(&planner, "desconhecido").await.unwrap().is_empty());
        assert_eq!(svc.list_visible(&client_session("u2")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn other_clients_requests_are_not_found() {
        let (svc, _) = service();
        let created = svc.create(&client_session("u1"), leak()).await.unwrap();

        assert!(matches!(svc.get(&client_session("u2"), created.id).await, Err(AppError::NotFound)));
        assert_eq!(svc.get(&planner_session(), created.id).await.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn full_lifecycle_scenario() {
        let (svc, _) = service();
        let planner = planner_session();
        let r1 = svc.create(&client_session("u1"), leak()).await.unwrap();

        let scheduled = svc
            .update(&planner, r1.id, RequestUpdate {
                status: Some(Status::Scheduled),
                scheduled_days: Some(5),
                ..RequestUpdate::default()
            })
            .await
            .unwrap();
        let scheduled_date = scheduled.scheduled_date.unwrap();
        assert!(scheduled_date - r1.created_at >= TimeDelta::days(5));

        // Reler não recalcula a data
        let reread = svc.get(&planner, r1.id).await.unwrap();
        assert_eq!(reread.scheduled_date, Some(scheduled_date));

        let completed = svc
            .update(&planner, r1.id, RequestUpdate {
                status: Some(Status::Completed),
                payment_amount: Some(Decimal::new(4500, 2)),
                ..RequestUpdate::default()
            })
            .await
            .unwrap();
        let completed_at = completed.completed_at.unwrap();
        let payment = completed.payment.clone().unwrap();
        assert_eq!(payment.amount, Decimal::new(4500, 2));
        assert!(!payment.is_paid);
        assert_eq!(payment.due_date, completed_at + TimeDelta::days(7));
        assert_eq!(completed.scheduled_date, Some(scheduled_date));

        let paid = svc.settle_payment(&planner, r1.id, Some("pix"), None).await.unwrap();
        let payment = paid.payment.unwrap();
        assert!(payment.is_paid);
        assert!(payment.paid_at.is_some());
        assert_eq!(payment.payment_method, Some(PaymentMethod::Pix));

        let all = svc.list_visible(&planner).await.unwrap();
        let stats = compute_stats(&all, Utc::now());
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.total_revenue, Decimal::new(4500, 2));
        assert_eq!(stats.pending_payments, 0);
    }

    #[tokio::test]
    async fn settling_twice_does_not_double_count_revenue() {
        let (svc, _) = service();
        let planner = planner_session();
        let r1 = svc.create(&client_session("u1"), leak()).await.unwrap();
        svc.update(&planner, r1.id, RequestUpdate {
            status: Some(Status::Completed),
            payment_amount: Some(Decimal::new(4500, 2)),
            ..RequestUpdate::default()
        })
        .await
        .unwrap();

        let first = svc.settle_payment(&planner, r1.id, Some("cash"), None).await.unwrap();
        let second = svc.settle_payment(&planner, r1.id, Some("pix"), None).await;
        assert!(matches!(second, Err(AppError::PaymentAlreadySettled)));

        let after = svc.get(&planner, r1.id).await.unwrap();
        assert_eq!(after.payment, first.payment);
        let stats = compute_stats(&svc.list_visible(&planner).await.unwrap(), Utc::now());
        assert_eq!(stats.total_revenue, Decimal::new(4500, 2));
    }

    #[tokio::test]
    async fn backward_transition_leaves_record_untouched() {
        let (svc, _) = service();
        let planner = planner_session();
        let r1 = svc.create(&client_session("u1"), leak()).await.unwrap();
        svc.update(&planner, r1.id, RequestUpdate { status: Some(Status::InProgress), ..RequestUpdate::default() })
            .await
            .unwrap();

        let back = svc
            .update(&planner, r1.id, RequestUpdate { status: Some(Status::Pending), ..RequestUpdate::default() })
            .await;

        assert!(matches!(back, Err(AppError::InvalidTransition { .. })));
        assert_eq!(svc.get(&planner, r1.id).await.unwrap().status, Status::InProgress);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let (svc, _) = service();
        let planner = planner_session();
        let id = Uuid::new_v4();

        assert!(matches!(svc.get(&planner, id).await, Err(AppError::NotFound)));
        assert!(matches!(svc.update(&planner, id, RequestUpdate::default()).await, Err(AppError::NotFound)));
        assert!(matches!(svc.delete(&planner, id).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn mutations_are_published_on_the_feed() {
        let (svc, feed) = service();
        let mut rx = feed.subscribe();

        let created = svc.create(&client_session("u1"), leak()).await.unwrap();
        svc.delete(&planner_session(), created.id).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, ChangeKind::Created);
        assert_eq!(first.request_id, Some(created.id));
        assert_eq!(rx.recv().await.unwrap().kind, ChangeKind::Deleted);
    }

    /// Armazenamento cujas leituras demoram, para intercalar escritas concorrentes.
    struct SlowReads(InMemoryRequestStore);

    #[async_trait::async_trait]
    impl RequestStore for SlowReads {
        async fn insert(&self, request: &ServiceRequest) -> Result<(), AppError> {
            self.0.insert(request).await
        }

        async fn update(
            &self,
            id: Uuid,
            patch: &crate::models::service_request::RequestPatch,
            precondition: Option<Precondition>,
        ) -> Result<ServiceRequest, AppError> {
            self.0.update(id, patch, precondition).await
        }

        async fn delete(&self, id: Uuid) -> Result<(), AppError> {
            self.0.delete(id).await
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<ServiceRequest>, AppError> {
            let found = self.0.find_by_id(id).await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            found
        }

        async fn list_all(&self) -> Result<Vec<ServiceRequest>, AppError> {
            self.0.list_all().await
        }

        async fn list_by_owner(&self, user_id: &str) -> Result<Vec<ServiceRequest>, AppError> {
            self.0.list_by_owner(user_id).await
        }

        async fn list_by_status(&self, status: Status) -> Result<Vec<ServiceRequest>, AppError> {
            self.0.list_by_status(status).await
        }
    }

    fn slow_service() -> RequestService {
        let store = Arc::new(SlowReads(InMemoryRequestStore::new()));
        RequestService::new(store, ChangeFeed::default(), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn concurrent_transitions_from_the_same_status_apply_only_one() {
        let svc = slow_service();
        let planner = planner_session();
        let r1 = svc.create(&client_session("u1"), leak()).await.unwrap();

        let complete = RequestUpdate {
            status: Some(Status::Completed),
            payment_amount: Some(Decimal::new(4500, 2)),
            ..RequestUpdate::default()
        };
        let progress = RequestUpdate { status: Some(Status::InProgress), ..RequestUpdate::default() };

        let (completed, progressed) =
            tokio::join!(svc.update(&planner, r1.id, complete), svc.update(&planner, r1.id, progress));

        assert_ne!(completed.is_ok(), progressed.is_ok());
        let loser = if completed.is_ok() { &progressed } else { &completed };
        assert!(matches!(loser, Err(AppError::InvalidTransition { .. })));

        let stored = svc.get(&planner, r1.id).await.unwrap();
        if completed.is_ok() {
            assert_eq!(stored.status, Status::Completed);
            assert_eq!(stored.payment.unwrap().amount, Decimal::new(4500, 2));
        } else {
            assert_eq!(stored.status, Status::InProgress);
            assert!(stored.payment.is_none());
        }
    }

    #[tokio::test]
    async fn concurrent_settlements_record_a_single_payment() {
        let svc = slow_service();
        let planner = planner_session();
        let r1 = svc.create(&client_session("u1"), leak()).await.unwrap();
        svc.update(&planner, r1.id, RequestUpdate {
            status: Some(Status::Completed),
            payment_amount: Some(Decimal::new(4500, 2)),
            ..RequestUpdate::default()
        })
        .await
        .unwrap();

        let (cash, pix) = tokio::join!(
            svc.settle_payment(&planner, r1.id, Some("cash"), None),
            svc.settle_payment(&planner, r1.id, Some("pix"), None),
        );

        assert_ne!(cash.is_ok(), pix.is_ok());
        let loser = if cash.is_ok() { &pix } else { &cash };
        assert!(matches!(loser, Err(AppError::PaymentAlreadySettled)));

        let expected = if cash.is_ok() { PaymentMethod::Cash } else { PaymentMethod::Pix };
        let payment = svc.get(&planner, r1.id).await.unwrap().payment.unwrap();
        assert!(payment.is_paid);
        assert_eq!(payment.payment_method, Some(expected));
    }
}
