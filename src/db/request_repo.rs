// src/db/request_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{Precondition, RequestStore},
    models::service_request::{RequestPatch, ServiceRequest, ServiceRequestRow, Status},
};

const COLUMNS: &str = r#"
    id, user_id, title, description, category, location, requester, contact,
    priority, status, created_at, scheduled_days, scheduled_date, completed_at,
    payment_amount, payment_due_date, payment_is_paid, payment_paid_at,
    payment_method, payment_notes
"#;

// O repositório de chamados, responsável por todas as interações com a tabela 'service_requests'
#[derive(Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_many(&self, sql: &str, filter: Option<FilterArg<'_>>) -> Result<Vec<ServiceRequest>, AppError> {
        let query = sqlx::query_as::<_, ServiceRequestRow>(sql);
        let query = match filter {
            Some(FilterArg::Owner(user_id)) => query.bind(user_id),
            Some(FilterArg::Status(status)) => query.bind(status),
            None => query,
        };
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ServiceRequest::from).collect())
    }
}

enum FilterArg<'a> {
    Owner(&'a str),
    Status(Status),
}

#[async_trait]
impl RequestStore for RequestRepository {
    async fn insert(&self, request: &ServiceRequest) -> Result<(), AppError> {
        let payment = request.payment.as_ref();

        sqlx::query(
            r#"
            INSERT INTO service_requests (
                id, user_id, title, description, category, location, requester, contact,
                priority, status, created_at, scheduled_days, scheduled_date, completed_at,
                payment_amount, payment_due_date, payment_is_paid, payment_paid_at,
                payment_method, payment_notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(request.id)
        .bind(&request.user_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.category)
        .bind(&request.location)
        .bind(&request.requester)
        .bind(&request.contact)
        .bind(request.priority)
        .bind(request.status)
        .bind(request.created_at)
        .bind(request.scheduled_days)
        .bind(request.scheduled_date)
        .bind(request.completed_at)
        .bind(payment.map(|p| p.amount))
        .bind(payment.map(|p| p.due_date))
        .bind(payment.map(|p| p.is_paid))
        .bind(payment.and_then(|p| p.paid_at))
        .bind(payment.and_then(|p| p.payment_method))
        .bind(payment.and_then(|p| p.notes.clone()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        patch: &RequestPatch,
        precondition: Option<Precondition>,
    ) -> Result<ServiceRequest, AppError> {
        let payment = patch.payment.as_ref();
        let expected_status = match precondition {
            Some(Precondition::StatusIs(status)) => Some(status),
            _ => None,
        };
        let require_open_payment = precondition == Some(Precondition::PaymentOpen);

        // COALESCE mantém o valor atual quando o campo não veio na mescla.
        // A cobrança é gravada inteira ($12 = "veio cobrança").
        let sql = format!(
            r#"
            UPDATE service_requests SET
                title          = COALESCE($2, title),
                description    = COALESCE($3, description),
                category       = COALESCE($4, category),
                location       = COALESCE($5, location),
                contact        = COALESCE($6, contact),
                priority       = COALESCE($7, priority),
                status         = COALESCE($8, status),
                scheduled_days = COALESCE($9, scheduled_days),
                scheduled_date = COALESCE($10, scheduled_date),
                completed_at   = COALESCE($11, completed_at),
                payment_amount   = CASE WHEN $12 THEN $13 ELSE payment_amount END,
                payment_due_date = CASE WHEN $12 THEN $14 ELSE payment_due_date END,
                payment_is_paid  = CASE WHEN $12 THEN $15 ELSE payment_is_paid END,
                payment_paid_at  = CASE WHEN $12 THEN $16 ELSE payment_paid_at END,
                payment_method   = CASE WHEN $12 THEN $17 ELSE payment_method END,
                payment_notes    = CASE WHEN $12 THEN $18 ELSE payment_notes END,
                updated_at = NOW()
            WHERE id = $1
              AND ($19::request_status IS NULL OR status = $19)
              AND (NOT $20 OR (payment_amount IS NOT NULL AND payment_is_paid IS NOT TRUE))
            RETURNING {COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, ServiceRequestRow>(&sql)
            .bind(id)
            .bind(patch.title.as_deref())
            .bind(patch.description.as_deref())
            .bind(patch.category.as_deref())
            .bind(patch.location.as_deref())
            .bind(patch.contact.as_deref())
            .bind(patch.priority)
            .bind(patch.status)
            .bind(patch.scheduled_days)
            .bind(patch.scheduled_date)
            .bind(patch.completed_at)
            .bind(payment.is_some())
            .bind(payment.map(|p| p.amount))
            .bind(payment.map(|p| p.due_date))
            .bind(payment.map(|p| p.is_paid))
            .bind(payment.and_then(|p| p.paid_at))
            .bind(payment.and_then(|p| p.payment_method))
            .bind(payment.and_then(|p| p.notes.clone()))
            .bind(expected_status)
            .bind(require_open_payment)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.into()),
            // Nenhuma linha: o id não existe ou outra escrita mudou o registro antes
            None => {
                let current = self.find_by_id(id).await?.ok_or(AppError::NotFound)?;
                match precondition {
                    Some(precondition) if !precondition.holds_for(&current) => {
                        Err(precondition.violation(&current, patch))
                    }
                    _ => Err(AppError::NotFound),
                }
            }
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM service_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ServiceRequest>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM service_requests WHERE id = $1");
        let row = sqlx::query_as::<_, ServiceRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ServiceRequest::from))
    }

    async fn list_all(&self) -> Result<Vec<ServiceRequest>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM service_requests ORDER BY created_at DESC");
        self.fetch_many(&sql, None).await
    }

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<ServiceRequest>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM service_requests WHERE user_id = $1 ORDER BY created_at DESC");
        self.fetch_many(&sql, Some(FilterArg::Owner(user_id))).await
    }

    async fn list_by_status(&self, status: Status) -> Result<Vec<ServiceRequest>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM service_requests WHERE status = $1 ORDER BY created_at DESC");
        self.fetch_many(&sql, Some(FilterArg::Status(status))).await
    }

    fn pushes_changes(&self) -> bool {
        true
    }
}
