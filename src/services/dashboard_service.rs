// src/services/dashboard_service.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{
    common::{db_utils::within_store_timeout, error::AppError},
    db::RequestStore,
    models::{
        auth::Session,
        dashboard::{DashboardStats, FinancialSummary},
        service_request::{ServiceRequest, Status},
    },
    services::lifecycle::{is_overdue, payment_overdue},
};

/// Agregação única sobre a coleção inteira. Coleção vazia = tudo zero.
pub fn compute_stats(requests: &[ServiceRequest], now: DateTime<Utc>) -> DashboardStats {
    requests.iter().fold(DashboardStats::default(), |mut acc, request| {
        acc.total += 1;

        // Atraso de agendamento e cobrança vencida somam no mesmo contador
        if is_overdue(request, now) {
            acc.overdue += 1;
        }

        match request.status {
            Status::Pending => acc.pending += 1,
            Status::Scheduled => acc.scheduled += 1,
            Status::InProgress => acc.in_progress += 1,
            Status::Completed => {
                acc.completed += 1;
                if let Some(payment) = &request.payment {
                    acc.total_revenue += payment.amount;
                    if !payment.is_paid {
                        acc.pending_payments += 1;
                    }
                }
            }
        }

        acc
    })
}

/// Visão da aba financeira: só chamados concluídos com cobrança.
pub fn compute_financial_summary(requests: &[ServiceRequest], now: DateTime<Utc>) -> FinancialSummary {
    requests
        .iter()
        .filter(|r| r.status == Status::Completed)
        .filter_map(|r| r.payment.as_ref().map(|p| (r, p)))
        .fold(FinancialSummary::default(), |mut acc, (request, payment)| {
            if payment.is_paid {
                acc.paid_count += 1;
                acc.paid_total += payment.amount;
            } else {
                acc.pending_count += 1;
                acc.pending_total += payment.amount;
                if payment_overdue(request, now) {
                    acc.overdue_count += 1;
                    acc.overdue_total += payment.amount;
                }
            }
            acc
        })
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn RequestStore>,
    timeout: Duration,
}

impl DashboardService {
    pub fn new(store: Arc<dyn RequestStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Planejador vê tudo; morador vê só os próprios chamados.
    pub async fn get_stats(&self, session: &Session, now: DateTime<Utc>) -> Result<DashboardStats, AppError> {
        session.ensure_active(now)?;

        let requests = if session.is_planner() {
            within_store_timeout(self.timeout, self.store.list_all()).await?
        } else {
            within_store_timeout(self.timeout, self.store.list_by_owner(&session.user.id)).await?
        };

        Ok(compute_stats(&requests, now))
    }

    pub async fn get_financial_summary(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<FinancialSummary, AppError> {
        session.require_planner(now)?;

        let requests = within_store_timeout(self.timeout, self.store.list_by_status(Status::Completed)).await?;
        Ok(compute_financial_summary(&requests, now))
    }
}
