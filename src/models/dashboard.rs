// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

// Contadores do painel. Derivados a cada leitura, nunca persistidos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: u64,
    pub pending: u64,
    pub scheduled: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub overdue: u64,       // agendamento vencido + cobrança vencida (mesmo contador)
    #[schema(value_type = f64)]
    pub total_revenue: Decimal, // pago ou não
    pub pending_payments: u64,
}

// Aba financeira do planejador
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub paid_count: u64,
    #[schema(value_type = f64)]
    pub paid_total: Decimal,
    pub pending_count: u64,
    #[schema(value_type = f64)]
    pub pending_total: Decimal,
    pub overdue_count: u64,
    #[schema(value_type = f64)]
    pub overdue_total: Decimal,
}
