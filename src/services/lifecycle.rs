// src/services/lifecycle.rs
//
// Máquina de estados do chamado e da cobrança. Funções puras: recebem o
// registro atual e o instante `now`, devolvem a mescla a ser gravada.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::service_request::{Payment, PaymentMethod, RequestPatch, RequestUpdate, ServiceRequest, Status},
};

pub const DEFAULT_SCHEDULED_DAYS: i32 = 3;
pub const PAYMENT_TERM_DAYS: i64 = 7;

/// Tabela de transições: só para frente, pulos permitidos, concluído é terminal.
pub fn allowed_targets(from: Status) -> &'static [Status] {
    match from {
        Status::Pending => &[Status::Scheduled, Status::InProgress, Status::Completed],
        Status::Scheduled => &[Status::InProgress, Status::Completed],
        Status::InProgress => &[Status::Completed],
        Status::Completed => &[],
    }
}

pub fn can_transition(from: Status, to: Status) -> bool {
    allowed_targets(from).contains(&to)
}

/// Traduz a edição do planejador em uma mescla coerente.
pub fn plan_update(
    current: &ServiceRequest,
    update: &RequestUpdate,
    now: DateTime<Utc>,
) -> Result<RequestPatch, AppError> {
    let mut patch = RequestPatch {
        title: update.title.as_ref().map(|v| v.trim().to_string()),
        description: update.description.as_ref().map(|v| v.trim().to_string()),
        category: update.category.as_ref().map(|v| v.trim().to_string()),
        location: update.location.as_ref().map(|v| v.trim().to_string()),
        contact: update.contact.as_ref().map(|v| v.trim().to_string()),
        priority: update.priority,
        ..RequestPatch::default()
    };

    let target = update.status.unwrap_or(current.status);
    let entering_completed = target == Status::Completed && current.status != Status::Completed;

    if update.payment_amount.is_some() && !entering_completed {
        return Err(AppError::InvalidInput("payment_requires_completion"));
    }

    if update.scheduled_days.is_some() && target != Status::Scheduled {
        return Err(AppError::InvalidInput("scheduled_days_requires_scheduling"));
    }

    if target == current.status {
        // Reenviar "agendado" com prazo explícito reagenda a partir de agora
        if target == Status::Scheduled {
            if let Some(days) = update.scheduled_days {
                apply_schedule(&mut patch, days, now)?;
            }
        }
        return Ok(patch);
    }

    if !can_transition(current.status, target) {
        return Err(AppError::InvalidTransition { from: current.status, to: target });
    }

    patch.status = Some(target);

    match target {
        Status::Scheduled => {
            let days = update.scheduled_days.unwrap_or(DEFAULT_SCHEDULED_DAYS);
            apply_schedule(&mut patch, days, now)?;
        }
        Status::Completed => {
            patch.completed_at = Some(now);
            if let Some(amount) = update.payment_amount {
                if amount.is_sign_negative() && !amount.is_zero() {
                    return Err(AppError::InvalidInput("non_negative"));
                }
                if amount > Decimal::ZERO {
                    patch.payment = Some(Payment {
                        amount,
                        due_date: now + TimeDelta::days(PAYMENT_TERM_DAYS),
                        is_paid: false,
                        paid_at: None,
                        payment_method: None,
                        notes: update
                            .payment_notes
                            .as_ref()
                            .map(|n| n.trim().to_string())
                            .filter(|n| !n.is_empty()),
                    });
                }
            }
        }
        Status::InProgress | Status::Pending => {}
    }

    Ok(patch)
}

fn apply_schedule(patch: &mut RequestPatch, days: i32, now: DateTime<Utc>) -> Result<(), AppError> {
    if days < 1 {
        return Err(AppError::InvalidInput("scheduled_days_range"));
    }
    patch.scheduled_days = Some(days);
    // Congelado aqui: leituras futuras não recalculam
    patch.scheduled_date = Some(now + TimeDelta::days(i64::from(days)));
    Ok(())
}

/// Baixa da cobrança: `unpaid -> paid`, sem volta.
pub fn plan_settlement(
    current: &ServiceRequest,
    method: Option<&str>,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<RequestPatch, AppError> {
    let payment = current.payment.as_ref().ok_or(AppError::NoPaymentAttached)?;

    if payment.is_paid {
        return Err(AppError::PaymentAlreadySettled);
    }

    let method: PaymentMethod = method
        .and_then(|m| m.parse().ok())
        .ok_or(AppError::PaymentMethodRequired)?;

    let notes = notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .or_else(|| payment.notes.clone());

    Ok(RequestPatch {
        payment: Some(Payment {
            is_paid: true,
            paid_at: Some(now),
            payment_method: Some(method),
            notes,
            ..payment.clone()
        }),
        ..RequestPatch::default()
    })
}

// --- Condições derivadas (calculadas na leitura, nunca gravadas) ---

pub fn schedule_overdue(request: &ServiceRequest, now: DateTime<Utc>) -> bool {
    request.status == Status::Scheduled && request.scheduled_date.is_some_and(|d| d < now)
}

pub fn payment_overdue(request: &ServiceRequest, now: DateTime<Utc>) -> bool {
    request
        .payment
        .as_ref()
        .is_some_and(|p| !p.is_paid && p.due_date < now)
}

pub fn is_overdue(request: &ServiceRequest, now: DateTime<Utc>) -> bool {
    schedule_overdue(request, now) || payment_overdue(request, now)
}
