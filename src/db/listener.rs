// src/db/listener.rs

use std::time::Duration;

use sqlx::{postgres::PgListener, PgPool};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::services::events::{ChangeEvent, ChangeFeed, ChangeKind};

pub const CHANGE_CHANNEL: &str = "service_requests_changed";

/// Encaminha os NOTIFY do trigger de `service_requests` para o feed de alterações.
/// O `PgListener` reconecta sozinho; se nem a conexão inicial funcionar, a task
/// termina e o app segue sem tempo real.
pub fn spawn_change_listener(pool: PgPool, feed: ChangeFeed) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut listener = match PgListener::connect_with(&pool).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!("🔥 Falha ao abrir LISTEN: {:?}", e);
                return;
            }
        };

        if let Err(e) = listener.listen(CHANGE_CHANNEL).await {
            tracing::error!("🔥 Falha ao escutar o canal '{}': {:?}", CHANGE_CHANNEL, e);
            return;
        }

        tracing::info!("📡 Escutando alterações em '{}'", CHANGE_CHANNEL);

        loop {
            match listener.try_recv().await {
                Ok(Some(notification)) => {
                    tracing::debug!("Alteração recebida: {}", notification.payload());
                    feed.publish(forwarded_event(Some(notification.payload())));
                }
                Ok(None) => {
                    // Reconectou: avisos emitidos durante a queda se perderam
                    tracing::warn!("Conexão de LISTEN restabelecida, pedindo ressincronização");
                    feed.publish(forwarded_event(None));
                }
                Err(e) => {
                    tracing::warn!("Conexão de LISTEN perdida, reconectando: {:?}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    })
}

/// `None` marca uma reconexão: sem saber o que mudou, os assinantes recarregam tudo.
fn forwarded_event(payload: Option<&str>) -> ChangeEvent {
    match payload {
        Some(payload) => parse_notification(payload),
        None => ChangeEvent::new(ChangeKind::External, None),
    }
}

/// Payload do trigger: `<TG_OP>:<id>`, por exemplo `UPDATE:550e8400-...`.
fn parse_notification(payload: &str) -> ChangeEvent {
    let (op, id) = payload.split_once(':').unwrap_or((payload, ""));
    let kind = match op {
        "INSERT" => ChangeKind::Created,
        "UPDATE" => ChangeKind::Updated,
        "DELETE" => ChangeKind::Deleted,
        _ => ChangeKind::External,
    };
    ChangeEvent::new(kind, Uuid::parse_str(id).ok())
}
