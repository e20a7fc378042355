//! Feed de alterações dos chamados, sobre um `tokio::sync::broadcast`.
//!
//! Cada aviso só diz "algo mudou": quem escuta recarrega a coleção inteira
//! e recalcula os indicadores. Não há diff nem merge incremental.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    /// Alteração no banco sem operação reconhecida.
    External,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub request_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, request_id: Option<Uuid>) -> Self {
        Self { kind, request_id, at: Utc::now() }
    }
}

const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Com o buffer cheio, os avisos mais antigos são descartados e o
    /// assinante lento recebe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: ChangeEvent) {
        // Sem assinantes o envio falha; não há nada a fazer.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_the_event() {
        let feed = ChangeFeed::default();
        let mut rx1 = feed.subscribe();
        let mut rx2 = feed.subscribe();
        let id = Uuid::new_v4();

        feed.publish(ChangeEvent::new(ChangeKind::Created, Some(id)));

        assert_eq!(rx1.recv().await.unwrap().request_id, Some(id));
        assert_eq!(rx2.recv().await.unwrap().kind, ChangeKind::Created);
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        ChangeFeed::default().publish(ChangeEvent::new(ChangeKind::External, None));
    }

    #[tokio::test]
    async fn slow_subscriber_observes_lag() {
        let feed = ChangeFeed::new(1);
        let mut rx = feed.subscribe();

        feed.publish(ChangeEvent::new(ChangeKind::Updated, None));
        feed.publish(ChangeEvent::new(ChangeKind::Deleted, None));

        assert!(matches!(rx.recv().await, Err(broadcast::error::RecvError::Lagged(1))));
        assert_eq!(rx.recv().await.unwrap().kind, ChangeKind::Deleted);
    }
}
