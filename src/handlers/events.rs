// src/handlers/events.rs

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    Stream, StreamExt,
};

use crate::{
    config::AppState,
    middleware::auth::AuthenticatedUser,
    services::events::{ChangeEvent, ChangeFeed},
};

// GET /api/requests/events
#[utoipa::path(
    get,
    path = "/api/requests/events",
    tag = "Requests",
    responses(
        (status = 200, description = "Eventos `changed` a cada alteração; `resync` se o cliente ficou para trás",
         content_type = "text/event-stream", body = ChangeEvent)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn stream_changes(
    State(app_state): State<AppState>,
    AuthenticatedUser(session): AuthenticatedUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("📡 {} assinou o feed de alterações", session.user.id);
    let include_ids = session.is_planner();
    Sse::new(change_events(&app_state.change_feed, include_ids)).keep_alive(KeepAlive::default())
}

/// Moradores só ficam sabendo que algo mudou; o id dos chamados alheios não sai.
fn visible_change(mut change: ChangeEvent, include_ids: bool) -> ChangeEvent {
    if !include_ids {
        change.request_id = None;
    }
    change
}

fn change_events(feed: &ChangeFeed, include_ids: bool) -> impl Stream<Item = Result<Event, Infallible>> + use<> {
    BroadcastStream::new(feed.subscribe()).map(move |item| {
        let event = match item {
            Ok(change) => Event::default()
                .event("changed")
                .json_data(visible_change(change, include_ids))
                .unwrap_or_else(|_| Event::default().event("changed")),
            // Avisos perdidos: o cliente recarrega tudo de qualquer forma
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                Event::default().event("resync").data(skipped.to_string())
            }
        };
        Ok(event)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::events::ChangeKind;

    #[tokio::test]
    async fn forwards_feed_events() {
        let feed = ChangeFeed::default();
        let mut events = Box::pin(change_events(&feed, false));

        feed.publish(ChangeEvent::new(ChangeKind::Created, None));

        assert!(events.next().await.is_some());
    }

    #[test]
    fn request_ids_reach_planners_only() {
        let id = uuid::Uuid::new_v4();
        let change = ChangeEvent::new(ChangeKind::Updated, Some(id));

        let for_planner = visible_change(change.clone(), true);
        let for_client = visible_change(change, false);

        assert_eq!(for_planner.request_id, Some(id));
        assert!(for_client.request_id.is_none());
        assert_eq!(for_client.kind, ChangeKind::Updated);
        assert_eq!(serde_json::to_value(&for_client).unwrap()["requestId"], serde_json::Value::Null);
    }
}
