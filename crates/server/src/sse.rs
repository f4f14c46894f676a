use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use noodleseed_mcp::{McpServer, Session, SessionFrame};
use std::convert::Infallible;
use std::sync::Arc;

use crate::api::ApiResult;
use crate::config::AppState;

/// Open an SSE session for the caller
///
/// The response streams until the client disconnects or the session closes.
pub async fn open_stream(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let engine = McpServer::new(state.catalog.clone(), state.server_info.clone());
    let (session, mut stream) = Session::open(
        &state.registry,
        engine,
        &state.config.transport.session_options(),
    )?;

    tracing::info!(session_id = %session.id(), "New SSE session");

    let events = async_stream::stream! {
        while let Some(frame) = stream.next_frame().await {
            yield Ok::<_, Infallible>(to_event(frame));
        }
        tracing::debug!(session_id = %stream.session_id(), "SSE stream ended");
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(state.config.transport.keep_alive())))
}

fn to_event(frame: SessionFrame) -> Event {
    Event::default().event(frame.event).data(frame.data)
}
