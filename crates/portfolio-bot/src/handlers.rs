//! Update Handlers

use portfolio_core::{Reply, SessionId, interpreter::CHART_FAILURE_REPLY};

use crate::state::AppState;
use crate::telegram::Update;
use crate::transport::Transport;

/// Handle one inbound update: run the command and deliver the reply.
///
/// Updates without a text message, and messages sent by bots, are ignored. A photo that cannot be
/// delivered is replaced with the chart failure notice.
pub async fn handle_update(state: AppState, update: Update) {
    let Some(message) = update.message else {
        return;
    };
    let chat_id = message.chat.id;
    if message.from.as_ref().is_some_and(|user| user.is_bot) {
        tracing::debug!(update_id = update.update_id, chat_id, "ignoring message from a bot");
        return;
    }
    let Some(text) = message.text else {
        tracing::debug!(update_id = update.update_id, chat_id, "ignoring non-text message");
        return;
    };
    tracing::debug!(
        chat_id,
        message_id = message.message_id,
        user_id = message.from.as_ref().map(|user| user.id),
        "received message"
    );

    let reply = state.interpreter.handle(chat_id, &text).await;
    deliver(state.transport.as_ref(), chat_id, &reply).await;
}

/// Send `reply`, logging failures instead of returning them
pub async fn deliver(transport: &dyn Transport, chat_id: SessionId, reply: &Reply) {
    match transport.send(chat_id, reply).await {
        Ok(()) => {}
        Err(e) if matches!(reply, Reply::Photo { .. }) => {
            tracing::error!(chat_id, "failed to send chart: {}", e);
            let notice = Reply::text(CHART_FAILURE_REPLY);
            if let Err(e) = transport.send(chat_id, &notice).await {
                tracing::error!(chat_id, "failed to send failure notice: {}", e);
            }
        }
        Err(e) => tracing::error!(chat_id, "failed to send reply: {}", e),
    }
}
