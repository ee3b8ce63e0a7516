use std::panic::AssertUnwindSafe;

use common::error::AppError;
use futures::FutureExt;
use retrieval_pipeline::retrieve_context;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, instrument};

use crate::{
    error::HandlerError,
    event::ChatEvent,
    handler_state::HandlerState,
    response::{HandlerResponse, STATUS_OK},
};

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub context_used: bool,
}

/// Entry point for one invocation. Never fails: every outcome is a response.
#[instrument(skip_all)]
pub async fn handle(state: &HandlerState, event: ChatEvent) -> HandlerResponse {
    if event.is_preflight() {
        return handle_options();
    }

    match AssertUnwindSafe(answer(state, &event)).catch_unwind().await {
        Ok(Ok(reply)) => HandlerResponse::json(STATUS_OK, &json!(reply)),
        Ok(Err(err)) => err.into_response(),
        Err(_) => {
            error!("Chat handler panicked");
            HandlerError::InternalError("panic".to_string()).into_response()
        }
    }
}

/// CORS preflight answer, independent of any knowledge-base state.
pub fn handle_options() -> HandlerResponse {
    HandlerResponse::preflight()
}

async fn answer(state: &HandlerState, event: &ChatEvent) -> Result<ChatReply, HandlerError> {
    let message = event.message()?;
    if message.is_empty() {
        return Err(AppError::Validation("Message is required".to_string()).into());
    }

    let message_chars = message.chars().count();
    if state.max_message_chars > 0 && message_chars > state.max_message_chars {
        return Err(AppError::Validation(format!(
            "Message too long. Maximum length is {} characters.",
            state.max_message_chars
        ))
        .into());
    }

    info!(message_chars, "Received chat request");

    state
        .corpus
        .ensure_initialized(&state.knowledge, state.embedder.as_ref())
        .await;

    let context = retrieve_context(
        &state.corpus,
        state.embedder.as_ref(),
        &message,
        &state.retrieval,
    )
    .await;

    let reply = state.generator.generate(&message, &context).await;

    Ok(ChatReply {
        reply,
        context_used: !context.is_empty(),
    })
}
