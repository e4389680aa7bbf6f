//! `POST /webhook`.
//!
//! The signature is checked on the raw body before anything else reads it.
//! Events the bot acts on are handed to the dispatcher on a background task
//! and the delivery is acknowledged with 202 straight away; GitHub gives up
//! on deliveries that take more than ten seconds.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{Instrument, debug, error, info, warn};

use super::AppState;
use crate::effects::{GitHubInterpreter, InterpreterFactory};
use crate::types::DeliveryId;
use crate::webhooks::{ParseError, SignatureError, parse_webhook, verify_signature};

const HEADER_EVENT: &str = "x-github-event";
const HEADER_DELIVERY: &str = "x-github-delivery";
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error(transparent)]
    InvalidPayload(#[from] ParseError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match self {
            WebhookError::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
            WebhookError::MissingHeader(_) | WebhookError::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
        };
        (status, self.to_string()).into_response()
    }
}

pub async fn webhook_handler<F>(
    State(app_state): State<AppState<F>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError>
where
    F: InterpreterFactory,
    <F::Interpreter as GitHubInterpreter>::Error: std::error::Error + Send + Sync + 'static,
{
    let event_type = header(&headers, HEADER_EVENT)?;
    let delivery_id = DeliveryId::new(header(&headers, HEADER_DELIVERY)?);
    let signature = header(&headers, HEADER_SIGNATURE)?;

    if let Err(e) = verify_signature(&body, signature, app_state.webhook_secret()) {
        warn!(delivery_id = %delivery_id, error = %e, "Rejected webhook delivery");
        return Err(e.into());
    }

    let Some(event) = parse_webhook(event_type, &body)? else {
        debug!(
            delivery_id = %delivery_id,
            event_type = %event_type,
            "Ignoring webhook delivery"
        );
        return Ok((StatusCode::ACCEPTED, "Ignored"));
    };

    info!(
        delivery_id = %delivery_id,
        repo = %event.repo(),
        event = event.kind(),
        "Dispatching webhook event"
    );

    let dispatcher = app_state.dispatcher();
    let span = tracing::info_span!("delivery", delivery_id = %delivery_id);
    app_state.tasks().spawn(
        async move {
            if let Err(e) = dispatcher.dispatch(event).await {
                error!(error = %e, "Webhook event handling failed");
            }
        }
        .instrument(span),
    );

    Ok((StatusCode::ACCEPTED, "Accepted"))
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingHeader(name))
}
