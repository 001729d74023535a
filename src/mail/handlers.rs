//! `POST /mail`: contact form submission.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

use crate::http::{Reply, ERR_PARSING_REQUEST_BODY};
use crate::mail::{Mail, Sender};

pub const ERR_SENDING_MAIL: &str = "Error sending e-mail";

/// Shared state of the mail route.
pub struct MailState<S> {
    sender: Arc<S>,
    recipient: String,
}

impl<S> MailState<S> {
    pub fn new(sender: S, recipient: impl Into<String>) -> Self {
        Self {
            sender: Arc::new(sender),
            recipient: recipient.into(),
        }
    }
}

impl<S> Clone for MailState<S> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
            recipient: self.recipient.clone(),
        }
    }
}

pub fn routes<S: Sender>(state: MailState<S>) -> Router {
    Router::new()
        .route("/mail", post(send::<S>))
        .with_state(state)
}

#[derive(Debug, Error, PartialEq, Eq)]
enum InvalidMail {
    #[error("name, e-mail, subject or message: invalid value")]
    Missing,

    #[error("from address: invalid value")]
    FromAddress,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
struct MailRequest {
    first_name: String,
    last_name: String,
    company: String,
    #[validate(email)]
    from: String,
    subject: String,
    text: String,
}

impl MailRequest {
    fn check(&self) -> Result<(), InvalidMail> {
        if (self.first_name.is_empty() && self.last_name.is_empty())
            || self.from.is_empty()
            || self.subject.is_empty()
            || self.text.is_empty()
        {
            return Err(InvalidMail::Missing);
        }

        Validate::validate(self).map_err(|_| InvalidMail::FromAddress)
    }

    /// `First Last Company <address>`, skipping empty name parts.
    fn sender_line(&self) -> String {
        let name: Vec<&str> = [&self.first_name, &self.last_name, &self.company]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect();
        format!("{} <{}>", name.join(" "), self.from)
    }

    fn into_mail(self, to: &str) -> Mail {
        Mail {
            from: self.sender_line(),
            to: to.to_string(),
            subject: self.subject,
            text: self.text,
        }
    }
}

fn first_to_upper(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

async fn send<S: Sender>(State(state): State<MailState<S>>, reply: Reply, body: Bytes) {
    let request: MailRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Mail body could not be decoded");
            reply.fail(StatusCode::BAD_REQUEST, ERR_PARSING_REQUEST_BODY);
            return;
        }
    };

    if let Err(e) = request.check() {
        tracing::warn!(error = %e, "Mail request rejected");
        reply.fail(StatusCode::BAD_REQUEST, first_to_upper(&e.to_string()));
        return;
    }

    let mail = request.into_mail(&state.recipient);
    match state.sender.send(&mail).await {
        Ok(receipt) => {
            tracing::info!(id = %receipt.id, message = %receipt.message, "Mail queued");
            reply.set_status(StatusCode::ACCEPTED);
        }
        Err(e) => {
            tracing::error!(error = %e, "Mail delivery failed");
            reply.fail(StatusCode::INTERNAL_SERVER_ERROR, ERR_SENDING_MAIL);
        }
    }
}
