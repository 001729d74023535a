//! Contact-form mail delivery.
//!
//! # Components
//! - [`Sender`]: delivery backend abstraction
//! - `mailgun.rs`: Mailgun HTTP API backend
//! - `handlers.rs`: `POST /mail` validation and dispatch

pub mod handlers;
pub mod mailgun;

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;

pub use handlers::{routes, MailState};
pub use mailgun::Mailgun;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("mail provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// A message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Provider acknowledgement of a queued message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SendReceipt {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
}

/// Mail delivery backend.
pub trait Sender: Send + Sync + 'static {
    fn send(&self, mail: &Mail) -> impl Future<Output = Result<SendReceipt, MailError>> + Send;
}
