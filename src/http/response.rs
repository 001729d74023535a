//! Per-request response context and JSON envelope.
//!
//! # Responsibilities
//! - Accumulate status, headers, payload and errors while a handler runs
//! - Render the accumulated state as a single JSON envelope afterwards
//!
//! # Design Decisions
//! - Handlers never write the response themselves; they mutate a [`Reply`]
//! - A `Reply` only exists inside the rendering middleware's call tree;
//!   extracting one anywhere else is a loud 500, never an empty default
//! - Nothing is observable until the rendering middleware finalizes

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

/// Content type of every rendered response.
pub const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

/// Wire envelope: `{"data": ..., "errors": [...]}`, each key omitted when empty.
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    errors: &'a [String],
}

/// Mutable response state for one request.
#[derive(Debug, Default)]
pub struct ResponseContext {
    status: Option<StatusCode>,
    headers: HeaderMap,
    payload: Option<Result<Value, String>>,
    errors: Vec<String>,
}

impl ResponseContext {
    /// Set the final status code. Last write wins.
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = Some(status);
        self
    }

    /// Replace all values of a header.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a value to a header, keeping existing ones.
    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.append(name, value);
        self
    }

    /// Set the payload, replacing any previous one.
    ///
    /// The payload is converted to JSON now; a conversion failure is kept and
    /// turns the response into a bodiless 500 when it is finalized.
    pub fn set_payload<T: Serialize + ?Sized>(&mut self, payload: &T) -> &mut Self {
        self.payload = Some(serde_json::to_value(payload).map_err(|e| e.to_string()));
        self
    }

    /// Append an error message. Order is preserved and duplicates are kept.
    pub fn add_error(&mut self, error: impl Into<String>) -> &mut Self {
        self.errors.push(error.into());
        self
    }

    /// Set the status and, when non-empty, append `message` as an error.
    pub fn fail(&mut self, status: StatusCode, message: impl Into<String>) -> &mut Self {
        let message = message.into();
        self.set_status(status);
        if !message.is_empty() {
            self.add_error(message);
        }
        self
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

impl IntoResponse for ResponseContext {
    /// Render the accumulated state into the final response.
    fn into_response(self) -> Response {
        let Self {
            status,
            mut headers,
            payload,
            errors,
        } = self;

        headers.insert(header::CONTENT_TYPE, APPLICATION_JSON);
        let status = status.unwrap_or(StatusCode::OK);

        let data = match payload {
            Some(Ok(value)) => Some(value),
            Some(Err(error)) => {
                tracing::error!(error = %error, "Response payload could not be serialized");
                return bare(StatusCode::INTERNAL_SERVER_ERROR, headers);
            }
            None => None,
        };

        if status == StatusCode::NO_CONTENT || (data.is_none() && errors.is_empty()) {
            return bare(status, headers);
        }

        let envelope = Envelope {
            data: data.as_ref(),
            errors: &errors,
        };
        match serde_json::to_vec(&envelope) {
            Ok(body) => {
                let mut response = Response::new(Body::from(body));
                *response.status_mut() = status;
                *response.headers_mut() = headers;
                response
            }
            Err(error) => {
                tracing::error!(error = %error, "Response envelope could not be serialized");
                bare(StatusCode::INTERNAL_SERVER_ERROR, headers)
            }
        }
    }
}

fn bare(status: StatusCode, headers: HeaderMap) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Handle to the current request's [`ResponseContext`].
///
/// Only the rendering middleware creates one. Handlers receive it as an
/// extractor and chain mutations:
///
/// ```ignore
/// async fn hello(reply: Reply) {
///     reply.set_payload("hello world");
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Reply(Arc<Mutex<ResponseContext>>);

impl Reply {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(ResponseContext::default())))
    }

    /// Look up the reply attached to a request.
    pub fn from_parts(parts: &Parts) -> Result<Self, MissingReply> {
        parts.extensions.get::<Self>().cloned().ok_or(MissingReply)
    }

    fn lock(&self) -> MutexGuard<'_, ResponseContext> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the context while holding its lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut ResponseContext) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn set_status(&self, status: StatusCode) -> &Self {
        self.lock().set_status(status);
        self
    }

    pub fn set_header(&self, name: HeaderName, value: HeaderValue) -> &Self {
        self.lock().set_header(name, value);
        self
    }

    pub fn append_header(&self, name: HeaderName, value: HeaderValue) -> &Self {
        self.lock().append_header(name, value);
        self
    }

    pub fn set_payload<T: Serialize + ?Sized>(&self, payload: &T) -> &Self {
        self.lock().set_payload(payload);
        self
    }

    pub fn add_error(&self, error: impl Into<String>) -> &Self {
        self.lock().add_error(error);
        self
    }

    pub fn fail(&self, status: StatusCode, message: impl Into<String>) -> &Self {
        self.lock().fail(status, message);
        self
    }

    /// Take the accumulated context, leaving an empty one behind.
    pub(crate) fn take(&self) -> ResponseContext {
        std::mem::take(&mut *self.lock())
    }
}

impl<S> FromRequestParts<S> for Reply
where
    S: Send + Sync,
{
    type Rejection = MissingReply;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts)
    }
}

/// Rejection for a [`Reply`] requested outside the rendering middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("response context requested outside the JSON rendering middleware")]
pub struct MissingReply;

impl IntoResponse for MissingReply {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
