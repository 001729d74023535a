//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use rest_service::config::ServiceConfig;
use rest_service::mail::{Mail, MailError, SendReceipt, Sender};
use tower::ServiceExt;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

static SERVICE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Config with a service name unique within this test binary.
///
/// Metrics registration rejects duplicate names per process.
pub fn test_config(prefix: &str) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.service_name = format!("{prefix}-{}", SERVICE_COUNTER.fetch_add(1, Ordering::SeqCst));
    config.jwt.secret = "integration-secret".to_string();
    config
}

/// One captured tracing event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: HashMap<String, String>,
}

/// Layer recording every event it sees.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CapturedLogs {
    /// Install as the default subscriber for the current thread.
    ///
    /// Use with a current-thread runtime so spawned tasks share the thread.
    pub fn install() -> (Self, DefaultGuard) {
        let logs = Self::default();
        let subscriber = tracing_subscriber::registry().with(logs.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.message == message)
            .collect()
    }

    pub fn contains(&self, message: &str) -> bool {
        !self.with_message(message).is_empty()
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: HashMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.insert(field.name().to_string(), format!("{value:?}"));
        }
    }
}

/// Mail sender that records messages instead of delivering them.
#[derive(Clone, Default)]
pub struct RecordingSender {
    pub sent: Arc<Mutex<Vec<Mail>>>,
    pub fail: bool,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl Sender for RecordingSender {
    async fn send(&self, mail: &Mail) -> Result<SendReceipt, MailError> {
        if self.fail {
            return Err(MailError::Rejected {
                status: 401,
                message: "Forbidden".to_string(),
            });
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(SendReceipt {
            id: "<test@example.com>".to_string(),
            message: "Queued. Thank you.".to_string(),
        })
    }
}

/// Dispatch one request through `router` in-process.
pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Status and body text of a response.
pub async fn read(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

/// Status and parsed JSON body; `Value::Null` for an empty body.
pub async fn read_json(response: Response) -> (StatusCode, serde_json::Value) {
    let (status, body) = read(response).await;
    if body.is_empty() {
        return (status, serde_json::Value::Null);
    }
    (status, serde_json::from_str(&body).unwrap())
}
