//! Drain coordination for work that opts into graceful shutdown.
//!
//! A handler doing slow work takes a [`Lever`] for the duration of that work
//! and watches [`Lever::stopped`] to wrap up early. On shutdown,
//! [`Drain::shutdown`] closes admission, signals every lever and waits
//! (bounded) for all of them to be released.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tokio::sync::{watch, Notify};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrainError {
    /// Shutdown already started; no new drainable work is admitted.
    #[error("drain is closed")]
    Closed,

    /// Levers were still held when the wait expired.
    #[error("{remaining} drainable task(s) still running after {timeout:?}")]
    Timeout { remaining: usize, timeout: Duration },
}

/// Coordinator for drainable in-flight work. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Drain {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    active: AtomicUsize,
    idle: Notify,
    stop: watch::Sender<bool>,
}

impl Drain {
    pub fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                active: AtomicUsize::new(0),
                idle: Notify::new(),
                stop,
            }),
        }
    }

    /// Admit one unit of drainable work.
    pub fn lever(&self) -> Result<Lever, DrainError> {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        let lever = Lever {
            inner: Arc::clone(&self.inner),
        };
        if self.is_closed() {
            // Dropping releases the slot taken above.
            drop(lever);
            return Err(DrainError::Closed);
        }
        Ok(lever)
    }

    /// Number of levers currently held.
    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        *self.inner.stop.borrow()
    }

    /// Close admission, signal every lever and wait up to `timeout` for all to be released.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), DrainError> {
        self.inner.stop.send_replace(true);

        let idle = async {
            loop {
                let notified = self.inner.idle.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.active() == 0 {
                    return;
                }
                notified.await;
            }
        };

        tokio::time::timeout(timeout, idle)
            .await
            .map_err(|_| DrainError::Timeout {
                remaining: self.active(),
                timeout,
            })
    }
}

impl Default for Drain {
    fn default() -> Self {
        Self::new()
    }
}

/// One unit of drainable work. Released on drop.
#[derive(Debug)]
pub struct Lever {
    inner: Arc<Inner>,
}

impl Lever {
    /// Resolves once shutdown asks drainable work to finish.
    pub async fn stopped(&self) {
        let mut rx = self.inner.stop.subscribe();
        // The sender lives as long as `self.inner`, so this only returns on stop.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Drop for Lever {
    fn drop(&mut self) {
        if self.inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

/// Extracts a lever from the [`Drain`] installed on the router.
impl<S> FromRequestParts<S> for Lever
where
    S: Send + Sync,
{
    type Rejection = LeverRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let drain = parts
            .extensions
            .get::<Drain>()
            .ok_or(LeverRejection::Missing)?;
        drain.lever().map_err(|_| LeverRejection::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeverRejection {
    /// No drain installed on the router.
    Missing,
    /// Shutdown in progress.
    Closed,
}

impl IntoResponse for LeverRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Missing => {
                tracing::error!("lever requested but no drain is installed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::Closed => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        }
    }
}
