//! Application assembly: route table plus everything the server needs.

use axum::{routing::get, Router};

use crate::auth::{self, AuthState};
use crate::config::ServiceConfig;
use crate::http::{assemble, Reply, RouterOptions, Server};
use crate::lifecycle::Drain;
use crate::mail::{self, MailState, Sender};
use crate::observability::{Metrics, MetricsError};
use crate::store::UserStore;

/// An assembled application, ready to be served.
#[derive(Debug)]
pub struct App {
    pub router: Router,
    pub metrics: Metrics,
    pub drain: Drain,
}

impl App {
    /// Hand the application to a [`Server`] configured from `config`.
    pub fn into_server(self, config: &ServiceConfig) -> Server {
        Server::new(
            config.service_name.clone(),
            config.server.clone(),
            self.router,
            self.metrics,
            self.drain,
        )
    }
}

/// Register metrics and assemble the full router.
///
/// The mail route is mounted only when `mailer` is given.
pub fn build<U, M>(config: &ServiceConfig, users: U, mailer: Option<M>) -> Result<App, MetricsError>
where
    U: UserStore,
    M: Sender,
{
    let metrics = Metrics::register(&config.service_name, &config.metrics.buckets)?;
    let drain = Drain::new();

    let mut routes = Router::new()
        .route("/", get(index))
        .merge(auth::routes(AuthState::new(users, &config.jwt)));

    if let Some(sender) = mailer {
        routes = routes.merge(mail::routes(MailState::new(sender, config.mailgun.recipient.clone())));
    }

    let router = assemble(
        routes,
        RouterOptions {
            recorder: metrics.clone(),
            cors: config.cors.clone(),
            drain: drain.clone(),
        },
    );

    Ok(App {
        router,
        metrics,
        drain,
    })
}

async fn index(reply: Reply) {
    reply.set_payload("hello world");
}
