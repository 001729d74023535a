//! Mailgun HTTP API backend.

use std::time::Duration;

use crate::config::MailgunConfig;
use crate::mail::{Mail, MailError, SendReceipt, Sender};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Mailgun {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl Mailgun {
    pub fn new(config: &MailgunConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}/messages",
                config.base_url.trim_end_matches('/'),
                config.domain
            ),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Sender for Mailgun {
    async fn send(&self, mail: &Mail) -> Result<SendReceipt, MailError> {
        let form = [
            ("from", mail.from.as_str()),
            ("to", mail.to.as_str()),
            ("subject", mail.subject.as_str()),
            ("text", mail.text.as_str()),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<SendReceipt>().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{header, HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::post,
        Form, Json, Router,
    };

    use super::*;

    /// `Basic` credentials for user `api` and key `key-123`.
    const EXPECTED_AUTH: &str = "Basic YXBpOmtleS0xMjM=";

    type Received = Arc<Mutex<Vec<(Option<String>, HashMap<String, String>)>>>;

    fn config(base_url: &str, api_key: &str) -> MailgunConfig {
        MailgunConfig {
            domain: "mg.example.com".into(),
            api_key: api_key.into(),
            recipient: "owner@example.com".into(),
            base_url: base_url.into(),
        }
    }

    fn mail() -> Mail {
        Mail {
            from: "John Smith Acme <john@example.com>".into(),
            to: "owner@example.com".into(),
            subject: "Question".into(),
            text: "How much?".into(),
        }
    }

    async fn messages(
        State(received): State<Received>,
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> Response {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let authorized = auth.as_deref() == Some(EXPECTED_AUTH);
        received.lock().unwrap().push((auth, form));

        if !authorized {
            return (StatusCode::UNAUTHORIZED, "Forbidden").into_response();
        }
        Json(serde_json::json!({"id": "<1@mg.example.com>", "message": "Queued. Thank you."})).into_response()
    }

    /// Mailgun-shaped API on an ephemeral port. Returns its `/v3` base URL.
    async fn mock_api() -> (String, Received) {
        let received = Received::default();
        let app = Router::new()
            .route("/v3/mg.example.com/messages", post(messages))
            .with_state(received.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/v3"), received)
    }

    #[tokio::test]
    async fn test_send_posts_form_with_basic_auth() {
        let (base_url, received) = mock_api().await;
        let mailgun = Mailgun::new(&config(&base_url, "key-123")).unwrap();

        let receipt = mailgun.send(&mail()).await.unwrap();
        assert_eq!(receipt.id, "<1@mg.example.com>");
        assert_eq!(receipt.message, "Queued. Thank you.");

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        let (auth, form) = &received[0];
        assert_eq!(auth.as_deref(), Some(EXPECTED_AUTH));
        assert_eq!(form["from"], "John Smith Acme <john@example.com>");
        assert_eq!(form["to"], "owner@example.com");
        assert_eq!(form["subject"], "Question");
        assert_eq!(form["text"], "How much?");
        assert_eq!(form.len(), 4);
    }

    #[tokio::test]
    async fn test_send_rejected_by_provider() {
        let (base_url, received) = mock_api().await;
        let mailgun = Mailgun::new(&config(&base_url, "wrong-key")).unwrap();

        let err = mailgun.send(&mail()).await.unwrap_err();
        match err {
            MailError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Forbidden");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_endpoint_from_config() {
        let config = config("https://api.eu.mailgun.net/v3/", "key");
        let mailgun = Mailgun::new(&config).unwrap();
        assert_eq!(mailgun.endpoint(), "https://api.eu.mailgun.net/v3/mg.example.com/messages");
    }
}
