//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `prod` drops everything below warning level
//! - `RUST_LOG` overrides the profile's default filter

use tracing::Subscriber;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::Environment;

/// Default filter directive for a logging profile.
pub fn default_directive(environment: Environment) -> &'static str {
    match environment {
        Environment::Dev => "debug",
        Environment::Prod => "warn",
    }
}

/// Formatting layer for a logging profile, writing to `writer`.
fn fmt_layer<S, W>(environment: Environment, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match environment {
        Environment::Dev => tracing_subscriber::fmt::layer().with_writer(writer).boxed(),
        Environment::Prod => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .with_writer(writer)
            .boxed(),
    }
}

/// Install the global tracing subscriber for the given profile.
pub fn init(environment: Environment) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(environment)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(environment, std::io::stdout))
        .try_init()
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use serde_json::Value;

    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    /// Run `emit` under the profile's default filter and formatter.
    fn capture(environment: Environment, emit: impl FnOnce()) -> Vec<String> {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new(default_directive(environment)))
            .with(fmt_layer(environment, move || writer.clone()));

        tracing::subscriber::with_default(subscriber, emit);
        buffer.lines()
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directive(Environment::Prod), "warn");
        assert_eq!(default_directive(Environment::Dev), "debug");
    }

    #[test]
    fn test_prod_writes_json_at_warn_and_above() {
        let lines = capture(Environment::Prod, || {
            tracing::debug!("dropped debug");
            tracing::info!("dropped info");
            tracing::warn!(answer = 42, "kept");
            tracing::error!("also kept");
        });

        assert_eq!(lines.len(), 2, "{lines:?}");
        let warn: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(warn["level"], "WARN");
        assert_eq!(warn["fields"]["message"], "kept");
        assert_eq!(warn["fields"]["answer"], 42);

        let error: Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(error["level"], "ERROR");
    }

    #[test]
    fn test_dev_writes_text_at_debug_and_above() {
        let lines = capture(Environment::Dev, || {
            tracing::trace!("dropped trace");
            tracing::debug!("kept debug");
        });

        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(lines[0].contains("DEBUG"));
        assert!(lines[0].contains("kept debug"));
        assert!(serde_json::from_str::<Value>(&lines[0]).is_err());
    }
}
