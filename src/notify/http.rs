use std::time::Duration;

use tracing::{debug, warn};

use super::Notifier;
use crate::error::RelayResult;
use crate::types::{ConnectionId, PublishRequest, PublishedEvent};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Publishes to a relay running in another process via `POST /api/events`.
///
/// Each call spawns a task on the current tokio runtime; outside a runtime
/// the event is dropped. Failures are logged and never surfaced.
#[derive(Clone, Debug)]
pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNotifier {
    /// `relay_url` is the base URL of the relay, e.g. `http://localhost:3001`
    pub fn new(relay_url: &str) -> RelayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/events", relay_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one request and wait for the relay to accept it
    pub async fn send(&self, request: &PublishRequest) -> RelayResult<()> {
        self.client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl Notifier for HttpNotifier {
    fn notify(&self, event: PublishedEvent, origin: Option<ConnectionId>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(event = event.name(), "no async runtime, relay notification dropped");
            return;
        };

        let notifier = self.clone();
        let request = PublishRequest::new(event, origin);
        runtime.spawn(async move {
            match notifier.send(&request).await {
                Ok(()) => debug!(event = %request.event, "relay notified"),
                Err(e) => warn!(
                    event = %request.event,
                    endpoint = %notifier.endpoint,
                    error = %e,
                    "relay notification failed"
                ),
            }
        });
    }
}
