use std::thread::{self, JoinHandle};
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

use crate::shared::constants::IFTTT_URL_TEMPLATE;
use crate::triggers::domain::event_notifier::EventNotifier;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("webhook request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// POSTs `value1=<score>` as a form body to a webhook URL.
///
/// Each notification is sent from its own detached thread so the caller
/// never waits on the network. Failures are logged and dropped.
pub struct WebhookNotifier {
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// IFTTT maker endpoint for `event` under `key`.
    pub fn ifttt(event: &str, key: &str) -> Self {
        Self::new(
            IFTTT_URL_TEMPLATE
                .replace("{event}", event)
                .replace("{key}", key),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends from a new `webhook` thread and logs the outcome. The handle
    /// yields the same outcome; dropping it detaches the thread.
    pub fn dispatch(&self, value: f32) -> Option<JoinHandle<Result<u16, WebhookError>>> {
        let url = self.url.clone();
        let spawned = thread::Builder::new()
            .name("webhook".into())
            .spawn(move || {
                let outcome = Self::send(&url, value);
                match &outcome {
                    Ok(status) => log::info!("Sent event (value {value:.2}), status {status}"),
                    Err(e) => log::error!("Sending event failed: {e}"),
                }
                outcome
            });
        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to spawn webhook thread: {e}");
                None
            }
        }
    }

    /// Sends one notification on the calling thread, returning the HTTP status.
    pub fn send(url: &str, value: f32) -> Result<u16, WebhookError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(WebhookError::Client)?;
        let response = client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(format!("value1={value}"))
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| WebhookError::Request {
                url: url.to_string(),
                source: e,
            })?;
        Ok(response.status().as_u16())
    }
}

impl EventNotifier for WebhookNotifier {
    fn notify(&self, value: f32) {
        // Detached: the handle is dropped.
        let _ = self.dispatch(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_trigger(status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/trigger"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string(body))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_ifttt_url() {
        let notifier = WebhookNotifier::ifttt("smile", "abc123");
        assert_eq!(
            notifier.url(),
            "https://maker.ifttt.com/trigger/smile/with/key/abc123"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_send_posts_form_value() {
        let server = mock_trigger(200, "value1=91.5").await;
        let url = format!("{}/trigger", server.uri());

        let status = tokio::task::spawn_blocking(move || WebhookNotifier::send(&url, 91.5))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(status, 200);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_error_status_is_an_error() {
        let server = mock_trigger(500, "value1=1").await;
        let url = format!("{}/trigger", server.uri());

        let result = tokio::task::spawn_blocking(move || WebhookNotifier::send(&url, 1.0))
            .await
            .unwrap();

        assert!(matches!(result, Err(WebhookError::Request { .. })));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dispatch_sends_from_its_own_thread() {
        let server = mock_trigger(200, "value1=75").await;
        let notifier = WebhookNotifier::new(format!("{}/trigger", server.uri()));

        let outcome = tokio::task::spawn_blocking(move || {
            let handle = notifier.dispatch(75.0).unwrap();
            assert_eq!(handle.thread().name(), Some("webhook"));
            handle.join().unwrap()
        })
        .await
        .unwrap();

        assert_eq!(outcome.unwrap(), 200);
    }

    #[test]
    fn test_unreachable_host_is_reported_not_raised() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:1/unreachable");

        let outcome = notifier.dispatch(90.0).unwrap().join();

        assert!(matches!(outcome, Ok(Err(WebhookError::Request { .. }))));
    }
}
