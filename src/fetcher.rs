use bytes::Bytes;
use reqwest::{Client, StatusCode};

use crate::config::{Config, RetryPolicy};
use crate::error::CollectError;

/// Downloads the upstream instance list, retrying transient failures.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    url: String,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            url: config.instances_url.clone(),
            retry: config.retry,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<Bytes, CollectError> {
        let mut attempt = 0;

        loop {
            let err = match self.client.get(&self.url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(url = %self.url, attempt, "fetch: upstream responded");
                    match resp.bytes().await {
                        Ok(body) => return Ok(body),
                        Err(e) if is_retryable_error(&e) => CollectError::Fetch(e),
                        Err(e) => return Err(CollectError::Fetch(e)),
                    }
                }
                Ok(resp) if is_retryable_status(resp.status()) => {
                    CollectError::UpstreamStatus(resp.status())
                }
                Ok(resp) => return Err(CollectError::UpstreamStatus(resp.status())),
                Err(e) if is_retryable_error(&e) => CollectError::Fetch(e),
                Err(e) => return Err(CollectError::Fetch(e)),
            };

            if attempt >= self.retry.max_retries {
                tracing::warn!(url = %self.url, attempts = attempt + 1, error = %err, "fetch: giving up");
                return Err(err);
            }

            let wait = self.retry.backoff(attempt);
            tracing::warn!(
                url = %self.url,
                attempt,
                wait_ms = wait.as_millis() as u64,
                error = %err,
                "fetch: transient failure, retrying"
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

// A body cut short mid-download surfaces as a decode error.
fn is_retryable_error(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout() || e.is_request() || e.is_body() || e.is_decode()
}
