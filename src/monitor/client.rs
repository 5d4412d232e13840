use std::time::Duration;

use reqwest::Client;

use super::publisher::PresenceSink;
use crate::presence::PresenceUpdate;
use crate::routes::presence::{UpdatePresenceRequest, UpdatePresenceResponse};

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server rejected update with {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("server did not accept the update")]
    NotAccepted,
}

/// 通过 HTTP 上报到 `POST {server_url}/presence/update`
#[derive(Debug, Clone)]
pub struct HttpPresenceSink {
    client: Client,
    endpoint: String,
    secret: String,
}

impl HttpPresenceSink {
    pub fn new(server_url: &str, secret: &str, timeout: Duration) -> Result<Self, PublishError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/presence/update", server_url.trim_end_matches('/')),
            secret: secret.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PresenceSink for HttpPresenceSink {
    async fn publish(&self, update: &PresenceUpdate) -> Result<(), PublishError> {
        let request = UpdatePresenceRequest::new(&self.secret, update.clone());
        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: UpdatePresenceResponse = response.json().await?;
        if body.accepted {
            Ok(())
        } else {
            Err(PublishError::NotAccepted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let sink =
            HttpPresenceSink::new("http://127.0.0.1:5000/api/", "s", Duration::from_secs(5)).unwrap();
        assert_eq!(sink.endpoint(), "http://127.0.0.1:5000/api/presence/update");
    }
}
