use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};
use url::Url;

use super::{DeviceProvider, ProviderCredential, ProviderDevice, ProviderError, Result};
use crate::config::ProviderConfig;

const API_KEY_HEADER: &str = "X-API-Key";

/// reqwest-backed [`DeviceProvider`] for the Golioth management API.
#[derive(Clone)]
pub struct GoliothClient {
    client: Client,
    base_url: Url,
    api_key: String,
    project_id: String,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl std::fmt::Debug for GoliothClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoliothClient")
            .field("base_url", &self.base_url.as_str())
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDeviceBody<'a> {
    project_id: &'a str,
    name: &'a str,
    device_ids: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCredentialBody<'a> {
    pre_shared_key: &'a str,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceData {
    id: String,
    name: String,
    #[serde(default)]
    hardware_ids: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialData {
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    identity: String,
    created_at: String,
    pre_shared_key: String,
}

impl GoliothClient {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let api_key = config.api_key.clone().context("provider.api_key is not set")?;
        let project_id = config.project_id.clone().context("provider.project_id is not set")?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: ensure_slash(&config.base_url),
            api_key,
            project_id,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::MalformedResponse(format!("invalid provider url for {path}: {e}")))
    }

    fn devices_path(&self) -> String {
        format!("v1/projects/{}/devices", self.project_id)
    }

    /// Send a request, retrying transport failures and transient statuses with exponential
    /// backoff. Any other response is returned as-is for the caller to inspect.
    async fn send(&self, build: impl Fn() -> RequestBuilder) -> Result<Response> {
        let mut attempt = 0;
        loop {
            let outcome = build().header(API_KEY_HEADER, &self.api_key).send().await;

            let retryable = match &outcome {
                Ok(response) => is_transient(response.status()),
                Err(_) => true,
            };
            if !retryable || attempt >= self.max_retries {
                return outcome.map_err(ProviderError::from);
            }

            let delay = self.retry_base_delay.saturating_mul(2u32.saturating_pow(attempt));
            match &outcome {
                Ok(response) => warn!(status = %response.status(), attempt, ?delay, "Transient provider response, retrying"),
                Err(e) => warn!(error = %e, attempt, ?delay, "Provider request failed, retrying"),
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn is_transient(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Require exactly 200 and decode the `{"data": ...}` envelope.
async fn read_data<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if status != StatusCode::OK {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }

    // The body can carry a pre-shared key; only its size is logged
    debug!(status = %status, bytes = body.len(), "Provider responded");
    serde_json::from_str::<Envelope<T>>(&body)
        .map(|envelope| envelope.data)
        .map_err(|e| ProviderError::MalformedResponse(format!("error decoding response body: {e}")))
}

/// Makes sure a url has a trailing slash, so that `join` appends rather than replaces the last
/// path segment.
fn ensure_slash(url: &Url) -> Url {
    if url.path().ends_with('/') {
        url.clone()
    } else {
        let mut new_url = url.clone();
        let path = format!("{}/", new_url.path());
        new_url.set_path(&path);
        new_url
    }
}

#[async_trait]
impl DeviceProvider for GoliothClient {
    #[instrument(skip(self), fields(project = %self.project_id), err)]
    async fn create_device(&self, name: &str, id_hint: &str) -> Result<ProviderDevice> {
        let url = self.url(&self.devices_path())?;
        let body = CreateDeviceBody {
            project_id: &self.project_id,
            name,
            device_ids: id_hint,
        };

        let response = self.send(|| self.client.post(url.clone()).json(&body)).await?;
        let data: DeviceData = read_data(response).await?;

        debug!(device_id = %data.id, "Provider created device");
        Ok(ProviderDevice {
            id: data.id,
            name: data.name,
            hardware_ids: data.hardware_ids.unwrap_or_default(),
        })
    }

    #[instrument(skip(self, preshared_key), fields(project = %self.project_id), err)]
    async fn create_credential(&self, device_id: &str, preshared_key: &str) -> Result<ProviderCredential> {
        let url = self.url(&format!("{}/{device_id}/credentials", self.devices_path()))?;
        let body = CreateCredentialBody {
            pre_shared_key: preshared_key,
        };

        let response = self.send(|| self.client.post(url.clone()).json(&body)).await?;
        let data: CredentialData = read_data(response).await?;

        let created_at = DateTime::parse_from_rfc3339(&data.created_at)
            .map_err(|e| ProviderError::MalformedResponse(format!("credential createdAt {:?} is not RFC 3339: {e}", data.created_at)))?
            .with_timezone(&Utc);

        Ok(ProviderCredential {
            id: data.id,
            kind: data.kind,
            identity: data.identity,
            created_at,
            preshared_key: data.pre_shared_key,
        })
    }

    #[instrument(skip(self), fields(project = %self.project_id), err)]
    async fn delete_device(&self, device_id: &str) -> Result<()> {
        let url = self.url(&format!("{}/{device_id}", self.devices_path()))?;
        let response = self.send(|| self.client.delete(url.clone())).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
