use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::gateway::Gateway;
use crate::config::GatewayConfig;
use crate::decode::HttpDecodeLevel;
use crate::error::RequestError;
use crate::wire::{BatchReadRequest, BatchReadResponse, CommandRequest, CommandResponse};

/// [`Gateway`] reached over HTTP with JSON bodies
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
    decode: HttpDecodeLevel,
}

impl HttpGateway {
    /// create a gateway client from a configuration
    pub fn new(config: GatewayConfig) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            config,
            decode: HttpDecodeLevel::Nothing,
        })
    }

    /// change how the HTTP exchange is logged
    pub fn with_decode_level(mut self, decode: HttpDecodeLevel) -> Self {
        self.decode = decode;
        self
    }

    /// configuration in use
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn post<B, R>(&self, url: String, body: &B, timeout: Duration) -> Result<R, RequestError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        if self.decode.enabled() {
            tracing::info!("HTTP TX - POST {}", url);
        }
        if self.decode.body_enabled() {
            if let Ok(text) = serde_json::to_string(body) {
                tracing::info!("{}", text);
            }
        }

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .inspect_err(|err| tracing::warn!("POST {} failed: {}", url, err))?;

        let status = response.status();
        if self.decode.status_enabled() {
            tracing::info!("HTTP RX - {} {}", status, url);
        }
        if !status.is_success() {
            tracing::warn!("gateway returned HTTP status {} for {}", status, url);
            return Err(RequestError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        if self.decode.body_enabled() {
            tracing::info!("{}", text);
        }

        serde_json::from_str(&text).map_err(|err| RequestError::BadResponse(err.to_string()))
    }
}

#[async_trait::async_trait]
impl Gateway for HttpGateway {
    async fn batch_read(
        &self,
        request: &BatchReadRequest,
    ) -> Result<BatchReadResponse, RequestError> {
        self.post(self.config.batch_read_url(), request, self.config.timeout())
            .await
    }

    async fn execute(&self, request: &CommandRequest) -> Result<CommandResponse, RequestError> {
        self.post(
            self.config.execute_url(),
            request,
            self.config.command_timeout(),
        )
        .await
    }
}
