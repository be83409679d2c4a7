// File: registry-client/src/client.rs
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ClientError;
use crate::types::{
    ApiEnvelope, HealthStatus, HealthUpdateBody, Service, ServiceHealthCheck, ServiceHealthUpdate,
    ServiceRegistration, ServiceStatistics,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations a service owner performs against the directory.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn register_service(
        &self,
        registration: &ServiceRegistration,
    ) -> Result<Service, ClientError>;

    async fn deregister_service(&self, service_id: Uuid) -> Result<(), ClientError>;

    /// Returns the number of live instances updated
    async fn update_service_health(
        &self,
        service_id: Uuid,
        status: HealthStatus,
    ) -> Result<u64, ClientError>;

    /// Probe every live instance now and return the aggregate status
    async fn perform_health_check(&self, service_id: Uuid) -> Result<HealthStatus, ClientError>;

    async fn retrieve_statistics(
        &self,
        service_id: Uuid,
    ) -> Result<ServiceStatistics, ClientError>;
}

pub struct RegistryClient {
    client: Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        self.client.request(method, url)
    }

    /// Send and unwrap the response envelope
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let envelope: ApiEnvelope<T> =
            serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
        if !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope.message.unwrap_or_else(|| "request failed".to_string()),
                retryable: envelope.retryable.unwrap_or(false),
            });
        }
        envelope
            .data
            .ok_or_else(|| ClientError::Decode("response carried no data".to_string()))
    }

    /// Send a request whose success response has no body
    async fn execute_empty(&self, request: RequestBuilder) -> Result<(), ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await?;
        Err(api_error(status, &body))
    }
}

fn api_error(status: StatusCode, body: &[u8]) -> ClientError {
    let (message, retryable) =
        match serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(body) {
            Ok(envelope) => (
                envelope.message.unwrap_or_else(|| status.to_string()),
                envelope.retryable.unwrap_or(false),
            ),
            Err(_) => (String::from_utf8_lossy(body).into_owned(), false),
        };
    warn!("Directory request failed with {}: {}", status, message);
    ClientError::Api {
        status: status.as_u16(),
        message,
        retryable,
    }
}

#[async_trait]
impl ServiceRegistry for RegistryClient {
    async fn register_service(
        &self,
        registration: &ServiceRegistration,
    ) -> Result<Service, ClientError> {
        self.execute(self.request(Method::POST, "/api/services").json(registration))
            .await
    }

    async fn deregister_service(&self, service_id: Uuid) -> Result<(), ClientError> {
        self.execute_empty(
            self.request(Method::DELETE, &format!("/api/services/{}", service_id)),
        )
        .await
    }

    async fn update_service_health(
        &self,
        service_id: Uuid,
        status: HealthStatus,
    ) -> Result<u64, ClientError> {
        let update: ServiceHealthUpdate = self
            .execute(
                self.request(Method::PUT, &format!("/api/services/{}/health", service_id))
                    .json(&HealthUpdateBody { status }),
            )
            .await?;
        Ok(update.instances_updated)
    }

    async fn perform_health_check(&self, service_id: Uuid) -> Result<HealthStatus, ClientError> {
        let check: ServiceHealthCheck = self
            .execute(self.request(
                Method::POST,
                &format!("/api/services/{}/health-check", service_id),
            ))
            .await?;
        Ok(check.status)
    }

    async fn retrieve_statistics(
        &self,
        service_id: Uuid,
    ) -> Result<ServiceStatistics, ClientError> {
        self.execute(self.request(
            Method::GET,
            &format!("/api/services/{}/statistics", service_id),
        ))
        .await
    }
}
