//! HTTP client for the staff directory exposed by the API service

use common::config::AccessConfig;
use common::error::{BackendError, BackendResult};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

use super::{Envelope, PermissionsDocument, StaffDirectory};
use crate::models::{RoleAssignment, StaffId, StaffMember};

/// Staff directory reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpDirectory {
    /// Create a client for the backend at `base_url`
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Configuration(format!("Invalid HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            timeout,
        })
    }

    /// Create a client from the shared configuration
    pub fn from_config(config: &AccessConfig) -> BackendResult<Self> {
        Self::new(
            config.permissions_api_url.clone(),
            config.api_token.clone(),
            config.fetch_timeout(),
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Transport(e.to_string())
        }
    }

    /// Send a request and fail on any non-success status
    async fn execute(&self, builder: RequestBuilder, what: &str) -> BackendResult<Response> {
        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        error!("Backend answered {} for {}: {}", status, what, message);

        if status == StatusCode::NOT_FOUND {
            Err(BackendError::NotFound(what.to_string()))
        } else {
            Err(BackendError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn fetch_data<T: DeserializeOwned>(&self, path: &str) -> BackendResult<T> {
        let response = self.execute(self.request(Method::GET, path), path).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }
}

impl StaffDirectory for HttpDirectory {
    async fn fetch_staff(&self) -> BackendResult<Vec<StaffMember>> {
        self.fetch_data("/admin/staff").await
    }

    async fn fetch_role_assignments(&self, staff_id: &StaffId) -> BackendResult<Vec<RoleAssignment>> {
        let document: PermissionsDocument = self
            .fetch_data(&format!("/admin/permissions/{}", staff_id))
            .await?;
        Ok(document.role_assignments)
    }

    async fn save_staff(&self, member: &StaffMember) -> BackendResult<()> {
        let path = format!("/admin/staff/{}", member.id);
        let builder = self.request(Method::PUT, &path).json(member);
        self.execute(builder, &path).await?;
        Ok(())
    }

    async fn delete_staff(&self, staff_id: &StaffId) -> BackendResult<()> {
        let path = format!("/admin/staff/{}", staff_id);
        self.execute(self.request(Method::DELETE, &path), &path)
            .await?;
        Ok(())
    }

    async fn save_role_assignments(
        &self,
        staff_id: &StaffId,
        assignments: &[RoleAssignment],
    ) -> BackendResult<()> {
        let path = format!("/admin/permissions/{}", staff_id);
        let document = PermissionsDocument {
            role_assignments: assignments.to_vec(),
        };
        let builder = self.request(Method::PUT, &path).json(&document);
        self.execute(builder, &path).await?;
        Ok(())
    }
}
