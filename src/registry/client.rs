//! HTTP client for the service-registry agent API.

use std::collections::HashMap;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Error type for registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{operation} returned unexpected status {status}")]
    UnexpectedStatus {
        operation: &'static str,
        status: StatusCode,
    },
}

/// Health check attached to a service registration.
///
/// All fields are optional; the agent interprets whichever probe kind
/// is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceCheck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(rename = "DockerContainerID", skip_serializing_if = "Option::is_none")]
    pub docker_container_id: Option<String>,
    /// Only supported for Docker checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    #[serde(rename = "HTTP", skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<HashMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(rename = "TCP", skip_serializing_if = "Option::is_none")]
    pub tcp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "TLSSkipVerify", skip_serializing_if = "std::ops::Not::not", default)]
    pub tls_skip_verify: bool,
    /// If the check stays critical longer than this duration, the
    /// agent deregisters the service and all its checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deregister_critical_service_after: Option<String>,
}

/// Descriptor a deployed service advertises to the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRegistration {
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub enable_tag_override: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<ServiceCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<ServiceCheck>>,
}

/// A service entry as reported by the registry agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AgentService {
    #[serde(rename = "ID")]
    pub id: String,
    pub service: String,
    pub tags: Option<Vec<String>>,
    pub port: u16,
    pub address: String,
    pub enable_tag_override: bool,
    pub create_index: u64,
    pub modify_index: u64,
}

/// Client for the registry agent's HTTP control-plane API.
///
/// Holds no coordination state; every call is a single
/// request/response exchange.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base: String,
    client: reqwest::Client,
}

impl RegistryClient {
    /// Create a client for the agent at `address`, reusing `client`
    /// if one is supplied.
    pub fn new(address: &str, client: Option<reqwest::Client>) -> Self {
        Self {
            base: address.trim_end_matches('/').to_string(),
            client: client.unwrap_or_default(),
        }
    }

    /// Advertise a service, with an optional health check, to the
    /// agent.
    pub async fn register_service(
        &self,
        service: &ServiceRegistration,
    ) -> Result<(), RegistryError> {
        let resp = self
            .client
            .put(format!("{}/agent/service/register", self.base))
            .json(service)
            .send()
            .await?;
        expect_ok("register_service", resp.status())
    }

    /// Withdraw a service from the agent. Deregistering an unknown id
    /// is not an error on the agent side.
    pub async fn deregister_service(&self, service_id: &str) -> Result<(), RegistryError> {
        let resp = self
            .client
            .put(format!("{}/agent/service/deregister/{}", self.base, service_id))
            .send()
            .await?;
        expect_ok("deregister_service", resp.status())
    }

    /// List every service registered with the local agent.
    pub async fn list_services(&self) -> Result<HashMap<String, AgentService>, RegistryError> {
        let resp = self
            .client
            .get(format!("{}/agent/services", self.base))
            .send()
            .await?;
        let status = resp.status();
        expect_ok("list_services", status)?;
        Ok(resp.json().await?)
    }
}

fn expect_ok(operation: &'static str, status: StatusCode) -> Result<(), RegistryError> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(RegistryError::UnexpectedStatus { operation, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_address_is_normalized() {
        let client = RegistryClient::new("http://127.0.0.1:8500/", None);
        assert_eq!(client.base, "http://127.0.0.1:8500");
    }

    #[test]
    fn registration_omits_empty_fields() {
        let reg = ServiceRegistration {
            name: Some("api".into()),
            port: Some(9000),
            ..Default::default()
        };
        let json = serde_json::to_value(&reg).unwrap();
        assert_eq!(json, serde_json::json!({"Name": "api", "Port": 9000}));
    }

    #[test]
    fn check_serializes_acronym_fields() {
        let check = ServiceCheck {
            http: Some("http://localhost:9000/health".into()),
            interval: Some("10s".into()),
            deregister_critical_service_after: Some("1m".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "HTTP": "http://localhost:9000/health",
                "Interval": "10s",
                "DeregisterCriticalServiceAfter": "1m",
            })
        );
    }
}
