//! Visitor IP resolution.
//!
//! The public site has no accounts; a visitor's public IP address is the
//! sole identity token for like toggling and visit tracking. This is a
//! weak, spoofable primitive (everyone behind a shared NAT collapses to
//! one identity) and is treated as a given constraint, not something to
//! fix here.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{CoreError, Result};

pub const DEFAULT_IP_ENDPOINT: &str = "https://api.ipify.org?format=json";

#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the caller's public IP address.
    async fn resolve(&self) -> Result<String>;
}

#[derive(Deserialize)]
struct IpResponse {
    ip: String,
}

/// Resolver backed by the ipify JSON endpoint.
pub struct IpifyClient {
    endpoint: String,
    client: reqwest::Client,
}

impl IpifyClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for IpifyClient {
    fn default() -> Self {
        Self::new(DEFAULT_IP_ENDPOINT)
    }
}

#[async_trait]
impl IpResolver for IpifyClient {
    async fn resolve(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| CoreError::IpResolve(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::IpResolve(format!(
                "ip endpoint answered {}",
                response.status()
            )));
        }

        let body: IpResponse = response
            .json()
            .await
            .map_err(|e| CoreError::IpResolve(e.to_string()))?;

        Ok(body.ip)
    }
}

/// Resolver that always returns a fixed address. Used by tests and by
/// deployments where the caller address is already known.
pub struct StaticIpResolver {
    ip: String,
}

impl StaticIpResolver {
    pub fn new(ip: impl Into<String>) -> Self {
        Self { ip: ip.into() }
    }
}

#[async_trait]
impl IpResolver for StaticIpResolver {
    async fn resolve(&self) -> Result<String> {
        Ok(self.ip.clone())
    }
}
