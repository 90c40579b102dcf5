use crate::error::{CoreError, Result};
use crate::ip::DEFAULT_IP_ENDPOINT;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Base URL of the Supabase project, e.g. `https://xyz.supabase.co`
    pub supabase_url: String,
    /// Anon (public) API key sent with every request
    pub anon_key: String,
    /// Endpoint that echoes the caller's public IP address
    pub ip_endpoint: String,
}

impl CoreConfig {
    pub fn new(supabase_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            supabase_url: supabase_url.into(),
            anon_key: anon_key.into(),
            ip_endpoint: DEFAULT_IP_ENDPOINT.to_string(),
        }
    }

    /// Read configuration from the environment:
    /// `SEKOLAH_SUPABASE_URL`, `SEKOLAH_SUPABASE_ANON_KEY`, and optionally
    /// `SEKOLAH_IP_ENDPOINT`.
    pub fn from_env() -> Result<Self> {
        let supabase_url = std::env::var("SEKOLAH_SUPABASE_URL")
            .map_err(|_| CoreError::Config("SEKOLAH_SUPABASE_URL is not set".to_string()))?;
        let anon_key = std::env::var("SEKOLAH_SUPABASE_ANON_KEY")
            .map_err(|_| CoreError::Config("SEKOLAH_SUPABASE_ANON_KEY is not set".to_string()))?;
        let ip_endpoint = std::env::var("SEKOLAH_IP_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_IP_ENDPOINT.to_string());

        Ok(Self {
            supabase_url,
            anon_key,
            ip_endpoint,
        })
    }

    pub fn with_ip_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.ip_endpoint = endpoint.into();
        self
    }
}
