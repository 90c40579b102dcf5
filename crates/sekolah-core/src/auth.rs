//! Admin login check against the shared-credential `petugas` table.
//!
//! Credentials are matched as stored; there is no hashing or session
//! issuance here, matching the deployed schema.

use tracing::warn;

use crate::error::Result;
use crate::store::SupabaseStore;

/// True when a `petugas` row matches both credentials exactly. Blank
/// input (after trimming) fails fast without a store call.
pub async fn verify_login(store: &SupabaseStore, username: &str, password: &str) -> Result<bool> {
    let username = username.trim();
    let password = password.trim();
    if username.is_empty() || password.is_empty() {
        return Ok(false);
    }

    let matches = store
        .count(
            "petugas",
            &[
                ("username", format!("eq.{username}")),
                ("password", format!("eq.{password}")),
            ],
        )
        .await?;

    if matches > 1 {
        warn!(username, "multiple petugas rows match the same credentials");
    }
    Ok(matches > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;

    #[tokio::test]
    async fn test_blank_credentials_fail_without_store_call() {
        // An unroutable base URL; any store call would error rather than
        // return Ok(false).
        let config = CoreConfig::new("http://127.0.0.1:1", "anon-key");
        let store = SupabaseStore::new(&config);

        assert!(!verify_login(&store, "  ", "password").await.unwrap());
        assert!(!verify_login(&store, "admin", "").await.unwrap());
    }
}
