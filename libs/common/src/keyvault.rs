//! Key vault secret backend
//!
//! Reads secrets over the vault's REST API. The caller supplies an access
//! token; acquiring and refreshing that token is left to the deployment.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::secrets::{SecretStore, SecretValue};

const API_VERSION: &str = "7.4";

/// Key vault connection settings
#[derive(Debug, Clone)]
pub struct KeyVaultConfig {
    /// Vault base URL, e.g. `https://my-vault.vault.azure.net`
    pub vault_url: String,
    /// Bearer token sent with every request
    pub access_token: SecretValue,
}

#[derive(Deserialize)]
struct SecretBundle {
    value: String,
}

/// Secret store backed by a key vault
#[derive(Clone)]
pub struct KeyVaultSecretStore {
    client: Client,
    config: KeyVaultConfig,
}

impl KeyVaultSecretStore {
    pub fn new(config: KeyVaultConfig) -> StoreResult<Self> {
        if config.vault_url.is_empty() {
            return Err(StoreError::Configuration(
                "key vault URL must not be empty".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            config,
        })
    }

    fn secret_url(&self, name: &str) -> String {
        format!(
            "{}/secrets/{}?api-version={}",
            self.config.vault_url.trim_end_matches('/'),
            name,
            API_VERSION
        )
    }
}

/// Map a non-success vault status onto a store error
fn status_error(status: StatusCode, name: &str) -> StoreError {
    if status == StatusCode::NOT_FOUND {
        StoreError::NotFound(name.to_string())
    } else {
        StoreError::UpstreamStatus(status.as_u16())
    }
}

#[async_trait]
impl SecretStore for KeyVaultSecretStore {
    async fn get_secret(&self, name: &str) -> StoreResult<SecretValue> {
        debug!("Fetching secret {} from key vault", name);

        let response = self
            .client
            .get(self.secret_url(name))
            .bearer_auth(self.config.access_token.expose())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status != StatusCode::NOT_FOUND {
                warn!("Key vault answered {} for secret {}", status, name);
            }
            return Err(status_error(status, name));
        }

        let bundle: SecretBundle = response.json().await?;
        Ok(SecretValue::new(bundle.value))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::{HeaderMap, StatusCode as HttpStatus, header},
        response::{IntoResponse, Response},
        routing::get,
    };
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    fn store(url: &str, token: &str) -> KeyVaultSecretStore {
        KeyVaultSecretStore::new(KeyVaultConfig {
            vault_url: url.to_string(),
            access_token: SecretValue::new(token),
        })
        .unwrap()
    }

    /// Answers like the vault's get-secret endpoint for a single stored secret
    async fn get_secret_stub(
        Path(name): Path<String>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Response {
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            == Some("Bearer vault-token");
        if !authorized {
            return HttpStatus::UNAUTHORIZED.into_response();
        }
        if query.get("api-version").map(String::as_str) != Some(API_VERSION) {
            return HttpStatus::BAD_REQUEST.into_response();
        }

        match name.as_str() {
            "alicepass" => Json(json!({
                "value": "secret1",
                "id": "https://vault/secrets/alicepass/1",
                "attributes": { "enabled": true }
            }))
            .into_response(),
            _ => (
                HttpStatus::NOT_FOUND,
                Json(json!({ "error": { "code": "SecretNotFound" } })),
            )
                .into_response(),
        }
    }

    async fn spawn_vault() -> String {
        let app = Router::new().route("/secrets/:name", get(get_secret_stub));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{address}")
    }

    #[test]
    fn secret_url_includes_name_and_api_version() {
        let vault = store("https://kv-tasks.vault.azure.net/", "token");
        assert_eq!(
            vault.secret_url("alicepass"),
            "https://kv-tasks.vault.azure.net/secrets/alicepass?api-version=7.4"
        );
    }

    #[test]
    fn empty_vault_url_is_rejected() {
        let result = KeyVaultSecretStore::new(KeyVaultConfig {
            vault_url: String::new(),
            access_token: SecretValue::new("token"),
        });
        assert!(matches!(result, Err(StoreError::Configuration(_))));
    }

    #[test]
    fn config_debug_hides_access_token() {
        let config = KeyVaultConfig {
            vault_url: "https://kv-tasks.vault.azure.net".to_string(),
            access_token: SecretValue::new("vault-token"),
        };
        let printed = format!("{:?}", config);
        assert!(printed.contains("kv-tasks"));
        assert!(!printed.contains("vault-token"));
    }

    #[test]
    fn status_mapping() {
        assert!(status_error(StatusCode::NOT_FOUND, "bobpass").is_not_found());

        let forbidden = status_error(StatusCode::FORBIDDEN, "bobpass");
        assert!(matches!(forbidden, StoreError::UpstreamStatus(403)));
        assert!(!forbidden.is_transient());

        let unavailable = status_error(StatusCode::SERVICE_UNAVAILABLE, "bobpass");
        assert!(unavailable.is_transient());
    }

    #[tokio::test]
    async fn get_secret_sends_bearer_token_and_reads_value() {
        let vault = store(&spawn_vault().await, "vault-token");

        let secret = vault.get_secret("alicepass").await.unwrap();
        assert_eq!(secret.expose(), "secret1");
    }

    #[tokio::test]
    async fn get_secret_maps_missing_secret_to_not_found() {
        let vault = store(&spawn_vault().await, "vault-token");

        let err = vault.get_secret("bobpass").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn get_secret_with_bad_token_is_not_transient() {
        let vault = store(&spawn_vault().await, "stale-token");

        let err = vault.get_secret("alicepass").await.unwrap_err();
        assert!(matches!(err, StoreError::UpstreamStatus(401)));
        assert!(!err.is_transient());
    }
}
