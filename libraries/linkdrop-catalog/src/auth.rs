//! Access token exchange against the accounts service.

use crate::error::{CatalogClientError, Result};
use crate::types::TokenResponse;
use reqwest::Client;
use tracing::{debug, warn};

/// Token endpoint client.
pub struct AuthClient<'a> {
    http: &'a Client,
    accounts_base: &'a str,
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(http: &'a Client, accounts_base: &'a str) -> Self {
        Self {
            http,
            accounts_base,
        }
    }

    /// Trade the refresh token for a fresh access token.
    pub async fn refresh_access_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenResponse> {
        let url = format!("{}/api/token", self.accounts_base);
        debug!(url = %url, "Refreshing access token");

        let response = self
            .http
            .post(&url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let token: TokenResponse = response.json().await.map_err(|e| {
                CatalogClientError::ParseError(format!("Failed to parse token response: {}", e))
            })?;

            debug!(expires_in = token.expires_in, "Token refresh successful");
            Ok(token)
        } else if matches!(status.as_u16(), 400 | 401) {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Refresh token rejected");
            Err(CatalogClientError::TokenRefreshFailed(error_text))
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(CatalogClientError::ServerError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }
}
