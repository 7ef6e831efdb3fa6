use reqwest::Url;

use crate::{spotify::SpotifyClient, types::TokenResponse};

use super::CatalogError;

/// Permissions requested on every authorization.
pub const SCOPES: [&str; 9] = [
    "user-library-read",
    "user-library-modify",
    "user-read-private",
    "user-read-recently-played",
    "playlist-modify-public",
    "playlist-modify-private",
    "playlist-read-private",
    "playlist-read-collaborative",
    "user-top-read",
];

/// Builds the URL the user has to visit to grant access.
///
/// `state` is echoed back by Spotify on the redirect and carries the resume
/// token of the action that asked for authorization.
///
/// # Errors
///
/// Fails only when `authorize_url` itself is not a valid URL.
pub fn authorize_url(
    authorize_url: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> Result<String, CatalogError> {
    let scope = SCOPES.join(" ");
    let url = Url::parse_with_params(
        authorize_url,
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("state", state),
        ],
    )
    .map_err(|e| CatalogError::InvalidRequest(format!("bad authorize url: {}", e)))?;

    Ok(url.into())
}

impl SpotifyClient {
    /// Posts a grant to the token endpoint, authenticating with the client
    /// id and secret.
    pub(super) async fn request_token(
        &self,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, CatalogError> {
        let request = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form);

        // token calls must not carry the user's bearer token
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status,
                message: super::error_message(&body),
            });
        }

        Ok(response.json::<TokenResponse>().await?)
    }
}
