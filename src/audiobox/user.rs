use color_eyre::eyre::{Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::audiobox::Credentials;

/* ---------- Response envelope ---------- */

#[derive(Debug, Clone, Deserialize)]
struct UserResponse {
    user: AudioBoxUser,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioBoxUser {
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub profile: AudioBoxProfile,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioBoxProfile {
    /// Whether the account may download its uploads in their original format.
    #[serde(default)]
    pub maximum_portability: Option<bool>,
}

/// Fetch the authenticated user's profile.
///
/// Endpoint
/// - `GET /user.json`
///
/// Doubles as the credential check: a 401 here means nothing else will work either.
pub async fn get_user(
    client: &Client,
    base_url: &Url,
    credentials: &Credentials,
) -> Result<AudioBoxUser> {
    let url = base_url.join("user.json")?;

    let res = client
        .get(url)
        .header("Accept", "application/json")
        .basic_auth(&credentials.email, Some(&credentials.password))
        .send()
        .await?
        .error_for_status()?
        .json::<UserResponse>()
        .await
        .wrap_err("Failed to deserialize AudioBox user response")?;

    Ok(res.user)
}
