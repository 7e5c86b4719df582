use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, bail};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use crate::audiobox::Credentials;
use crate::file_hash::ContentHash;

/* ---------- Known hashes ---------- */

/// Split the `GET /tracks` body into hashes.
///
/// The body is a `;`-separated list. Blank and malformed entries are dropped.
pub fn parse_track_hashes(body: &str) -> Vec<ContentHash> {
    body.split(';')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| {
            let parsed = ContentHash::parse(entry);
            if parsed.is_none() {
                tracing::warn!("Ignoring malformed remote hash: {:?}", entry.trim());
            }
            parsed
        })
        .collect()
}

/// Fetch the hashes of every track already stored for the account.
///
/// Endpoint
/// - `GET /tracks`
pub async fn get_track_hashes(
    client: &Client,
    base_url: &Url,
    credentials: &Credentials,
) -> Result<Vec<ContentHash>> {
    let url = base_url.join("tracks")?;

    let body = client
        .get(url)
        .basic_auth(&credentials.email, Some(&credentials.password))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
        .wrap_err("Failed to read AudioBox track hash list")?;

    Ok(parse_track_hashes(&body))
}

/* ---------- Upload ---------- */

/// Upload a file and return the token AudioBox assigns to it.
///
/// Endpoint
/// - `POST /tracks` (multipart, file in the `media` field)
///
/// The whole file is buffered in memory before sending.
pub async fn upload_track(
    client: &Client,
    base_url: &Url,
    credentials: &Credentials,
    path: &Path,
) -> Result<String> {
    let url = base_url.join("tracks")?;

    let bytes = tokio::fs::read(path)
        .await
        .wrap_err(format!("Failed to read file for upload: {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "track".to_string());

    let form = Form::new().part("media", Part::bytes(bytes).file_name(file_name));

    let body = client
        .post(url)
        .basic_auth(&credentials.email, Some(&credentials.password))
        .multipart(form)
        .send()
        .await?
        .error_for_status()
        .wrap_err(format!("Failed to upload {}", path.display()))?
        .text()
        .await
        .wrap_err("Failed to read upload response")?;

    let token = body.trim();
    if token.is_empty() {
        bail!("Upload of {} returned an empty token", path.display());
    }

    Ok(token.to_string())
}

/* ---------- Lookup by hash ---------- */

#[derive(Debug, Clone, Deserialize)]
struct TrackToken {
    token: String,
}

/// `GET /tracks/{hash}.json` answers either `{"track": {...}}` or the bare record.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TrackLookupResponse {
    Wrapped { track: TrackToken },
    Bare(TrackToken),
}

impl TrackLookupResponse {
    fn into_token(self) -> String {
        match self {
            TrackLookupResponse::Wrapped { track } => track.token,
            TrackLookupResponse::Bare(track) => track.token,
        }
    }
}

/// Resolve the remote token of a previously uploaded track.
///
/// Endpoint
/// - `GET /tracks/{hash}.json`
///
/// Unknown hashes come back as 404, which surfaces as an error.
pub async fn get_track_token(
    client: &Client,
    base_url: &Url,
    credentials: &Credentials,
    hash: &ContentHash,
) -> Result<String> {
    let url = base_url.join(&format!("tracks/{}.json", hash))?;

    let res = client
        .get(url)
        .header("Accept", "application/json")
        .basic_auth(&credentials.email, Some(&credentials.password))
        .send()
        .await?
        .error_for_status()
        .wrap_err(format!("Track {} is not known remotely", hash))?
        .json::<TrackLookupResponse>()
        .await
        .wrap_err("Failed to deserialize AudioBox track response")?;

    Ok(res.into_token())
}
