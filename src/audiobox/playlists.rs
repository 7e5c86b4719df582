use color_eyre::eyre::{Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::audiobox::Credentials;

/* ---------- Playlists ---------- */

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemotePlaylist {
    pub name: String,
    pub token: String,
}

/// Elements of `GET /playlists.json` come wrapped as `{"playlist": {...}}`; bare records
/// are accepted too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PlaylistEntry {
    Wrapped { playlist: RemotePlaylist },
    Bare(RemotePlaylist),
}

impl From<PlaylistEntry> for RemotePlaylist {
    fn from(entry: PlaylistEntry) -> Self {
        match entry {
            PlaylistEntry::Wrapped { playlist } => playlist,
            PlaylistEntry::Bare(playlist) => playlist,
        }
    }
}

pub fn parse_playlists(body: &str) -> Result<Vec<RemotePlaylist>> {
    let entries: Vec<PlaylistEntry> =
        serde_json::from_str(body).wrap_err("Failed to deserialize AudioBox playlists response")?;
    Ok(entries.into_iter().map(RemotePlaylist::from).collect())
}

/// Fetch the account's playlists.
///
/// Endpoint
/// - `GET /playlists.json`
pub async fn get_playlists(
    client: &Client,
    base_url: &Url,
    credentials: &Credentials,
) -> Result<Vec<RemotePlaylist>> {
    let url = base_url.join("playlists.json")?;

    let body = client
        .get(url)
        .header("Accept", "application/json")
        .basic_auth(&credentials.email, Some(&credentials.password))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
        .wrap_err("Failed to read AudioBox playlists response")?;

    parse_playlists(&body)
}

/* ---------- Create playlist ---------- */

/// Ask AudioBox to create a playlist.
///
/// Endpoint
/// - `POST /tracks` with form field `name`
///
/// The response does not carry the new token; callers re-fetch the playlist list.
pub async fn create_playlist(
    client: &Client,
    base_url: &Url,
    credentials: &Credentials,
    name: &str,
) -> Result<()> {
    let url = base_url.join("tracks")?;

    client
        .post(url)
        .basic_auth(&credentials.email, Some(&credentials.password))
        .form(&[("name", name)])
        .send()
        .await?
        .error_for_status()
        .wrap_err(format!("Failed to create playlist '{}'", name))?;

    Ok(())
}

/* ---------- Membership ---------- */

fn add_tracks_form(track_tokens: &[String]) -> Vec<(&'static str, &str)> {
    track_tokens
        .iter()
        .map(|token| ("track_tokens[]", token.as_str()))
        .collect()
}

/// Add tracks to a playlist in one call.
///
/// Endpoint
/// - `PUT /playlists/{token}/add_tracks` with one `track_tokens[]` field per track
pub async fn add_tracks_to_playlist(
    client: &Client,
    base_url: &Url,
    credentials: &Credentials,
    playlist_token: &str,
    track_tokens: &[String],
) -> Result<()> {
    let url = base_url.join(&format!("playlists/{}/add_tracks", playlist_token))?;

    client
        .put(url)
        .basic_auth(&credentials.email, Some(&credentials.password))
        .form(&add_tracks_form(track_tokens))
        .send()
        .await?
        .error_for_status()
        .wrap_err("Failed to add tracks to playlist")?;

    Ok(())
}
