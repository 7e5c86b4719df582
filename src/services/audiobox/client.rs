use std::path::Path;
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use reqwest::Client;
use url::Url;

use crate::audiobox::{
    AudioBoxUser, Credentials, RemotePlaylist, add_tracks_to_playlist, create_playlist,
    get_playlists, get_track_hashes, get_track_token, get_user, upload_track,
};
use crate::file_hash::ContentHash;
use crate::ports::remote::RemoteService;

pub struct AudioBoxHttpAdapter {
    client: Client,
    base_url: Url,
    credentials: Credentials,
}

impl AudioBoxHttpAdapter {
    /// `timeout` bounds each whole request, uploads included.
    pub fn new(base_url: Url, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .wrap_err("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl RemoteService for AudioBoxHttpAdapter {
    async fn get_user(&self) -> Result<AudioBoxUser> {
        get_user(&self.client, &self.base_url, &self.credentials).await
    }

    async fn get_track_hashes(&self) -> Result<Vec<ContentHash>> {
        get_track_hashes(&self.client, &self.base_url, &self.credentials).await
    }

    async fn upload_track(&self, path: &Path) -> Result<String> {
        upload_track(&self.client, &self.base_url, &self.credentials, path).await
    }

    async fn get_track_token(&self, hash: &ContentHash) -> Result<String> {
        get_track_token(&self.client, &self.base_url, &self.credentials, hash).await
    }

    async fn get_playlists(&self) -> Result<Vec<RemotePlaylist>> {
        get_playlists(&self.client, &self.base_url, &self.credentials).await
    }

    async fn create_playlist(&self, name: &str) -> Result<()> {
        create_playlist(&self.client, &self.base_url, &self.credentials, name).await
    }

    async fn add_tracks_to_playlist(
        &self,
        playlist_token: &str,
        track_tokens: &[String],
    ) -> Result<()> {
        add_tracks_to_playlist(
            &self.client,
            &self.base_url,
            &self.credentials,
            playlist_token,
            track_tokens,
        )
        .await
    }
}
