use std::path::Path;

use color_eyre::eyre::Result;

use crate::audiobox::{AudioBoxUser, RemotePlaylist};
use crate::file_hash::ContentHash;

/// Port trait wrapping the AudioBox API capabilities used by the synchronizers.
///
/// Implementations live in `services::audiobox::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RemoteService: Send + Sync {
    async fn get_user(&self) -> Result<AudioBoxUser>;

    async fn get_track_hashes(&self) -> Result<Vec<ContentHash>>;

    /// Uploads the file and returns the token AudioBox assigned to it.
    async fn upload_track(&self, path: &Path) -> Result<String>;

    async fn get_track_token(&self, hash: &ContentHash) -> Result<String>;

    async fn get_playlists(&self) -> Result<Vec<RemotePlaylist>>;

    async fn create_playlist(&self, name: &str) -> Result<()>;

    async fn add_tracks_to_playlist(&self, playlist_token: &str, track_tokens: &[String])
    -> Result<()>;
}
