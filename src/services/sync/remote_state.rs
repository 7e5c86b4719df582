use std::collections::{HashMap, HashSet};

use crate::audiobox::{AudioBoxUser, RemotePlaylist};
use crate::error::SyncError;
use crate::file_hash::ContentHash;
use crate::ports::remote::RemoteService;

/// Hashes AudioBox already stores, as fetched at the start of the run.
///
/// Never updated during the run; uploads made by this run are tracked by the track
/// synchronizer instead.
#[derive(Debug, Clone, Default)]
pub struct RemoteTrackIndex {
    hashes: HashSet<ContentHash>,
}

impl RemoteTrackIndex {
    pub fn new(hashes: impl IntoIterator<Item = ContentHash>) -> Self {
        Self {
            hashes: hashes.into_iter().collect(),
        }
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.hashes.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }
}

/// Name <-> token maps for the account's playlists.
#[derive(Debug, Clone, Default)]
pub struct RemotePlaylistIndex {
    token_by_name: HashMap<String, String>,
    name_by_token: HashMap<String, String>,
}

impl RemotePlaylistIndex {
    /// When several remote playlists share a name, the first one listed wins.
    pub fn new(playlists: impl IntoIterator<Item = RemotePlaylist>) -> Self {
        let mut index = Self::default();
        for playlist in playlists {
            index
                .token_by_name
                .entry(playlist.name.clone())
                .or_insert_with(|| playlist.token.clone());
            index.name_by_token.insert(playlist.token, playlist.name);
        }
        index
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.token_by_name.contains_key(name)
    }

    pub fn token_for(&self, name: &str) -> Option<&str> {
        self.token_by_name.get(name).map(String::as_str)
    }

    pub fn name_for(&self, token: &str) -> Option<&str> {
        self.name_by_token.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.name_by_token.len()
    }
}

/// Baseline of what AudioBox holds before this run changes anything.
#[derive(Debug, Clone)]
pub struct RemoteState {
    pub user: AudioBoxUser,
    pub tracks: RemoteTrackIndex,
    pub playlists: RemotePlaylistIndex,
}

/// Fetch the user profile, the known hashes and the playlists.
///
/// Any failure is fatal: syncing without a baseline could duplicate uploads.
pub async fn fetch_remote_state<R: RemoteService + ?Sized>(
    remote: &R,
) -> Result<RemoteState, SyncError> {
    let user = remote
        .get_user()
        .await
        .map_err(|e| SyncError::remote_state("user profile", e))?;

    match user.profile.maximum_portability {
        Some(enabled) => tracing::info!("Maximum Portability is set to {}", enabled),
        None => tracing::info!("Maximum Portability is not reported for this account"),
    }

    let hashes = remote
        .get_track_hashes()
        .await
        .map_err(|e| SyncError::remote_state("track hashes", e))?;
    let tracks = RemoteTrackIndex::new(hashes);
    tracing::info!("Got hashes list: {} tracks already on AudioBox", tracks.len());

    let playlists = fetch_playlist_index(remote).await?;
    tracing::info!("Got {} remote playlists", playlists.len());

    Ok(RemoteState {
        user,
        tracks,
        playlists,
    })
}

pub async fn fetch_playlist_index<R: RemoteService + ?Sized>(
    remote: &R,
) -> Result<RemotePlaylistIndex, SyncError> {
    let playlists = remote
        .get_playlists()
        .await
        .map_err(|e| SyncError::remote_state("playlists", e))?;
    Ok(RemotePlaylistIndex::new(playlists))
}
