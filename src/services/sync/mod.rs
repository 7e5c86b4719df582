pub mod playlists;
pub mod remote_state;
pub mod tracks;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::error::{ItemError, SyncError};
use crate::file_hash::{self, ContentHash};
use crate::ports::library::LibrarySource;
use crate::ports::remote::RemoteService;
use playlists::{PlaylistSynchronizer, SyncPlaylistsResult};
use remote_state::fetch_remote_state;
use tracks::{SyncTracksResult, TrackSynchronizer};

/// Content hashes computed so far in this run, keyed by file path.
///
/// Playlist members are usually library tracks hashed during the track phase, so the
/// playlist phase reuses these instead of reading every file twice.
#[derive(Debug, Default)]
pub struct HashCache {
    by_path: HashMap<PathBuf, ContentHash>,
    computed: u32,
}

impl HashCache {
    pub fn hash(&mut self, path: &Path) -> Result<ContentHash, ItemError> {
        if let Some(hash) = self.by_path.get(path) {
            return Ok(hash.clone());
        }

        let hash = file_hash::compute_md5(path).map_err(|e| ItemError::unreadable(path, e))?;
        self.computed += 1;
        self.by_path.insert(path.to_path_buf(), hash.clone());
        Ok(hash)
    }

    /// Number of files successfully hashed (cache hits not included).
    pub fn computed(&self) -> u32 {
        self.computed
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Fetch and compare only; never upload, create or modify anything remotely.
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub tracks: SyncTracksResult,
    pub playlists: SyncPlaylistsResult,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tracks = &self.tracks;
        let playlists = &self.playlists;
        writeln!(
            f,
            "Tracks: {} uploaded, {} already on AudioBox, {} duplicates, {} missing, {} videos/podcasts skipped, {} failed",
            tracks.uploaded.len() as u32 + tracks.would_upload,
            tracks.already_remote,
            tracks.duplicates,
            tracks.missing_location,
            tracks.filtered,
            tracks.failures.len()
        )?;
        write!(
            f,
            "Playlists: {} created, {} already on AudioBox, {} synced, {} empty, {} unresolved, {} tracks skipped",
            playlists.created.len(),
            playlists.already_present.len(),
            playlists.synced.len(),
            playlists.empty.len(),
            playlists.unresolved.len(),
            playlists.skipped_tracks
        )
    }
}

/// One full run: remote baseline, then tracks, then playlists.
pub struct Synchronizer<R: RemoteService> {
    remote: R,
    library: Box<dyn LibrarySource>,
    options: SyncOptions,
    cancel: CancellationToken,
}

impl<R: RemoteService> Synchronizer<R> {
    pub fn new(
        remote: R,
        library: Box<dyn LibrarySource>,
        options: SyncOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            remote,
            library,
            options,
            cancel,
        }
    }

    pub async fn run(&self) -> Result<RunSummary, SyncError> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let state = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SyncError::Cancelled),
            state = fetch_remote_state(&self.remote) => state?,
        };
        if let Some(email) = &state.user.email {
            tracing::info!("Logged in as {}", email);
        }

        let local_tracks = self.library.list_tracks().map_err(SyncError::library)?;
        let local_playlists = self
            .library
            .list_custom_playlists()
            .map_err(SyncError::library)?;
        tracing::info!(
            "Local library has {} tracks and {} custom playlists",
            local_tracks.len(),
            local_playlists.len()
        );

        let mut track_sync =
            TrackSynchronizer::new(&self.remote, &state.tracks, self.options.dry_run);
        let tracks = track_sync.sync_tracks(&local_tracks, &self.cancel).await?;
        tracing::debug!(
            "{} distinct files sent this run",
            track_sync.uploaded_this_run().len()
        );
        let hashes = track_sync.into_hash_cache();

        let mut playlist_sync = PlaylistSynchronizer::new(&self.remote, hashes, self.options.dry_run);
        let playlists = playlist_sync
            .sync_playlists(state.playlists, &local_playlists, &self.cancel)
            .await?;

        Ok(RunSummary { tracks, playlists })
    }
}
