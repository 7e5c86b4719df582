use std::collections::HashSet;

use tokio_util::sync::CancellationToken;

use crate::error::{ItemError, SyncError};
use crate::file_hash::ContentHash;
use crate::library::LocalTrack;
use crate::ports::remote::RemoteService;
use crate::services::sync::HashCache;
use crate::services::sync::remote_state::RemoteTrackIndex;

/// Progress record for a track uploaded during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedTrack {
    pub token: String,
    pub hash: ContentHash,
    pub artist: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TrackOutcome {
    Uploaded(UploadedTrack),
    WouldUpload,
    AlreadyRemote,
    AlreadyUploaded,
    MissingLocation,
}

#[derive(Debug, Clone, Default)]
pub struct SyncTracksResult {
    pub uploaded: Vec<UploadedTrack>,
    /// Dry run only: tracks that would have been uploaded.
    pub would_upload: u32,
    pub already_remote: u32,
    pub duplicates: u32,
    pub missing_location: u32,
    /// Videos and podcasts.
    pub filtered: u32,
    pub hashed: u32,
    pub failures: Vec<ItemError>,
}

/// Uploads local tracks AudioBox doesn't have yet.
///
/// Owns the run's "uploaded this run" set so the same content is never sent twice,
/// even when the library lists it under several entries.
pub struct TrackSynchronizer<'a, R: RemoteService + ?Sized> {
    remote: &'a R,
    remote_index: &'a RemoteTrackIndex,
    uploaded_this_run: HashSet<ContentHash>,
    hashes: HashCache,
    dry_run: bool,
}

impl<'a, R: RemoteService + ?Sized> TrackSynchronizer<'a, R> {
    pub fn new(remote: &'a R, remote_index: &'a RemoteTrackIndex, dry_run: bool) -> Self {
        Self {
            remote,
            remote_index,
            uploaded_this_run: HashSet::new(),
            hashes: HashCache::default(),
            dry_run,
        }
    }

    pub fn uploaded_this_run(&self) -> &HashSet<ContentHash> {
        &self.uploaded_this_run
    }

    /// Hand the computed hashes over to the playlist phase.
    pub fn into_hash_cache(self) -> HashCache {
        self.hashes
    }

    /// Sync every track, in order.
    ///
    /// Per-track failures are logged and collected; only cancellation stops the loop.
    pub async fn sync_tracks(
        &mut self,
        tracks: &[LocalTrack],
        cancel: &CancellationToken,
    ) -> Result<SyncTracksResult, SyncError> {
        let mut result = SyncTracksResult::default();

        for track in tracks {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            if !track.is_candidate() {
                result.filtered += 1;
                continue;
            }

            let hashed_before = self.hashes.computed();
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                outcome = self.sync_track(track) => outcome,
            };
            result.hashed += self.hashes.computed() - hashed_before;

            match outcome {
                Ok(TrackOutcome::Uploaded(uploaded)) => result.uploaded.push(uploaded),
                Ok(TrackOutcome::WouldUpload) => result.would_upload += 1,
                Ok(TrackOutcome::AlreadyRemote) => result.already_remote += 1,
                Ok(TrackOutcome::AlreadyUploaded) => result.duplicates += 1,
                Ok(TrackOutcome::MissingLocation) => result.missing_location += 1,
                Err(e) => {
                    tracing::warn!("Skipping '{}': {}", track.display_name(), e);
                    result.failures.push(e);
                }
            }
        }

        tracing::info!(
            "Track sync complete: {} uploaded, {} already remote, {} duplicates, {} missing, {} failed",
            result.uploaded.len(),
            result.already_remote,
            result.duplicates,
            result.missing_location,
            result.failures.len()
        );

        Ok(result)
    }

    async fn sync_track(&mut self, track: &LocalTrack) -> Result<TrackOutcome, ItemError> {
        let Some(path) = track.location.as_deref() else {
            tracing::info!("Skipping '{}': file not found", track.display_name());
            return Ok(TrackOutcome::MissingLocation);
        };

        let hash = self.hashes.hash(path)?;

        if self.remote_index.contains(&hash) {
            tracing::debug!("'{}' already on AudioBox ({})", track.display_name(), hash);
            return Ok(TrackOutcome::AlreadyRemote);
        }
        if self.uploaded_this_run.contains(&hash) {
            tracing::debug!("'{}' already uploaded this run ({})", track.display_name(), hash);
            return Ok(TrackOutcome::AlreadyUploaded);
        }

        if self.dry_run {
            tracing::info!("Would upload {} {}", hash, track.display_name());
            self.uploaded_this_run.insert(hash);
            return Ok(TrackOutcome::WouldUpload);
        }

        let token = self
            .remote
            .upload_track(path)
            .await
            .map_err(|e| ItemError::remote("upload", e))?;
        self.uploaded_this_run.insert(hash.clone());

        tracing::info!("{}:{} {}", token, hash, track.display_name());

        Ok(TrackOutcome::Uploaded(UploadedTrack {
            token,
            hash,
            artist: track.artist.clone(),
            name: track.name.clone(),
        }))
    }
}
