use std::collections::{HashMap, HashSet};

use tokio_util::sync::CancellationToken;

use crate::error::{ItemError, SyncError};
use crate::file_hash::ContentHash;
use crate::library::{LocalPlaylist, LocalTrack};
use crate::ports::remote::RemoteService;
use crate::services::sync::HashCache;
use crate::services::sync::remote_state::{RemotePlaylistIndex, fetch_playlist_index};

/// A playlist whose membership was submitted to AudioBox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedPlaylist {
    pub name: String,
    pub token: String,
    pub track_tokens: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SyncPlaylistsResult {
    /// Names created during this run (or that would be, on a dry run).
    pub created: Vec<String>,
    pub already_present: Vec<String>,
    pub synced: Vec<SyncedPlaylist>,
    /// Playlists with no resolvable remote tracks; nothing was submitted for them.
    pub empty: Vec<String>,
    pub unresolved: Vec<String>,
    /// Playlist entries whose remote token could not be resolved.
    pub skipped_tracks: u32,
    pub failures: Vec<ItemError>,
}

/// Replicates local custom playlists on AudioBox.
///
/// Runs in two phases: create playlists missing remotely, then submit each playlist's
/// full, deduplicated membership.
pub struct PlaylistSynchronizer<'a, R: RemoteService + ?Sized> {
    remote: &'a R,
    hashes: HashCache,
    track_tokens: HashMap<ContentHash, String>,
    dry_run: bool,
}

impl<'a, R: RemoteService + ?Sized> PlaylistSynchronizer<'a, R> {
    pub fn new(remote: &'a R, hashes: HashCache, dry_run: bool) -> Self {
        Self {
            remote,
            hashes,
            track_tokens: HashMap::new(),
            dry_run,
        }
    }

    pub async fn sync_playlists(
        &mut self,
        index: RemotePlaylistIndex,
        playlists: &[LocalPlaylist],
        cancel: &CancellationToken,
    ) -> Result<SyncPlaylistsResult, SyncError> {
        let mut result = SyncPlaylistsResult::default();

        let created_any = self
            .create_missing_playlists(&index, playlists, cancel, &mut result)
            .await?;

        // Creation doesn't return the new token, so pick it up from a fresh listing.
        let index = if created_any {
            tracing::debug!("Refreshing remote playlists after creation");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                refreshed = fetch_playlist_index(self.remote) => refreshed?,
            }
        } else {
            index
        };

        for playlist in playlists {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            self.sync_membership(&index, playlist, cancel, &mut result)
                .await?;
        }

        tracing::info!(
            "Playlist sync complete: {} created, {} synced, {} empty, {} unresolved, {} failed",
            result.created.len(),
            result.synced.len(),
            result.empty.len(),
            result.unresolved.len(),
            result.failures.len()
        );

        Ok(result)
    }

    /// Phase A. Returns whether any playlist was actually created remotely.
    async fn create_missing_playlists(
        &mut self,
        index: &RemotePlaylistIndex,
        playlists: &[LocalPlaylist],
        cancel: &CancellationToken,
        result: &mut SyncPlaylistsResult,
    ) -> Result<bool, SyncError> {
        let mut requested: HashSet<&str> = HashSet::new();
        let mut created_any = false;

        for playlist in playlists {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let name = playlist.name.as_str();
            if !requested.insert(name) {
                continue;
            }

            if index.contains_name(name) {
                tracing::info!("Skipping playlist {} because it already exists", name);
                result.already_present.push(name.to_string());
                continue;
            }

            if self.dry_run {
                tracing::info!("Would create playlist {}", name);
                result.created.push(name.to_string());
                continue;
            }

            tracing::info!("Creating playlist {}", name);
            let created = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                created = self.remote.create_playlist(name) => created,
            };

            match created {
                Ok(()) => {
                    created_any = true;
                    result.created.push(name.to_string());
                }
                Err(e) => {
                    let err = ItemError::remote("playlist creation", e);
                    tracing::warn!("Failed to create playlist {}: {}", name, err);
                    result.failures.push(err);
                }
            }
        }

        Ok(created_any)
    }

    /// Phase B for one playlist.
    ///
    /// The add request is only sent when at least one member resolved to a remote
    /// token. A playlist with none is reported as `empty` rather than sent an empty
    /// token list.
    async fn sync_membership(
        &mut self,
        index: &RemotePlaylistIndex,
        playlist: &LocalPlaylist,
        cancel: &CancellationToken,
        result: &mut SyncPlaylistsResult,
    ) -> Result<(), SyncError> {
        let Some(playlist_token) = index.token_for(&playlist.name) else {
            let err = ItemError::UnresolvedPlaylistToken {
                name: playlist.name.clone(),
            };
            tracing::warn!("{}; skipping its tracks", err);
            result.unresolved.push(playlist.name.clone());
            result.failures.push(err);
            return Ok(());
        };

        let mut track_tokens = Vec::new();
        let mut seen = HashSet::new();

        for track in &playlist.tracks {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let resolved = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                resolved = self.resolve_track_token(track) => resolved,
            };

            match resolved {
                Ok(Some(token)) => {
                    if seen.insert(token.clone()) {
                        track_tokens.push(token);
                    }
                }
                Ok(None) => result.skipped_tracks += 1,
                Err(e) => {
                    tracing::debug!(
                        "Leaving '{}' out of playlist {}: {}",
                        track.display_name(),
                        playlist.name,
                        e
                    );
                    result.skipped_tracks += 1;
                }
            }
        }

        if track_tokens.is_empty() {
            tracing::info!("No remote tracks to add to playlist {}", playlist.name);
            result.empty.push(playlist.name.clone());
            return Ok(());
        }

        let synced = SyncedPlaylist {
            name: playlist.name.clone(),
            token: playlist_token.to_string(),
            track_tokens,
        };

        if self.dry_run {
            tracing::info!(
                "Would add {} tracks to playlist {}",
                synced.track_tokens.len(),
                synced.name
            );
            result.synced.push(synced);
            return Ok(());
        }

        tracing::info!(
            "Adding {} tracks to playlist {} ({})",
            synced.track_tokens.len(),
            index.name_for(playlist_token).unwrap_or(synced.name.as_str()),
            playlist_token
        );

        let added = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            added = self.remote.add_tracks_to_playlist(playlist_token, &synced.track_tokens) => added,
        };

        match added {
            Ok(()) => result.synced.push(synced),
            Err(e) => {
                let err = ItemError::remote("adding tracks to playlist", e);
                tracing::warn!("Playlist {}: {}", synced.name, err);
                result.failures.push(err);
            }
        }

        Ok(())
    }

    /// Remote token for a local track, or `None` when it has no backing file.
    async fn resolve_track_token(
        &mut self,
        track: &LocalTrack,
    ) -> Result<Option<String>, ItemError> {
        let Some(path) = track.location.as_deref() else {
            return Ok(None);
        };

        let hash = self.hashes.hash(path)?;
        if let Some(token) = self.track_tokens.get(&hash) {
            return Ok(Some(token.clone()));
        }

        let token = self
            .remote
            .get_track_token(&hash)
            .await
            .map_err(|e| ItemError::remote("track lookup", e))?;
        self.track_tokens.insert(hash, token.clone());

        Ok(Some(token))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use mockall::predicate::eq;

    use super::*;
    use crate::audiobox::RemotePlaylist;
    use crate::ports::remote::MockRemoteService;
    use crate::test_utils::{md5_hex, playlist, track_with_file, track_with_missing_file};

    fn remote_playlist(name: &str, token: &str) -> RemotePlaylist {
        RemotePlaylist {
            name: name.into(),
            token: token.into(),
        }
    }

    fn index(playlists: &[(&str, &str)]) -> RemotePlaylistIndex {
        RemotePlaylistIndex::new(
            playlists
                .iter()
                .map(|(name, token)| remote_playlist(name, token)),
        )
    }

    /// Resolves every hash to `t-<first 6 hex chars>`.
    fn expect_track_lookups(remote: &mut MockRemoteService) {
        remote
            .expect_get_track_token()
            .returning(|hash: &ContentHash| Ok(format!("t-{}", &hash.as_str()[..6])));
    }

    fn token_for_bytes(bytes: &[u8]) -> String {
        format!("t-{}", &md5_hex(bytes)[..6])
    }

    #[tokio::test]
    async fn test_creates_only_missing_playlists() {
        let playlists = vec![playlist("Gym", vec![]), playlist("Chill", vec![])];

        let mut remote = MockRemoteService::new();
        remote
            .expect_create_playlist()
            .with(eq("Gym"))
            .times(1)
            .returning(|_| Ok(()));
        remote
            .expect_create_playlist()
            .with(eq("Chill"))
            .never();
        remote.expect_get_playlists().times(1).returning(|| {
            Ok(vec![
                remote_playlist("Chill", "tok1"),
                remote_playlist("Gym", "tok2"),
            ])
        });

        let mut sync = PlaylistSynchronizer::new(&remote, HashCache::default(), false);
        let result = sync
            .sync_playlists(
                index(&[("Chill", "tok1")]),
                &playlists,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.created, vec!["Gym".to_string()]);
        assert_eq!(result.already_present, vec!["Chill".to_string()]);
        assert_eq!(result.empty, vec!["Gym".to_string(), "Chill".to_string()]);
        assert!(result.unresolved.is_empty());
    }

    #[tokio::test]
    async fn test_no_refresh_when_nothing_created() {
        let playlists = vec![playlist("Chill", vec![])];

        let mut remote = MockRemoteService::new();
        remote.expect_create_playlist().never();
        remote.expect_get_playlists().never();

        let mut sync = PlaylistSynchronizer::new(&remote, HashCache::default(), false);
        sync.sync_playlists(
            index(&[("Chill", "tok1")]),
            &playlists,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_local_names_created_once() {
        let playlists = vec![playlist("Gym", vec![]), playlist("Gym", vec![])];

        let mut remote = MockRemoteService::new();
        remote
            .expect_create_playlist()
            .times(1)
            .returning(|_| Ok(()));
        remote
            .expect_get_playlists()
            .returning(|| Ok(vec![remote_playlist("Gym", "tok2")]));

        let mut sync = PlaylistSynchronizer::new(&remote, HashCache::default(), false);
        let result = sync
            .sync_playlists(index(&[]), &playlists, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.created.len(), 1);
    }

    #[tokio::test]
    async fn test_new_playlist_populated_after_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let playlists = vec![playlist(
            "Gym",
            vec![track_with_file(dir.path(), "a.mp3", b"song a")],
        )];

        let mut remote = MockRemoteService::new();
        remote.expect_create_playlist().returning(|_| Ok(()));
        remote
            .expect_get_playlists()
            .returning(|| Ok(vec![remote_playlist("Gym", "new-token")]));
        expect_track_lookups(&mut remote);
        let expected = vec![token_for_bytes(b"song a")];
        remote
            .expect_add_tracks_to_playlist()
            .withf(move |playlist_token, tokens| {
                playlist_token == "new-token" && tokens == expected.as_slice()
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut sync = PlaylistSynchronizer::new(&remote, HashCache::default(), false);
        let result = sync
            .sync_playlists(index(&[]), &playlists, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.synced.len(), 1);
        assert_eq!(result.synced[0].token, "new-token");
    }

    #[tokio::test]
    async fn test_refresh_failure_is_fatal() {
        let playlists = vec![playlist("Gym", vec![])];

        let mut remote = MockRemoteService::new();
        remote.expect_create_playlist().returning(|_| Ok(()));
        remote
            .expect_get_playlists()
            .returning(|| Err(color_eyre::eyre::eyre!("503 Service Unavailable")));

        let mut sync = PlaylistSynchronizer::new(&remote, HashCache::default(), false);
        let err = sync
            .sync_playlists(index(&[]), &playlists, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::RemoteStateFetch {
                resource: "playlists",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unresolved_playlist_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let playlists = vec![
            playlist(
                "Ghost",
                vec![track_with_file(dir.path(), "a.mp3", b"a")],
            ),
            playlist(
                "Chill",
                vec![track_with_file(dir.path(), "b.mp3", b"b")],
            ),
        ];

        let mut remote = MockRemoteService::new();
        // Creation succeeds but the refreshed listing still lacks the playlist.
        remote.expect_create_playlist().returning(|_| Ok(()));
        remote
            .expect_get_playlists()
            .returning(|| Ok(vec![remote_playlist("Chill", "tok1")]));
        expect_track_lookups(&mut remote);
        remote
            .expect_add_tracks_to_playlist()
            .withf(|playlist_token, _| playlist_token == "tok1")
            .times(1)
            .returning(|_, _| Ok(()));

        let mut sync = PlaylistSynchronizer::new(&remote, HashCache::default(), false);
        let result = sync
            .sync_playlists(
                index(&[("Chill", "tok1")]),
                &playlists,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.unresolved, vec!["Ghost".to_string()]);
        assert!(result.failures.contains(&ItemError::UnresolvedPlaylistToken {
            name: "Ghost".into()
        }));
        assert_eq!(result.synced.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_leaves_track_out() {
        let dir = tempfile::tempdir().unwrap();
        let known = track_with_file(dir.path(), "known.mp3", b"known");
        let unknown = track_with_file(dir.path(), "unknown.mp3", b"unknown");
        let unknown_hash = md5_hex(b"unknown");
        let playlists = vec![playlist("Gym", vec![known, unknown])];

        let mut remote = MockRemoteService::new();
        remote
            .expect_get_track_token()
            .returning(move |hash: &ContentHash| {
                if hash.as_str() == unknown_hash {
                    Err(color_eyre::eyre::eyre!("404 Not Found"))
                } else {
                    Ok("tok-known".to_string())
                }
            });
        let submitted = Arc::new(Mutex::new(Vec::new()));
        let recorded = submitted.clone();
        remote
            .expect_add_tracks_to_playlist()
            .times(1)
            .returning(move |_, tokens: &[String]| {
                recorded.lock().unwrap().push(tokens.to_vec());
                Ok(())
            });

        let mut sync = PlaylistSynchronizer::new(&remote, HashCache::default(), false);
        let result = sync
            .sync_playlists(
                index(&[("Gym", "tok-gym")]),
                &playlists,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            *submitted.lock().unwrap(),
            vec![vec!["tok-known".to_string()]]
        );
        assert_eq!(result.skipped_tracks, 1);
    }

    #[tokio::test]
    async fn test_membership_is_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let a = track_with_file(dir.path(), "a.mp3", b"song a");
        let b = track_with_file(dir.path(), "b.mp3", b"song b");
        let a_copy = track_with_file(dir.path(), "copy-of-a.mp3", b"song a");
        let playlists = vec![playlist(
            "Gym",
            vec![a.clone(), b, a, a_copy],
        )];

        let mut remote = MockRemoteService::new();
        expect_track_lookups(&mut remote);
        let expected = vec![token_for_bytes(b"song a"), token_for_bytes(b"song b")];
        remote
            .expect_add_tracks_to_playlist()
            .withf(move |_, tokens| tokens == expected.as_slice())
            .times(1)
            .returning(|_, _| Ok(()));

        let mut sync = PlaylistSynchronizer::new(&remote, HashCache::default(), false);
        let result = sync
            .sync_playlists(
                index(&[("Gym", "tok-gym")]),
                &playlists,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.synced[0].track_tokens.len(), 2);
    }

    #[tokio::test]
    async fn test_token_lookups_cached_across_playlists() {
        let dir = tempfile::tempdir().unwrap();
        let a = track_with_file(dir.path(), "a.mp3", b"shared");
        let playlists = vec![
            playlist("Gym", vec![a.clone()]),
            playlist("Chill", vec![a]),
        ];

        let mut remote = MockRemoteService::new();
        remote
            .expect_get_track_token()
            .times(1)
            .returning(|_| Ok("tok-shared".to_string()));
        remote
            .expect_add_tracks_to_playlist()
            .times(2)
            .returning(|_, _| Ok(()));

        let mut sync = PlaylistSynchronizer::new(&remote, HashCache::default(), false);
        sync.sync_playlists(
            index(&[("Gym", "g"), ("Chill", "c")]),
            &playlists,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_unreadable_and_missing_tracks_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let playlists = vec![playlist(
            "Gym",
            vec![
                track_with_missing_file(dir.path(), "gone.mp3"),
                LocalTrack {
                    name: "No location".into(),
                    ..Default::default()
                },
            ],
        )];

        let mut remote = MockRemoteService::new();
        remote.expect_get_track_token().never();
        remote.expect_add_tracks_to_playlist().never();

        let mut sync = PlaylistSynchronizer::new(&remote, HashCache::default(), false);
        let result = sync
            .sync_playlists(
                index(&[("Gym", "tok-gym")]),
                &playlists,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.skipped_tracks, 2);
        assert_eq!(result.empty, vec!["Gym".to_string()]);
    }

    #[tokio::test]
    async fn test_add_tracks_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let a = track_with_file(dir.path(), "a.mp3", b"a");
        let playlists = vec![
            playlist("Gym", vec![a.clone()]),
            playlist("Chill", vec![a]),
        ];

        let mut remote = MockRemoteService::new();
        expect_track_lookups(&mut remote);
        remote
            .expect_add_tracks_to_playlist()
            .returning(|playlist_token, _| {
                if playlist_token == "g" {
                    Err(color_eyre::eyre::eyre!("500 Internal Server Error"))
                } else {
                    Ok(())
                }
            });

        let mut sync = PlaylistSynchronizer::new(&remote, HashCache::default(), false);
        let result = sync
            .sync_playlists(
                index(&[("Gym", "g"), ("Chill", "c")]),
                &playlists,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.synced.len(), 1);
        assert_eq!(result.synced[0].name, "Chill");
        assert_eq!(result.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let playlists = vec![
            playlist("Gym", vec![]),
            playlist(
                "Chill",
                vec![track_with_file(dir.path(), "a.mp3", b"a")],
            ),
        ];

        let mut remote = MockRemoteService::new();
        remote.expect_create_playlist().never();
        remote.expect_add_tracks_to_playlist().never();
        remote.expect_get_playlists().never();
        expect_track_lookups(&mut remote);

        let mut sync = PlaylistSynchronizer::new(&remote, HashCache::default(), true);
        let result = sync
            .sync_playlists(
                index(&[("Chill", "tok1")]),
                &playlists,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.created, vec!["Gym".to_string()]);
        assert_eq!(result.unresolved, vec!["Gym".to_string()]);
        assert_eq!(result.synced.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_creation() {
        let playlists = vec![playlist("Gym", vec![])];

        let mut remote = MockRemoteService::new();
        remote.expect_create_playlist().never();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut sync = PlaylistSynchronizer::new(&remote, HashCache::default(), false);
        let err = sync
            .sync_playlists(index(&[]), &playlists, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Cancelled));
    }
}
