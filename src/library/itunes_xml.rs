use std::collections::HashMap;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;
use url::Url;

use crate::library::{LocalPlaylist, LocalTrack, is_built_in_playlist_name};
use crate::ports::library::LibrarySource;

/* ---------- Export file layout ---------- */

/// Top level of an `iTunes Music Library.xml` property list.
///
/// Only the keys used for syncing are decoded; everything else is ignored.
#[derive(Debug, Deserialize)]
struct ItunesLibraryFile {
    #[serde(rename = "Tracks", default)]
    tracks: HashMap<String, ItunesTrack>,

    #[serde(rename = "Playlists", default)]
    playlists: Vec<ItunesPlaylist>,
}

#[derive(Debug, Clone, Deserialize)]
struct ItunesTrack {
    #[serde(rename = "Track ID")]
    track_id: i64,

    #[serde(rename = "Name", default)]
    name: Option<String>,

    #[serde(rename = "Artist", default)]
    artist: Option<String>,

    /// `file://` URL, percent-encoded.
    #[serde(rename = "Location", default)]
    location: Option<String>,

    #[serde(rename = "Has Video", default)]
    has_video: bool,

    #[serde(rename = "Movie", default)]
    movie: bool,

    #[serde(rename = "TV Show", default)]
    tv_show: bool,

    #[serde(rename = "Music Video", default)]
    music_video: bool,

    #[serde(rename = "Podcast", default)]
    podcast: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ItunesPlaylist {
    #[serde(rename = "Name", default)]
    name: String,

    #[serde(rename = "Master", default)]
    master: bool,

    #[serde(rename = "Distinguished Kind", default)]
    distinguished_kind: Option<i64>,

    #[serde(rename = "Smart Info", default)]
    smart_info: Option<plist::Value>,

    #[serde(rename = "Smart Criteria", default)]
    smart_criteria: Option<plist::Value>,

    #[serde(rename = "Folder", default)]
    folder: bool,

    #[serde(rename = "Visible", default)]
    visible: Option<bool>,

    #[serde(rename = "Playlist Items", default)]
    items: Vec<ItunesPlaylistItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct ItunesPlaylistItem {
    #[serde(rename = "Track ID")]
    track_id: i64,
}

impl ItunesPlaylist {
    /// User-made, non-smart, non-folder, not one of the stock playlists.
    fn is_custom(&self) -> bool {
        !self.master
            && self.distinguished_kind.is_none()
            && self.smart_info.is_none()
            && self.smart_criteria.is_none()
            && !self.folder
            && self.visible != Some(false)
            && !self.name.is_empty()
            && !is_built_in_playlist_name(&self.name)
    }
}

/// Convert an iTunes `Location` URL into a filesystem path.
///
/// Returns `None` for anything that is not a local `file://` URL.
pub fn location_to_path(location: &str) -> Option<PathBuf> {
    let url = Url::parse(location).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok()
}

impl From<&ItunesTrack> for LocalTrack {
    fn from(track: &ItunesTrack) -> Self {
        LocalTrack {
            location: track.location.as_deref().and_then(location_to_path),
            artist: track.artist.clone(),
            name: track.name.clone().unwrap_or_default(),
            is_video: track.has_video || track.movie || track.tv_show || track.music_video,
            is_podcast: track.podcast,
        }
    }
}

/* ---------- Library source ---------- */

/// Library backed by an iTunes XML export.
///
/// The file is parsed once on open; listing methods work off the parsed copy.
pub struct ItunesXmlLibrary {
    tracks_by_id: HashMap<i64, ItunesTrack>,
    playlists: Vec<ItunesPlaylist>,
}

impl ItunesXmlLibrary {
    pub fn open(path: &Path) -> Result<Self> {
        tracing::debug!("Reading iTunes library export: {}", path.display());
        let file: ItunesLibraryFile = plist::from_file(path)
            .wrap_err(format!("Failed to parse iTunes library: {}", path.display()))?;
        Ok(Self::from_parsed(file))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let file: ItunesLibraryFile =
            plist::from_bytes(bytes).wrap_err("Failed to parse iTunes library")?;
        Ok(Self::from_parsed(file))
    }

    fn from_parsed(file: ItunesLibraryFile) -> Self {
        let tracks_by_id = file
            .tracks
            .into_values()
            .map(|track| (track.track_id, track))
            .collect();

        Self {
            tracks_by_id,
            playlists: file.playlists,
        }
    }
}

impl LibrarySource for ItunesXmlLibrary {
    fn list_tracks(&self) -> Result<Vec<LocalTrack>> {
        let mut tracks: Vec<&ItunesTrack> = self.tracks_by_id.values().collect();
        tracks.sort_by_key(|track| track.track_id);
        Ok(tracks.into_iter().map(LocalTrack::from).collect())
    }

    fn list_custom_playlists(&self) -> Result<Vec<LocalPlaylist>> {
        let playlists = self
            .playlists
            .iter()
            .filter(|playlist| playlist.is_custom())
            .map(|playlist| {
                let tracks = playlist
                    .items
                    .iter()
                    .filter_map(|item| {
                        let track = self.tracks_by_id.get(&item.track_id);
                        if track.is_none() {
                            tracing::debug!(
                                "Playlist '{}' references unknown track ID {}",
                                playlist.name,
                                item.track_id
                            );
                        }
                        track.map(LocalTrack::from)
                    })
                    .collect();

                LocalPlaylist {
                    name: playlist.name.clone(),
                    tracks,
                }
            })
            .collect();

        Ok(playlists)
    }
}
