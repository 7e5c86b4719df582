use std::collections::HashMap;
use std::path::{Path, PathBuf};

use audiotags::Tag;
use color_eyre::eyre::{Result, bail};

use crate::library::itunes_xml::location_to_path;
use crate::library::{LocalPlaylist, LocalTrack, SUPPORTED_FILE_TYPES, VIDEO_FILE_TYPES};
use crate::ports::library::LibrarySource;

const PLAYLIST_FILE_TYPES: &[&str] = &["m3u", "m3u8"];

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn canonical_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Build a track from a file on disk, reading artist and title from its tags.
fn track_from_file(path: &Path, is_video: bool) -> LocalTrack {
    let file_stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (artist, title) = if is_video {
        (None, None)
    } else {
        match Tag::new().read_from_path(path) {
            Ok(tag) => (
                tag.artist().map(str::to_string),
                tag.title().map(str::to_string),
            ),
            Err(e) => {
                tracing::debug!("No readable tags in {}: {}", path.display(), e);
                (None, None)
            }
        }
    };

    LocalTrack {
        location: Some(path.to_path_buf()),
        artist,
        name: title.filter(|t| !t.is_empty()).unwrap_or(file_stem),
        is_video,
        is_podcast: false,
    }
}

/// Extract entries from an M3U/M3U8 playlist body.
///
/// Blank lines and `#` directives are skipped. Entries may be absolute paths, paths
/// relative to the playlist's directory, or `file://` URLs.
pub fn parse_m3u(body: &str, playlist_dir: &Path) -> Vec<PathBuf> {
    body.lines()
        .map(|line| line.trim().trim_start_matches('\u{feff}'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|entry| {
            if entry.starts_with("file:") {
                location_to_path(entry).unwrap_or_else(|| PathBuf::from(entry))
            } else {
                playlist_dir.join(entry)
            }
        })
        .collect()
}

/// Library made of the audio files under a directory, with `.m3u`/`.m3u8` files as
/// playlists.
///
/// The directory is scanned once on open, in file name order.
pub struct DirectoryLibrary {
    tracks: Vec<LocalTrack>,
    playlists: Vec<LocalPlaylist>,
}

impl DirectoryLibrary {
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            bail!("`{}` is not an existing directory", root.display());
        }

        tracing::debug!("Scanning music directory: {}", root.display());

        let mut tracks = Vec::new();
        let mut track_index: HashMap<PathBuf, usize> = HashMap::new();
        let mut playlist_files = Vec::new();

        for entry in walkdir::WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let extension = extension_of(path);

            if SUPPORTED_FILE_TYPES.contains(&extension.as_str()) {
                track_index.insert(canonical_key(path), tracks.len());
                tracks.push(track_from_file(path, false));
            } else if VIDEO_FILE_TYPES.contains(&extension.as_str()) {
                track_index.insert(canonical_key(path), tracks.len());
                tracks.push(track_from_file(path, true));
            } else if PLAYLIST_FILE_TYPES.contains(&extension.as_str()) {
                playlist_files.push(path.to_path_buf());
            }
        }

        let mut playlists = Vec::with_capacity(playlist_files.len());
        for playlist_path in playlist_files {
            // Decoded lossily: non-UTF-8 bytes only affect the entries that contain them.
            let body = match std::fs::read(&playlist_path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    tracing::warn!(
                        "Skipping playlist {}: failed to read it: {}",
                        playlist_path.display(),
                        e
                    );
                    continue;
                }
            };
            let playlist_dir = playlist_path.parent().unwrap_or(root);

            let members = parse_m3u(&body, playlist_dir)
                .into_iter()
                .map(|entry| match track_index.get(&canonical_key(&entry)) {
                    Some(&i) => tracks[i].clone(),
                    None if entry.is_file() => {
                        let is_video = VIDEO_FILE_TYPES.contains(&extension_of(&entry).as_str());
                        track_from_file(&entry, is_video)
                    }
                    None => {
                        tracing::debug!(
                            "Playlist {} references missing file {}",
                            playlist_path.display(),
                            entry.display()
                        );
                        LocalTrack {
                            location: None,
                            name: entry.to_string_lossy().into_owned(),
                            ..Default::default()
                        }
                    }
                })
                .collect();

            playlists.push(LocalPlaylist {
                name: playlist_path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                tracks: members,
            });
        }

        tracing::info!(
            "Found {} tracks and {} playlists in {}",
            tracks.len(),
            playlists.len(),
            root.display()
        );

        Ok(Self { tracks, playlists })
    }
}

impl LibrarySource for DirectoryLibrary {
    fn list_tracks(&self) -> Result<Vec<LocalTrack>> {
        Ok(self.tracks.clone())
    }

    fn list_custom_playlists(&self) -> Result<Vec<LocalPlaylist>> {
        Ok(self.playlists.clone())
    }
}
