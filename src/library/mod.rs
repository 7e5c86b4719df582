use std::path::PathBuf;

pub mod directory;
pub mod itunes_xml;

pub use directory::DirectoryLibrary;
pub use itunes_xml::ItunesXmlLibrary;

/// Audio file extensions treated as music.
pub const SUPPORTED_FILE_TYPES: &[&str] = &["mp3", "flac", "m4a", "aac", "ogg", "wav"];

/// Container extensions treated as video tracks (never uploaded).
pub const VIDEO_FILE_TYPES: &[&str] = &["mp4", "m4v", "mov"];

/// Playlists every iTunes library ships with. None of them are user content.
pub const BUILT_IN_PLAYLIST_NAMES: &[&str] = &[
    "Library",
    "Music",
    "Movies",
    "TV Shows",
    "Podcasts",
    "Audiobooks",
    "iTunes U",
    "Books",
    "Purchased",
    "Genius",
    "Downloaded",
    "Voice Memos",
    "Ringtones",
    "Tones",
    "Apps",
    "Radio",
    "Music Videos",
    "Home Videos",
    "90's Music",
    "Classical Music",
    "Recently Added",
    "Recently Played",
    "Top 25 Most Played",
    "My Top Rated",
];

pub fn is_built_in_playlist_name(name: &str) -> bool {
    BUILT_IN_PLAYLIST_NAMES.contains(&name)
}

/// A track as enumerated from the local library.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalTrack {
    /// Backing file. `None` when the library lists the track but the file can't be located.
    pub location: Option<PathBuf>,
    pub artist: Option<String>,
    pub name: String,
    pub is_video: bool,
    pub is_podcast: bool,
}

impl LocalTrack {
    /// Only plain audio tracks are uploaded.
    pub fn is_candidate(&self) -> bool {
        !self.is_video && !self.is_podcast
    }

    /// `Artist - Name`, or just the name when the artist is unknown.
    pub fn display_name(&self) -> String {
        match &self.artist {
            Some(artist) if !artist.is_empty() => format!("{} - {}", artist, self.name),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalPlaylist {
    pub name: String,
    pub tracks: Vec<LocalTrack>,
}
