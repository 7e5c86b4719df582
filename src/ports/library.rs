use color_eyre::eyre::Result;

use crate::library::{LocalPlaylist, LocalTrack};

/// Read-only view of the local music library.
///
/// Implementations: `library::itunes_xml::ItunesXmlLibrary` and
/// `library::directory::DirectoryLibrary`.
#[cfg_attr(test, mockall::automock)]
pub trait LibrarySource {
    /// Every track in the library, in enumeration order.
    fn list_tracks(&self) -> Result<Vec<LocalTrack>>;

    /// User-created, non-smart playlists only.
    fn list_custom_playlists(&self) -> Result<Vec<LocalPlaylist>>;
}
