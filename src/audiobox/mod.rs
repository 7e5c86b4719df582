use color_eyre::eyre::{Result, WrapErr};
use url::Url;

pub mod playlists;
pub mod tracks;
pub mod user;

pub use playlists::{RemotePlaylist, add_tracks_to_playlist, create_playlist, get_playlists};
pub use tracks::{get_track_hashes, get_track_token, upload_track};
pub use user::{AudioBoxUser, get_user};

pub const DEFAULT_API_URL: &str = "http://audiobox.fm/api";

/// Email/password pair sent as HTTP Basic auth on every request.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parse the API base URL, making sure relative joins land under it.
///
/// `Url::join("tracks")` against `http://host/api` would replace `api`, so a trailing
/// slash is appended when missing.
pub fn parse_api_url(raw: &str) -> Result<Url> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).wrap_err(format!("Invalid API URL: {}", raw))
}
