use std::path::{Path, PathBuf};

use crate::library::{LocalPlaylist, LocalTrack};

/// Write `bytes` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, bytes).unwrap();
    path
}

pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// An audio track backed by a file with the given contents.
pub fn track_with_file(dir: &Path, file_name: &str, bytes: &[u8]) -> LocalTrack {
    let path = write_file(dir, file_name, bytes);
    LocalTrack {
        location: Some(path),
        artist: Some("Artist".into()),
        name: file_name.into(),
        is_video: false,
        is_podcast: false,
    }
}

/// A track whose file does not exist on disk.
pub fn track_with_missing_file(dir: &Path, file_name: &str) -> LocalTrack {
    LocalTrack {
        location: Some(dir.join(file_name)),
        artist: None,
        name: file_name.into(),
        is_video: false,
        is_podcast: false,
    }
}

pub fn playlist(name: &str, tracks: Vec<LocalTrack>) -> LocalPlaylist {
    LocalPlaylist {
        name: name.into(),
        tracks,
    }
}

/// Small iTunes export with every playlist kind the reader has to filter.
pub const SAMPLE_ITUNES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple Computer//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>Major Version</key><integer>1</integer>
	<key>Minor Version</key><integer>1</integer>
	<key>Application Version</key><string>12.9.5.5</string>
	<key>Music Folder</key><string>file://localhost/Users/me/Music/</string>
	<key>Tracks</key>
	<dict>
		<key>350</key>
		<dict>
			<key>Track ID</key><integer>350</integer>
			<key>Name</key><string>Aerodynamic</string>
			<key>Artist</key><string>Daft Punk</string>
			<key>Kind</key><string>MPEG audio file</string>
			<key>Location</key><string>file://localhost/Users/me/Music/Daft%20Punk/Aerodynamic.mp3</string>
		</dict>
		<key>200</key>
		<dict>
			<key>Track ID</key><integer>200</integer>
			<key>Name</key><string>One More Time</string>
			<key>Artist</key><string>Daft Punk</string>
			<key>Kind</key><string>MPEG audio file</string>
			<key>Location</key><string>file://localhost/Users/me/Music/Daft%20Punk/One%20More%20Time.mp3</string>
		</dict>
		<key>600</key>
		<dict>
			<key>Track ID</key><integer>600</integer>
			<key>Name</key><string>Ghost</string>
			<key>Artist</key><string>Nobody</string>
		</dict>
		<key>400</key>
		<dict>
			<key>Track ID</key><integer>400</integer>
			<key>Name</key><string>Music Video</string>
			<key>Has Video</key><true/>
			<key>Music Video</key><true/>
			<key>Location</key><string>file://localhost/Users/me/Movies/clip.m4v</string>
		</dict>
		<key>500</key>
		<dict>
			<key>Track ID</key><integer>500</integer>
			<key>Name</key><string>Episode 1</string>
			<key>Podcast</key><true/>
			<key>Location</key><string>file://localhost/Users/me/Podcasts/ep1.mp3</string>
		</dict>
	</dict>
	<key>Playlists</key>
	<array>
		<dict>
			<key>Name</key><string>Library</string>
			<key>Master</key><true/>
			<key>Playlist ID</key><integer>1</integer>
			<key>Visible</key><false/>
			<key>All Items</key><true/>
			<key>Playlist Items</key>
			<array>
				<dict><key>Track ID</key><integer>200</integer></dict>
				<dict><key>Track ID</key><integer>350</integer></dict>
			</array>
		</dict>
		<dict>
			<key>Name</key><string>Music</string>
			<key>Playlist ID</key><integer>2</integer>
			<key>Distinguished Kind</key><integer>4</integer>
			<key>Music</key><true/>
			<key>Playlist Items</key>
			<array>
				<dict><key>Track ID</key><integer>200</integer></dict>
			</array>
		</dict>
		<dict>
			<key>Name</key><string>Gym</string>
			<key>Playlist ID</key><integer>3</integer>
			<key>Playlist Items</key>
			<array>
				<dict><key>Track ID</key><integer>350</integer></dict>
				<dict><key>Track ID</key><integer>200</integer></dict>
				<dict><key>Track ID</key><integer>350</integer></dict>
				<dict><key>Track ID</key><integer>9999</integer></dict>
			</array>
		</dict>
		<dict>
			<key>Name</key><string>Loved Lately</string>
			<key>Playlist ID</key><integer>4</integer>
			<key>Smart Info</key><data>AQEAAwAAAAIAAAAZAAAAAAAAAAcAAAAB</data>
			<key>Smart Criteria</key><data>U0xzdAABAAEAAAACAAAAAQAAAAAAAAAA</data>
		</dict>
		<dict>
			<key>Name</key><string>Stuff</string>
			<key>Playlist ID</key><integer>5</integer>
			<key>Folder</key><true/>
		</dict>
		<dict>
			<key>Name</key><string>Purchased</string>
			<key>Playlist ID</key><integer>6</integer>
		</dict>
		<dict>
			<key>Name</key><string>Chill</string>
			<key>Playlist ID</key><integer>7</integer>
			<key>Playlist Items</key>
			<array>
				<dict><key>Track ID</key><integer>200</integer></dict>
			</array>
		</dict>
	</array>
</dict>
</plist>
"#;
