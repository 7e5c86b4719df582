use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use color_eyre::{Result, eyre::Context};

/// MD5 digest of a file's bytes, as 32 lowercase hex characters.
///
/// AudioBox keys uploaded tracks by this value, so it is both the local dedup key
/// and the remote lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(String);

impl ContentHash {
    /// Normalize a hash reported by the remote service.
    ///
    /// Returns `None` for anything that is not a 128-bit hex digest.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.len() != 32 || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const READ_CHUNK: usize = 8192;

/// MD5 of a file's bytes, read in fixed-size chunks.
pub fn compute_md5(path: &Path) -> Result<ContentHash> {
    let file = File::open(path).context(format!("Failed to open file: {}", path.display()))?;
    let mut reader = BufReader::with_capacity(READ_CHUNK, file);
    let mut digest = md5::Context::new();
    let mut chunk = [0u8; READ_CHUNK];

    while let n @ 1.. = reader
        .read(&mut chunk)
        .context(format!("Failed to read file: {}", path.display()))?
    {
        digest.consume(&chunk[..n]);
    }

    let hash = ContentHash(format!("{:x}", digest.compute()));
    tracing::trace!("{} {}", hash, path.display());
    Ok(hash)
}
