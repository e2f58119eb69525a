//! Character file store on the local filesystem.

use super::ArtifactStore;
use crate::error::ArtifactError;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Suffix of every character file
const CHARACTER_FILE_SUFFIX: &str = ".character.json";

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("valid name regex"))
}

/// On-disk representation of a deployable character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterFile {
    pub name: String,
    pub description: String,
    pub bio: Vec<String>,
    pub created_at: u64,
}

/// Writes one JSON file per character into a directory
pub struct FileArtifactStore {
    directory: PathBuf,
}

impl FileArtifactStore {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    /// Path of the file for `name`
    pub fn character_path(&self, name: &str) -> PathBuf {
        self.directory
            .join(format!("{}{}", name, CHARACTER_FILE_SUFFIX))
    }

    /// Read back a stored character
    pub async fn load(&self, name: &str) -> Result<CharacterFile, ArtifactError> {
        let bytes = fs::read(self.character_path(name)).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn create(&self, name: &str, description: &str) -> Result<(), ArtifactError> {
        // Names become file names and URL segments
        if !name_pattern().is_match(name) {
            return Err(ArtifactError::InvalidName(name.to_string()));
        }

        fs::create_dir_all(&self.directory).await?;

        let record = CharacterFile {
            name: name.to_string(),
            description: description.to_string(),
            bio: vec![description.to_string()],
            created_at: unix_timestamp(),
        };
        let body = serde_json::to_vec_pretty(&record)?;

        let path = self.character_path(name);
        let file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(ArtifactError::AlreadyExists(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        write_new(&path, file, &body).await?;

        tracing::debug!(path = %path.display(), "Wrote character file");
        Ok(())
    }
}

/// Fill a freshly created file, removing it again if the write fails so a
/// retry is not mistaken for a name collision
async fn write_new<W>(path: &Path, mut file: W, body: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = write_and_flush(&mut file, body).await;
    if written.is_err() {
        drop(file);
        if let Err(e) = fs::remove_file(path).await {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove partial character file"
            );
        }
    }
    written
}

async fn write_and_flush<W>(file: &mut W, body: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    file.write_all(body).await?;
    file.flush().await
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
