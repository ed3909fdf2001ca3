//! File-backed token store.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use directories::ProjectDirs;
use tracing::debug;

use rxstorage_core::{Error, Result, TokenSet, TokenStore};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

const TOKEN_FILE: &str = "tokens.json";

/// Persists the [`TokenSet`] as JSON, readable only by the owner on Unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use `path` if given, otherwise `tokens.json` in the user data directory.
    pub fn resolve(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Ok(Self::new(path)),
            None => Ok(Self::new(default_path()?)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn default_path() -> anyhow::Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "rxstorage").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join(TOKEN_FILE))
}

/// Write `contents` to a fresh owner-only sibling file, then rename it over
/// `path`. Readers see either the old file or the complete new one.
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    match fs::remove_file(&tmp) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let written = options.open(&tmp).and_then(|mut file| {
        file.write_all(contents)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, path)
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<TokenSet>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)
            .map_err(|e| Error::store(format!("failed to read {}: {e}", self.path.display())))?;
        let tokens = serde_json::from_str(&json)
            .map_err(|e| Error::store(format!("invalid token file {}: {e}", self.path.display())))?;
        Ok(Some(tokens))
    }

    async fn save(&self, tokens: &TokenSet) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                Error::store(format!("failed to create {}: {e}", dir.display()))
            })?;
        }

        let json = serde_json::to_string_pretty(tokens).map_err(Error::store)?;
        write_private(&self.path, json.as_bytes())
            .map_err(|e| Error::store(format!("failed to write {}: {e}", self.path.display())))?;

        debug!(path = %self.path.display(), "Saved tokens");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                Error::store(format!("failed to remove {}: {e}", self.path.display()))
            })?;
            debug!(path = %self.path.display(), "Cleared tokens");
        }
        Ok(())
    }
}
