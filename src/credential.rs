//! Durable storage for the access credential.
//!
//! The credential outlives any one chat widget: it is read whenever a widget
//! is mounted and written once after a successful login or registration.
//! Storage is a small key-value document in which the token lives under
//! [`ACCESS_TOKEN_KEY`].

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{Value, from_reader, to_writer_pretty};

use crate::error::{Error, Result};

/// Key under which the access token is stored.
pub const ACCESS_TOKEN_KEY: &str = "careercompass_token";

/// Durable key-value storage holding the access token.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored token, if any.
    fn load(&self) -> Result<Option<String>>;

    /// Persists `token`, replacing any previous one.
    fn store(&self, token: &str) -> Result<()>;

    /// Removes the stored token.
    fn clear(&self) -> Result<()>;
}

/// A credential store backed by a JSON document on disk.
///
/// Keys other than [`ACCESS_TOKEN_KEY`] are preserved across writes.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store at `path`.  The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the platform default location, `<config dir>/careercompass/storage.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("careercompass").join("storage.json"))
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<BTreeMap<String, Value>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(Error::io("failed to open credential storage", err)),
        };
        let reader = BufReader::new(file);
        from_reader(reader).map_err(|err| {
            Error::serialization("failed to parse credential storage", Some(Box::new(err)))
        })
    }

    /// Replaces the document by writing a sibling file and renaming it over
    /// the original, so a crash never leaves a truncated document behind.
    fn write_document(&self, document: &BTreeMap<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create credential directory", err))?;
        }
        let staging = self.staging_path();
        let result = write_private(&staging, document).and_then(|()| {
            fs::rename(&staging, &self.path)
                .map_err(|err| Error::io("failed to replace credential storage", err))
        });
        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "storage.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Writes `document` to `path`, readable by the owner only.
fn write_private(path: &Path, document: &BTreeMap<String, Value>) -> Result<()> {
    // A leftover staging file would keep its old mode.
    let _ = fs::remove_file(path);
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options
        .open(path)
        .map_err(|err| Error::io("failed to create credential storage", err))?;
    let mut writer = BufWriter::new(file);
    to_writer_pretty(&mut writer, document).map_err(|err| {
        Error::serialization("failed to serialize credential storage", Some(Box::new(err)))
    })?;
    writer
        .flush()
        .map_err(|err| Error::io("failed to write credential storage", err))?;
    let file = writer
        .into_inner()
        .map_err(|err| Error::io("failed to write credential storage", err.into_error()))?;
    file.sync_all()
        .map_err(|err| Error::io("failed to sync credential storage", err))
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        let document = self.read_document()?;
        Ok(document
            .get(ACCESS_TOKEN_KEY)
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string))
    }

    fn store(&self, token: &str) -> Result<()> {
        let mut document = match self.read_document() {
            Ok(document) => document,
            Err(err) if err.is_serialization() => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "credential storage unreadable; starting a new document"
                );
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        document.insert(ACCESS_TOKEN_KEY.to_string(), Value::from(token));
        self.write_document(&document)
    }

    fn clear(&self) -> Result<()> {
        let mut document = self.read_document()?;
        if document.remove(ACCESS_TOKEN_KEY).is_some() {
            self.write_document(&document)?;
        }
        Ok(())
    }
}

/// An in-memory credential store.
///
/// Clones share the same slot, so a store handed to one widget can be
/// inspected, or handed to the next widget, to model a reload.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    token: Arc<Mutex<Option<String>>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(Mutex::new(Some(token.into()))),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot().clone())
    }

    fn store(&self, token: &str) -> Result<()> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}
