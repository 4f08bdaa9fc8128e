//! File-backed stores for native clients.
//!
//! Each store is one small JSON object on disk, rewritten whole on every
//! mutation (write to a uniquely named sibling temp file, then rename). Reads
//! go to disk so two processes sharing a profile directory observe each
//! other's writes. Read-modify-write cycles hold an exclusive lock on a
//! sibling `.lock` file, so concurrent writers never drop each other's keys.
//!
//! On unix, files are created `0600` and new directories `0700`.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use cookie::Cookie;

use super::{CookieJar, KeyValueStore, is_expired, mirror_cookie};
use crate::error::StoreError;

// =============================================================================
// JSON FILE
// =============================================================================

#[cfg(unix)]
const FILE_MODE: u32 = 0o600;
#[cfg(unix)]
const DIR_MODE: u32 = 0o700;

fn io_error(e: std::io::Error) -> StoreError {
    StoreError::Io(e.to_string())
}

/// Opens `path` for writing with owner-only permissions on unix.
fn private_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }
    options
}

fn create_private_dir(dir: &Path) -> Result<(), StoreError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(dir).map_err(io_error)
}

struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let name = self.path.file_name().map_or_else(|| "store".into(), |name| name.to_string_lossy());
        self.path.with_file_name(format!(".{name}.{suffix}"))
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::Encoding(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(io_error(e)),
        }
    }

    fn save(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(map).map_err(|e| StoreError::Encoding(e.to_string()))?;
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let tmp = self.sibling(&format!("{}.{nanos}.tmp", std::process::id()));

        let written = (|| -> std::io::Result<()> {
            let mut file = private_options().create_new(true).open(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        })();
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written.map_err(io_error)
    }

    /// Exclusive lock shared by every handle and process using this file.
    /// Released when the returned handle is dropped.
    fn lock(&self) -> Result<File, StoreError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            create_private_dir(parent)?;
        }
        let lock = private_options().create(true).truncate(false).open(self.sibling("lock")).map_err(io_error)?;
        lock.lock().map_err(io_error)?;
        Ok(lock)
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StoreError> {
        let _lock = self.lock()?;
        let mut map = self.load()?;
        apply(&mut map);
        self.save(&map)
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(mut map) => map.remove(key),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "failed to read store file");
                None
            }
        }
    }
}

// =============================================================================
// DURABLE STORE
// =============================================================================

/// Durable key/value store in a JSON file.
pub struct FileStore {
    file: JsonFile,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { file: JsonFile::new(path.into()) }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.file.read(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.file.update(|map| {
            map.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.file.update(|map| {
            map.remove(key);
        })
    }
}

// =============================================================================
// COOKIE JAR
// =============================================================================

/// Cookie jar persisting full `Set-Cookie` strings so expiry survives restarts.
pub struct FileCookieJar {
    file: JsonFile,
}

impl FileCookieJar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { file: JsonFile::new(path.into()) }
    }

    /// Parsed cookie with attributes, if present and unexpired.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        let raw = self.file.read(name)?;
        match Cookie::parse(raw) {
            Ok(cookie) if !is_expired(&cookie) => Some(cookie),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, name, "discarding unparsable stored cookie");
                None
            }
        }
    }
}

impl CookieJar for FileCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.cookie(name).map(|cookie| cookie.value().to_owned())
    }

    fn set(&self, name: &str, value: &str, ttl_days: i64) -> Result<(), StoreError> {
        let cookie = mirror_cookie(name, value, ttl_days).to_string();
        self.file.update(|map| {
            map.insert(name.to_owned(), cookie);
        })
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        self.file.update(|map| {
            map.remove(name);
        })
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;
