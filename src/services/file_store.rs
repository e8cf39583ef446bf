//! File Store for Chrome Collect.
//!
//! Owns the on-disk snapshot tree `pages/<host>/<stem>.html|.png` under the
//! data root. Paths handed to the database are relative to that root and use
//! forward slashes on every host; absolute paths are only built for I/O.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use reqwest::Url;
use tracing::debug;

use crate::types::errors::FileStoreError;

/// Directory under the data root holding per-host snapshot folders.
pub const PAGES_DIR: &str = "pages";
/// Stem used when a name sanitizes to nothing.
pub const FALLBACK_NAME: &str = "untitled";
/// Host folder for URLs without a parsable host.
pub const UNKNOWN_DOMAIN: &str = "unknown";
/// Stem length used when a caller passes zero.
pub const DEFAULT_NAME_LEN: usize = 80;
/// Byte ceiling on a stem, leaving room for a `_N` suffix and extension
/// under the common 255-byte file name limit.
pub const MAX_STEM_BYTES: usize = 200;

fn is_illegal(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

/// Turns an arbitrary title into a portable file stem.
///
/// Illegal characters become `_`, runs of `_` collapse to one, leading and
/// trailing dots and spaces are dropped, and the result is cut to `max_len`
/// characters (never bytes), then to at most [`MAX_STEM_BYTES`] on a character
/// boundary. Never returns an empty string.
pub fn sanitize_name(raw: &str, max_len: usize) -> String {
    let max_len = if max_len == 0 { DEFAULT_NAME_LEN } else { max_len };

    let mut safe = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if is_illegal(c) { '_' } else { c };
        if c == '_' && safe.ends_with('_') {
            continue;
        }
        safe.push(c);
    }

    let trimmed = safe.trim_matches(|c| c == '.' || c == ' ');
    let mut truncated: String = trimmed.chars().take(max_len).collect();
    while truncated.len() > MAX_STEM_BYTES {
        truncated.pop();
    }
    // Truncation can expose a trailing dot or space.
    let result = truncated.trim_matches(|c| c == '.' || c == ' ');

    if result.is_empty() {
        FALLBACK_NAME.chars().take(max_len).collect()
    } else {
        result.to_string()
    }
}

/// Host exactly as written in the URL, without userinfo, port or brackets.
fn raw_host(raw_url: &str) -> Option<&str> {
    let rest = raw_url.trim().split_once("://")?.1;
    let authority = rest.split(['/', '?', '#', '\\']).next()?;
    let host_port = authority.rsplit('@').next()?;
    match host_port.strip_prefix('[') {
        Some(v6) => v6.split(']').next(),
        None => Some(host_port.rsplit_once(':').map_or(host_port, |(host, _)| host)),
    }
}

/// Host folder name for a captured URL.
///
/// The host is kept as the URL spells it, without case folding or punycode.
pub fn domain_of(raw_url: &str) -> String {
    let parsed = match Url::parse(raw_url) {
        Ok(u) if u.host_str().is_some() => u,
        _ => return UNKNOWN_DOMAIN.to_string(),
    };
    let host = raw_host(raw_url)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .or_else(|| {
            parsed
                .host_str()
                .map(|h| h.trim_matches(|c| c == '[' || c == ']').to_string())
        })
        .unwrap_or_default();
    if host.is_empty() {
        return UNKNOWN_DOMAIN.to_string();
    }
    // IPv6 literals carry ':' which is illegal in Windows folder names.
    sanitize_name(&host, 255)
}

/// Filesystem operations scoped to one data root.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.root.join(PAGES_DIR)
    }

    /// Creates the data root and `pages/` if missing.
    pub fn ensure_layout(&self) -> Result<(), FileStoreError> {
        self.ensure_dir(&self.pages_dir())
    }

    /// Returns `pages/<domain>`, creating it if needed.
    pub fn domain_dir(&self, domain: &str) -> Result<PathBuf, FileStoreError> {
        let dir = self.pages_dir().join(domain);
        self.ensure_dir(&dir)?;
        Ok(dir)
    }

    pub fn ensure_dir(&self, dir: &Path) -> Result<(), FileStoreError> {
        fs::create_dir_all(dir).map_err(|e| io_error(dir, e))
    }

    /// Returns `dir/base.ext`, or `dir/base_N.ext` for the first free N.
    ///
    /// Only checks existence; two processes racing on the same name can collide.
    pub fn unique_path(&self, dir: &Path, base: &str, ext: &str) -> PathBuf {
        let mut path = dir.join(format!("{}{}", base, ext));
        let mut counter = 1u32;
        while path.exists() {
            path = dir.join(format!("{}_{}{}", base, counter, ext));
            counter += 1;
        }
        path
    }

    pub fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), FileStoreError> {
        fs::write(path, bytes).map_err(|e| io_error(path, e))
    }

    pub fn read(&self, path: &Path) -> Result<Vec<u8>, FileStoreError> {
        fs::read(path).map_err(|e| io_error(path, e))
    }

    /// Deletes a file. A file that is already gone counts as deleted.
    pub fn remove(&self, path: &Path) -> Result<(), FileStoreError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(path, e)),
        }
    }

    /// Moves a file, falling back to copy + delete across devices.
    pub fn move_file(&self, from: &Path, to: &Path) -> Result<(), FileStoreError> {
        if fs::rename(from, to).is_ok() {
            return Ok(());
        }
        fs::copy(from, to).map_err(|e| io_error(from, e))?;
        self.remove(from)
    }

    /// Removes `dir` only if it has no entries. Returns whether it was removed.
    pub fn prune_if_empty(&self, dir: &Path) -> bool {
        let empty = match fs::read_dir(dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => false,
        };
        if !empty {
            return false;
        }
        match fs::remove_dir(dir) {
            Ok(()) => {
                debug!(dir = %dir.display(), "Pruned empty snapshot directory");
                true
            }
            Err(_) => false,
        }
    }

    /// Expresses an absolute path under the root in stored (forward-slash) form.
    pub fn to_relative(&self, abs: &Path) -> Result<String, FileStoreError> {
        let rel = abs
            .strip_prefix(&self.root)
            .map_err(|_| FileStoreError::InvalidPath(abs.display().to_string()))?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Ok(parts.join("/"))
    }

    /// Resolves a stored relative path under the root.
    ///
    /// Rejects empty paths and anything that could leave the root (`..`, absolute paths).
    pub fn to_absolute(&self, relative: &str) -> Result<PathBuf, FileStoreError> {
        if relative.is_empty() {
            return Err(FileStoreError::InvalidPath(relative.to_string()));
        }
        let mut abs = self.root.clone();
        for part in relative.split('/') {
            let mut components = Path::new(part).components();
            match (components.next(), components.next()) {
                (None, _) => continue,
                (Some(Component::Normal(seg)), None) => abs.push(seg),
                _ => return Err(FileStoreError::InvalidPath(relative.to_string())),
            }
        }
        Ok(abs)
    }
}

fn io_error(path: &Path, e: std::io::Error) -> FileStoreError {
    if e.kind() == ErrorKind::NotFound {
        FileStoreError::NotFound(path.display().to_string())
    } else {
        FileStoreError::IoError(format!("{}: {}", path.display(), e))
    }
}
