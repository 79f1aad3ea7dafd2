//! Resolving a model locator to a readable local file.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, TranslateError};

/// Opens model assets by opaque locator.
pub trait ModelAssetSource: Send + Sync {
    /// Human-readable file name of the asset, used as its cache key.
    fn display_name(&self, locator: &str) -> Option<String>;

    fn open(&self, locator: &str) -> io::Result<Box<dyn Read + Send>>;
}

/// Treats locators as filesystem paths or `file://` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsAssetSource;

impl FsAssetSource {
    fn path_of(locator: &str) -> &Path {
        Path::new(locator.strip_prefix("file://").unwrap_or(locator))
    }
}

impl ModelAssetSource for FsAssetSource {
    fn display_name(&self, locator: &str) -> Option<String> {
        Self::path_of(locator)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    fn open(&self, locator: &str) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(Self::path_of(locator))?))
    }
}

/// Private directory holding copies of model assets, keyed by file name.
#[derive(Debug, Clone)]
pub struct ModelCache {
    dir: PathBuf,
}

impl ModelCache {
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Returns a local path for `locator`, copying the asset in on first use.
    ///
    /// Blocking; run it off the async executor.
    pub fn resolve(&self, source: &dyn ModelAssetSource, locator: &str) -> Result<PathBuf> {
        let name = source
            .display_name(locator)
            .and_then(|name| {
                // Keep only the final component so a name cannot escape the cache.
                Path::new(&name)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                TranslateError::ResourceUnavailable(format!(
                    "cannot determine file name of {locator}"
                ))
            })?;

        let destination = self.dir.join(&name);
        if destination.is_file() {
            return Ok(destination);
        }

        fs::create_dir_all(&self.dir).map_err(|e| {
            TranslateError::ResourceUnavailable(format!(
                "cannot create {}: {e}",
                self.dir.display()
            ))
        })?;

        let mut reader = source.open(locator).map_err(|e| {
            TranslateError::ResourceUnavailable(format!("cannot open {locator}: {e}"))
        })?;

        let copied = crate::fs::atomic_copy(&mut reader, &destination).map_err(|e| {
            TranslateError::ResourceUnavailable(format!(
                "cannot copy to {}: {e}",
                destination.display()
            ))
        })?;

        info!(path = %destination.display(), bytes = copied, "cached on-device model");
        Ok(destination)
    }
}
