//! Locators: validated relative paths into the store.
//!
//! The same locator namespace addresses every resource kind (directories,
//! properties files, images, JSON documents). Validation happens once, at
//! construction: a [`Locator`] that exists cannot escape the store root, so
//! accessors never have to re-check paths against traversal.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

// =============================================================================
// Locator
// =============================================================================

/// A slash-separated relative path identifying a resource inside the store.
///
/// # Example
///
/// ```ignore
/// use zipstore::Locator;
///
/// let loc: Locator = "images/icons/app.png".parse()?;
/// assert_eq!(loc.extension(), Some("png"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator(String);

impl Locator {
    /// Validate and construct a locator.
    ///
    /// # Errors
    ///
    /// Rejects empty input, absolute paths, backslashes, and any `.`, `..`
    /// or empty segment, so nothing a locator names can sit outside the
    /// store root.
    pub fn new(path: impl Into<String>) -> Result<Self, LocatorError> {
        let path = path.into();
        if path.is_empty() {
            return Err(LocatorError::Empty);
        }
        if path.starts_with('/') {
            return Err(LocatorError::Absolute(path));
        }
        if path.contains('\\') {
            return Err(LocatorError::Backslash(path));
        }
        for segment in path.split('/') {
            if matches!(segment, "" | "." | "..") {
                let bad = segment.to_string();
                return Err(LocatorError::BadSegment { locator: path, segment: bad });
            }
        }
        Ok(Self(path))
    }

    /// The locator as its canonical `/`-separated text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path segments, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// The file-extension suffix of the final segment, if any.
    pub fn extension(&self) -> Option<&str> {
        let name = self.0.rsplit('/').next()?;
        match name.rsplit_once('.') {
            Some(("", _)) => None, // dotfile, not an extension
            Some((_, ext)) if !ext.is_empty() => Some(ext),
            _ => None,
        }
    }

    /// Resolve this locator against a root directory using host separators.
    pub fn to_native_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in self.segments() {
            path.push(segment);
        }
        path
    }

    /// Build a locator from a relative native path (e.g. one produced by a
    /// directory walk under the store root).
    pub(crate) fn from_relative_path(rel: &Path) -> Result<Self, LocatorError> {
        let text = rel
            .iter()
            .map(|seg| seg.to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Self::new(text)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Locator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Locator {
    type Error = LocatorError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

// =============================================================================
// LocatorError
// =============================================================================

/// A locator failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    /// The locator was empty.
    #[error("locator is empty")]
    Empty,

    /// The locator started with `/`.
    #[error("locator `{0}` is absolute")]
    Absolute(String),

    /// The locator contained a backslash; locators use `/` on every host.
    #[error("locator `{0}` contains a backslash")]
    Backslash(String),

    /// The locator contained a `.`, `..` or empty segment.
    #[error("locator `{locator}` contains invalid segment `{segment}`")]
    BadSegment {
        /// The rejected locator.
        locator: String,
        /// The offending segment.
        segment: String,
    },
}
