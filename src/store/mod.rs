//! The locator-addressed resource store.
//!
//! A [`ResourceStore`] owns a private working directory holding the unpacked
//! contents of an archive (or nothing, for a freshly created store) and
//! presents it as a typed key/value store:
//!
//! ```text
//! open / create ──► working directory (TempDir)
//!     │                  │
//!     │   exists/delete/list      plain filesystem entries
//!     │   image/set_image        via the image codec
//!     │   properties/property    line-oriented key=value text
//!     │   number/set_number      properties + number forms
//!     │   xml_document           via the XML codec
//!     │   read/write_data_map    JSON documents through the convert engine
//!     │                  │
//!     ├── save ──► archive bytes at a destination path
//!     └── close ──► working directory deleted; store unusable
//! ```
//!
//! # Lifecycle
//!
//! Open → Closed, terminal. Every operation except `close` fails with
//! [`StoreError::Closed`] once closed; `close` itself is idempotent.
//!
//! # Concurrency
//!
//! One exclusive mutex per instance serializes every accessor for its whole
//! call, so read-modify-write sequences (the create-on-miss accessors) are
//! atomic and two racing creators produce exactly one resource. Internal
//! helpers borrow the locked state and never re-acquire the lock. Stores
//! over different working directories do not contend.

mod builder;
mod locator;
mod properties;

pub use builder::StoreBuilder;
pub use locator::{Locator, LocatorError};
pub use properties::PropertyMap;

use std::fs;
use std::io::Cursor;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use image::{DynamicImage, ImageFormat};
use parking_lot::Mutex;
use tempfile::TempDir;
use tracing::debug;
use walkdir::WalkDir;
use xmltree::Element;

use self::properties::{format_number, parse_number};
use crate::archive::{ArchiveCodec, ZipCodec};
use crate::convert::{self, Document};
use crate::error::{StoreError, StoreResult};
use crate::value::{Value, ValueMap};

// =============================================================================
// ResourceStore
// =============================================================================

/// A typed resource store backed by an unpacked archive.
///
/// # Example
///
/// ```ignore
/// use zipstore::{Locator, ResourceStore, Value, ValueMap};
///
/// let store = ResourceStore::create()?;
/// let loc: Locator = "data/config.json".parse()?;
///
/// let mut map = ValueMap::new();
/// map.insert("greeting".into(), Value::from("hello"));
/// store.write_data_map(&loc, &map)?;
///
/// store.save(std::path::Path::new("out.zip"))?;
/// store.close()?;
/// ```
pub struct ResourceStore<C = ZipCodec> {
    codec: C,
    indent_unit: String,
    state: Mutex<State>,
}

/// Mutex-guarded store state. `workdir` is `None` once closed.
struct State {
    workdir: Option<TempDir>,
}

impl State {
    fn root(&self) -> StoreResult<&Path> {
        self.workdir
            .as_ref()
            .map(TempDir::path)
            .ok_or(StoreError::Closed)
    }
}

impl ResourceStore<ZipCodec> {
    /// Open a zip archive file.
    pub fn open(archive: &Path) -> StoreResult<Self> {
        StoreBuilder::new().open(archive)
    }

    /// Open a zip archive already held in memory.
    pub fn open_bytes(archive: &[u8]) -> StoreResult<Self> {
        StoreBuilder::new().open_bytes(archive)
    }

    /// Start an empty store.
    pub fn create() -> StoreResult<Self> {
        StoreBuilder::new().create()
    }

    /// Builder for custom codec, event sink, temp location or indentation.
    pub fn builder() -> StoreBuilder<ZipCodec> {
        StoreBuilder::new()
    }
}

impl<C: ArchiveCodec> ResourceStore<C> {
    pub(crate) fn from_parts(codec: C, indent_unit: String, workdir: TempDir) -> Self {
        debug!(workdir = %workdir.path().display(), "store opened");
        Self {
            codec,
            indent_unit,
            state: Mutex::new(State { workdir: Some(workdir) }),
        }
    }

    // =========================================================================
    // Plain resources
    // =========================================================================

    /// Whether a resource is present at `locator`.
    pub fn exists(&self, locator: &Locator) -> StoreResult<bool> {
        let state = self.state.lock();
        Ok(locator.to_native_path(state.root()?).exists())
    }

    /// Remove the resource at `locator`, returning whether it existed.
    ///
    /// Removing a directory removes everything under it. Absent resources
    /// are a no-op, not an error.
    pub fn delete(&self, locator: &Locator) -> StoreResult<bool> {
        let state = self.state.lock();
        let path = locator.to_native_path(state.root()?);
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else if path.exists() {
            fs::remove_file(&path)?;
        } else {
            return Ok(false);
        }
        debug!(%locator, "deleted resource");
        Ok(true)
    }

    /// Enumerate resources under `prefix` (the whole store when `None`).
    ///
    /// Directories are listed only when `include_directories` is set;
    /// `recursive` descends into subdirectories. Ordering is not guaranteed
    /// stable. A missing prefix directory yields an empty list.
    pub fn list(
        &self,
        prefix: Option<&Locator>,
        include_directories: bool,
        recursive: bool,
    ) -> StoreResult<Vec<Locator>> {
        let state = self.state.lock();
        let root = state.root()?;
        let base = match prefix {
            Some(locator) => locator.to_native_path(root),
            None => root.to_path_buf(),
        };
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let mut walker = WalkDir::new(&base).min_depth(1);
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut found = Vec::new();
        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_dir() && !include_directories {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(root) else {
                continue;
            };
            found.push(Locator::from_relative_path(rel)?);
        }
        Ok(found)
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// Get the image stored at `locator`, or `None` if absent.
    pub fn image(&self, locator: &Locator) -> StoreResult<Option<DynamicImage>> {
        self.image_or_create(locator, || None)
    }

    /// Get the image stored at `locator`, creating it on miss.
    ///
    /// On miss the callback runs once; if it yields an image, the image is
    /// persisted at `locator`, encoded in the format inferred from the
    /// locator's extension (defaulting to png), and returned. A callback
    /// yielding `None` writes nothing.
    pub fn image_or_create<F>(&self, locator: &Locator, create: F) -> StoreResult<Option<DynamicImage>>
    where
        F: FnOnce() -> Option<DynamicImage>,
    {
        let state = self.state.lock();
        let path = locator.to_native_path(state.root()?);
        if path.is_file() {
            let bytes = fs::read(&path)?;
            return Ok(Some(image::load_from_memory(&bytes)?));
        }
        match create() {
            Some(image) => {
                write_image(&path, locator, &image)?;
                debug!(%locator, "created image resource");
                Ok(Some(image))
            }
            None => Ok(None),
        }
    }

    /// Store an image at `locator`, replacing any previous resource.
    pub fn set_image(&self, locator: &Locator, image: &DynamicImage) -> StoreResult<()> {
        let state = self.state.lock();
        let path = locator.to_native_path(state.root()?);
        write_image(&path, locator, image)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Load the properties resource at `locator`, or `None` if absent.
    pub fn properties(&self, locator: &Locator) -> StoreResult<Option<PropertyMap>> {
        let state = self.state.lock();
        let path = locator.to_native_path(state.root()?);
        load_properties(&path)
    }

    /// Load the properties resource at `locator`, filling in `defaults`.
    ///
    /// Keys present in `defaults` but missing from the stored set are
    /// inserted and the resource rewritten. An absent resource is created
    /// containing exactly the defaults, with a creation-timestamp comment.
    pub fn properties_or_defaults(
        &self,
        locator: &Locator,
        defaults: &PropertyMap,
    ) -> StoreResult<PropertyMap> {
        let state = self.state.lock();
        let path = locator.to_native_path(state.root()?);
        match load_properties(&path)? {
            Some(mut props) => {
                let mut dirty = false;
                for (key, value) in defaults {
                    if !props.contains_key(key) {
                        props.insert(key.clone(), value.clone());
                        dirty = true;
                    }
                }
                if dirty {
                    store_properties(&path, &props, None)?;
                }
                Ok(props)
            }
            None => {
                store_properties(&path, defaults, Some(&creation_comment()))?;
                debug!(%locator, "created properties resource");
                Ok(defaults.clone())
            }
        }
    }

    /// Get one property, setting and persisting `default` on miss.
    pub fn property(&self, locator: &Locator, key: &str, default: &str) -> StoreResult<String> {
        let state = self.state.lock();
        let path = locator.to_native_path(state.root()?);
        property_or_insert(&path, key, default)
    }

    /// Set one property, creating the resource as needed.
    pub fn set_property(&self, locator: &Locator, key: &str, value: &str) -> StoreResult<()> {
        let state = self.state.lock();
        let path = locator.to_native_path(state.root()?);
        let existing = load_properties(&path)?;
        let comment = existing.is_none().then(creation_comment);
        let mut props = existing.unwrap_or_default();
        props.insert(key.to_string(), value.to_string());
        store_properties(&path, &props, comment.as_deref())
    }

    /// Whether the properties resource at `locator` defines `key`.
    pub fn has_property(&self, locator: &Locator, key: &str) -> StoreResult<bool> {
        let state = self.state.lock();
        let path = locator.to_native_path(state.root()?);
        Ok(load_properties(&path)?.is_some_and(|props| props.contains_key(key)))
    }

    /// Get one property as a number, setting and persisting `default` on miss.
    ///
    /// Returns [`Value::Int`] or [`Value::Float`] depending on the stored
    /// text (see [`PropertyMap`] number forms: `inf`, `-inf`, `nan`, and
    /// `.`-detection). `default` must itself be numeric.
    pub fn number(&self, locator: &Locator, key: &str, default: &Value) -> StoreResult<Value> {
        let default_text = format_number(default).ok_or_else(|| StoreError::NonNumericValue {
            key: key.to_string(),
            kind: default.kind(),
        })?;

        let state = self.state.lock();
        let path = locator.to_native_path(state.root()?);
        let text = property_or_insert(&path, key, &default_text)?;
        parse_number(&text).ok_or_else(|| StoreError::InvalidNumber {
            locator: locator.clone(),
            key: key.to_string(),
            text,
        })
    }

    /// Set one property from a numeric [`Value`].
    pub fn set_number(&self, locator: &Locator, key: &str, value: &Value) -> StoreResult<()> {
        let text = format_number(value).ok_or_else(|| StoreError::NonNumericValue {
            key: key.to_string(),
            kind: value.kind(),
        })?;

        let state = self.state.lock();
        let path = locator.to_native_path(state.root()?);
        let existing = load_properties(&path)?;
        let comment = existing.is_none().then(creation_comment);
        let mut props = existing.unwrap_or_default();
        props.insert(key.to_string(), text);
        store_properties(&path, &props, comment.as_deref())
    }

    /// Whether the properties resource at `locator` defines `key`.
    pub fn has_number(&self, locator: &Locator, key: &str) -> StoreResult<bool> {
        self.has_property(locator, key)
    }

    // =========================================================================
    // XML documents
    // =========================================================================

    /// Get the XML document stored at `locator`, or `None` if absent.
    pub fn xml_document(&self, locator: &Locator) -> StoreResult<Option<Element>> {
        self.xml_or_create(locator, || None)
    }

    /// Get the XML document stored at `locator`, creating it on miss.
    ///
    /// Symmetric to [`image_or_create`](Self::image_or_create): the callback
    /// runs once on miss, and a yielded document is serialized and persisted
    /// before being returned.
    pub fn xml_or_create<F>(&self, locator: &Locator, create: F) -> StoreResult<Option<Element>>
    where
        F: FnOnce() -> Option<Element>,
    {
        let state = self.state.lock();
        let path = locator.to_native_path(state.root()?);
        if path.is_file() {
            let bytes = fs::read(&path)?;
            return Ok(Some(Element::parse(bytes.as_slice())?));
        }
        match create() {
            Some(document) => {
                create_parent_dirs(&path)?;
                let mut buf = Vec::new();
                document.write(&mut buf)?;
                fs::write(&path, buf)?;
                debug!(%locator, "created XML resource");
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    // =========================================================================
    // Data maps
    // =========================================================================

    /// Load the JSON resource at `locator` and convert it into a mapping.
    ///
    /// Unlike the other accessors this one promises a mapping: a missing
    /// resource is [`StoreError::NotFound`], not `None`.
    pub fn read_data_map(&self, locator: &Locator) -> StoreResult<ValueMap> {
        let state = self.state.lock();
        let path = locator.to_native_path(state.root()?);
        if !path.is_file() {
            return Err(StoreError::NotFound(locator.clone()));
        }
        let text = fs::read_to_string(&path)?;
        let document: Document = serde_json::from_str(&text)?;
        Ok(convert::to_mapping(&document)?)
    }

    /// Convert a mapping and persist it as indented JSON text at `locator`.
    pub fn write_data_map(&self, locator: &Locator, map: &ValueMap) -> StoreResult<()> {
        let document = convert::to_document(map)?;
        let compact = serde_json::to_string(&document)?;

        let state = self.state.lock();
        let path = locator.to_native_path(state.root()?);
        create_parent_dirs(&path)?;
        fs::write(&path, convert::indent_document(&compact, &self.indent_unit))?;
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Pack the working directory and write the archive to `destination`.
    ///
    /// Repeatable; does not alter the store.
    pub fn save(&self, destination: &Path) -> StoreResult<()> {
        let state = self.state.lock();
        let bytes = self.codec.pack(state.root()?)?;
        fs::write(destination, &bytes)?;
        debug!(dest = %destination.display(), bytes = bytes.len(), "saved archive");
        Ok(())
    }

    /// Close the store and delete its working directory.
    ///
    /// Changes are *not* saved implicitly; call [`save`](Self::save) first.
    /// Closing twice is a no-op; every other operation on a closed store
    /// fails with [`StoreError::Closed`].
    pub fn close(&self) -> StoreResult<()> {
        let mut state = self.state.lock();
        if let Some(workdir) = state.workdir.take() {
            debug!(workdir = %workdir.path().display(), "store closed");
            workdir.close()?;
        }
        Ok(())
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().workdir.is_none()
    }
}

// =============================================================================
// Locked-state helpers
// =============================================================================
//
// Free functions over already-resolved paths: callers hold the instance lock,
// so nothing here may touch the mutex again.

fn create_parent_dirs(path: &Path) -> StoreResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn write_image(path: &Path, locator: &Locator, image: &DynamicImage) -> StoreResult<()> {
    let format = locator
        .extension()
        .and_then(ImageFormat::from_extension)
        .unwrap_or(ImageFormat::Png);
    create_parent_dirs(path)?;
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format)?;
    fs::write(path, buf.into_inner())?;
    Ok(())
}

fn load_properties(path: &Path) -> StoreResult<Option<PropertyMap>> {
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Some(properties::parse(&fs::read_to_string(path)?)))
}

fn store_properties(path: &Path, props: &PropertyMap, comment: Option<&str>) -> StoreResult<()> {
    create_parent_dirs(path)?;
    fs::write(path, properties::serialize(props, comment))?;
    Ok(())
}

fn property_or_insert(path: &Path, key: &str, default: &str) -> StoreResult<String> {
    let existing = load_properties(path)?;
    let comment = existing.is_none().then(creation_comment);
    let mut props = existing.unwrap_or_default();
    if let Some(value) = props.get(key) {
        return Ok(value.clone());
    }
    props.insert(key.to_string(), default.to_string());
    store_properties(path, &props, comment.as_deref())?;
    Ok(default.to_string())
}

fn creation_comment() -> String {
    format!("created {}", Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
}

// =============================================================================
// Tests
// =============================================================================
