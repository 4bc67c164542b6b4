//! # zipstore
//!
//! A zip-archive-backed typed resource store.
//!
//! A folder, optionally packaged as a zip file, is presented as a
//! locator-addressed store whose values may be strings, numbers, images,
//! XML documents, or arbitrary nested maps serialized as JSON:
//!
//! - **Data maps**: nested [`Value`] mappings round-trip through JSON with
//!   their types intact, timestamps and binary blobs included, via a
//!   key-tagging wire convention ([`convert`])
//! - **Typed accessors**: images, XML documents and properties files with
//!   create-on-miss semantics
//! - **Lifecycle**: open an archive into a private working directory, read
//!   and write resources, `save` any number of times, `close` to clean up
//! - **Concurrency**: one lock per store; safe to share across threads
//!
//! ## Quick Start
//!
//! ```ignore
//! use zipstore::{Locator, ResourceStore, Value, ValueMap};
//!
//! // Start an empty store (or ResourceStore::open(..) for an existing
//! // archive file).
//! let store = ResourceStore::create()?;
//!
//! let loc: Locator = "player/profile.json".parse()?;
//! let mut profile = ValueMap::new();
//! profile.insert("name".into(), Value::from("Ada"));
//! profile.insert("joined".into(), Value::Timestamp(chrono::Utc::now()));
//! store.write_data_map(&loc, &profile)?;
//!
//! store.save(std::path::Path::new("save.dat"))?;
//! store.close()?;
//! ```
//!
//! ## Wire contract
//!
//! Stored JSON documents tag timestamp and binary entries by key suffix
//! (`@ISOtime`, `@base64`) so that external consumers can read them
//! directly; see [`convert`] for the exact profiles.
//!
//! ## Modules
//!
//! - [`convert`]: the mapping ⇄ JSON document engine
//! - [`archive`]: the [`ArchiveCodec`] seam and the zip implementation
//! - [`store`]: the [`ResourceStore`] itself

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod archive;
pub mod convert;
pub mod error;
pub mod store;
pub mod value;

// =============================================================================
// Prelude - import commonly used items with a single `use`
// =============================================================================

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
///
/// ```ignore
/// use zipstore::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ArchiveCodec, ArchiveEvents, Locator, PropertyMap, ResourceStore, SilentEvents,
        StoreBuilder, StoreError, StoreResult, Value, ValueMap, ZipCodec,
    };
}

// =============================================================================
// The store
// =============================================================================

pub use store::{Locator, LocatorError, PropertyMap, ResourceStore, StoreBuilder};

// =============================================================================
// Values and conversion
// =============================================================================

pub use convert::{
    BINARY_SUFFIX, ConvertError, Document, TIME_SUFFIX, indent_document, to_document, to_mapping,
};
pub use value::{Value, ValueKind, ValueMap};

// =============================================================================
// Archive codec seam
// =============================================================================

pub use archive::{ArchiveCodec, ArchiveError, ArchiveEvents, SilentEvents, ZipCodec};

// =============================================================================
// Errors
// =============================================================================

pub use error::{StoreError, StoreResult};
