//! Store error type.

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::convert::ConvertError;
use crate::store::{Locator, LocatorError};
use crate::value::ValueKind;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for resource store operations.
///
/// Absence is *not* an error for the "get" accessors (they return `None`),
/// so every variant here signals a genuine failure. I/O and codec errors are
/// propagated unchanged, never retried.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store has been closed; no further operations are possible.
    #[error("resource store is closed")]
    Closed,

    /// A resource whose presence the contract requires is missing.
    #[error("resource not found: {0}")]
    NotFound(Locator),

    /// The locator failed validation.
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// Mapping ⇄ document conversion failed.
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// Archive packing or unpacking failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Stored JSON text failed to parse, or a document failed to serialize.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decode or encode failed.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// XML parse failed.
    #[error("XML parse error: {0}")]
    XmlParse(#[from] xmltree::ParseError),

    /// XML serialization failed.
    #[error("XML write error: {0}")]
    XmlWrite(#[from] xmltree::Error),

    /// A stored property was read as a number but does not parse as one.
    #[error("property `{key}` in `{locator}` is not a valid number: `{text}`")]
    InvalidNumber {
        /// Locator of the properties resource.
        locator: Locator,
        /// The property key.
        key: String,
        /// The stored text.
        text: String,
    },

    /// A non-numeric [`crate::Value`] was passed to a numeric accessor.
    #[error("expected a numeric value for property `{key}`, got {kind}")]
    NonNumericValue {
        /// The property key.
        key: String,
        /// Kind of the rejected value.
        kind: ValueKind,
    },

    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
