//! Bidirectional conversion between [`ValueMap`]s and JSON documents.
//!
//! JSON has no native representation for instants or byte sequences, so this
//! module carries them through a key-tagging convention:
//!
//! ```text
//! write:  {"stamp": Timestamp}   →  {"stamp@ISOtime": "2015-07-23T14:34:05.980Z"}
//!         {"icon":  Bytes}       →  {"icon@base64":   "R0lGOD…"}
//! read:   suffix stripped, text parsed back to the original type
//! ```
//!
//! The suffixes apply to scalar values and to homogeneous lists (all-timestamp
//! or all-binary). Stripping on read exactly reverses appending on write, so
//! `to_mapping(to_document(m)) == m` for every supported mapping, and a second
//! round-trip introduces no drift.
//!
//! The tagged JSON form is a wire contract: external consumers read the stored
//! documents directly, so the suffix spellings and the instant/base64 profiles
//! must be reproduced exactly.
//!
//! # Limitations
//!
//! A key that legitimately ends with `@ISOtime` or `@base64` but holds an
//! unrelated value type is not supported: the read side would attempt to parse
//! the value under the tagging convention and fail. Ambiguous by design.

mod decode;
mod encode;
mod indent;
mod scalar;

pub use decode::to_mapping;
pub use encode::to_document;
pub use indent::indent_document;

use thiserror::Error;

use crate::value::ValueKind;

// =============================================================================
// Wire constants
// =============================================================================

/// Suffix appended to the key of an entry holding a timestamp (or a
/// homogeneous list of timestamps).
pub const TIME_SUFFIX: &str = "@ISOtime";

/// Suffix appended to the key of an entry holding binary data (or a
/// homogeneous list of blobs), stored in base64.
pub const BINARY_SUFFIX: &str = "@base64";

/// The JSON-shaped wire form of a mapping.
pub type Document = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// ConvertError
// =============================================================================

/// Error from a mapping ⇄ document conversion.
///
/// Conversion aborts on the first offending entry; any partially built
/// structure is discarded.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A timestamp or blob appeared inside a mixed list, where no key is
    /// available to carry the tagging suffix.
    #[error("cannot store {kind} element in a mixed list at key `{key}`")]
    UnsupportedListElement {
        /// Key of the entry holding the list.
        key: String,
        /// Kind of the offending element.
        kind: ValueKind,
    },

    /// A non-finite float (NaN or infinity) cannot be written as JSON.
    #[error("cannot store non-finite float at key `{key}`")]
    NonFiniteFloat {
        /// Key of the offending entry.
        key: String,
    },

    /// A tagged entry held something other than the expected text.
    #[error("error while parsing entry `{key}`: expected text, found {raw}")]
    ExpectedText {
        /// Key of the offending entry (as stored, with suffix).
        key: String,
        /// Raw JSON encountered.
        raw: String,
    },

    /// Instant text under an `@ISOtime` key did not match the profile.
    #[error("error while parsing entry `{key}`: `{raw}`: {source}")]
    MalformedTimestamp {
        /// Key of the offending entry (as stored, with suffix).
        key: String,
        /// Raw text encountered.
        raw: String,
        /// Underlying parse failure.
        source: chrono::ParseError,
    },

    /// Text under an `@base64` key was not valid base64.
    #[error("error while parsing entry `{key}`: `{raw}`: {source}")]
    MalformedBase64 {
        /// Key of the offending entry (as stored, with suffix).
        key: String,
        /// Raw text encountered.
        raw: String,
        /// Underlying decode failure.
        source: base64::DecodeError,
    },
}

#[cfg(test)]
mod tests;
