//! Error types for rule validation and value building.
//!
//! Every failure is a deterministic validation failure: nothing here is
//! transient or retryable. Once a [`Rules`](crate::Rules) instance has returned
//! an error it must be reset or discarded.
//!
//! ## Error Categories
//!
//! - **Grammar**: an event arrived in a state that does not permit it
//! - **Structure**: depth exceeded, unbalanced `End`, unclosed containers
//! - **Array framing**: chunk overruns, length limits, malformed identifiers
//! - **Identifiers**: duplicate markers, unknown references, bad ID values
//! - **Content**: invalid UTF-8 or disallowed comment characters
//! - **Limits**: object and reference counts
//!
//! ## Examples
//!
//! ```rust
//! use concise_encoding::{validate_events, Error, Event};
//!
//! let events = [Event::Version(1), Event::Map, Event::Bool(true), Event::End];
//! let err = validate_events(&events).unwrap_err();
//! assert!(matches!(err, Error::MissingValue { .. }));
//! ```

use crate::ids::Identifier;
use crate::states::{DataType, StateId};
use crate::ArrayType;
use std::fmt;
use thiserror::Error;

/// Represents every way a Concise Encoding event stream can be rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The event's category is not permitted in the current state
    #[error("{event} is not allowed while {state}")]
    Grammar { event: DataType, state: StateId },

    /// A container was closed while a key was still waiting for its value
    #[error("{state} ended before its value was supplied")]
    MissingValue { state: StateId },

    /// Opening a container would exceed the configured depth
    #[error("maximum container depth of {max} exceeded")]
    DepthExceeded { max: usize },

    /// `End` arrived with no open container to close
    #[error("end of container with no open container")]
    UnbalancedEnd,

    /// `EndDocument` arrived with containers still open
    #[error("end of document with {open} container(s) still open")]
    UnclosedContainers { open: usize },

    /// `EndDocument` arrived in the middle of an array
    #[error("end of document inside an unterminated {kind} array")]
    UnterminatedArray { kind: ArrayType },

    /// Data events overran the length declared by the chunk header
    #[error("array data of {length} bytes exceeds the chunk's remaining {remaining} bytes")]
    ChunkLengthExceeded { length: usize, remaining: usize },

    /// Cumulative array length exceeds the configured maximum for its kind
    #[error("{kind} length of {length} exceeds maximum of {max}")]
    ArrayLengthExceeded {
        kind: ArrayType,
        length: usize,
        max: usize,
    },

    /// A string identifier exceeds `max_id_length`
    #[error("identifier length of {length} exceeds maximum of {max}")]
    IdentifierLengthExceeded { length: usize, max: usize },

    /// A markup name exceeds `max_markup_name_length`
    #[error("markup name length of {length} exceeds maximum of {max}")]
    MarkupNameLengthExceeded { length: usize, max: usize },

    /// A marker or reference identifier was empty
    #[error("identifier cannot be empty")]
    EmptyIdentifier,

    /// A markup name was empty
    #[error("markup name cannot be empty")]
    EmptyMarkupName,

    /// A URI identifier could not be parsed
    #[error("invalid URI identifier {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    /// A marker identifier was defined twice in one document
    #[error("marker ID {0} has already been defined")]
    DuplicateMarker(Identifier),

    /// A reference named a marker that has not been defined
    #[error("reference to undefined marker ID {0}")]
    UnknownReference(Identifier),

    /// An integer identifier was negative or too wide
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A character that may not appear in its context
    #[error("character U+{:04X} is not allowed in {context}", *character as u32)]
    InvalidCharacter {
        character: char,
        context: &'static str,
    },

    /// String, URI or comment content was not valid UTF-8
    #[error("invalid UTF-8 in {context}")]
    InvalidUtf8 { context: &'static str },

    /// More objects than `max_object_count`
    #[error("object count exceeds maximum of {max}")]
    ObjectCountExceeded { max: u64 },

    /// More markers than `max_reference_count`
    #[error("reference count exceeds maximum of {max}")]
    ReferenceCountExceeded { max: u64 },

    /// The document declared a version other than the expected one
    #[error("document version {found} does not match expected version {expected}")]
    VersionMismatch { expected: u64, found: u64 },

    /// An event arrived after the document had already ended
    #[error("{event} received after end of document")]
    DocumentEnded { event: DataType },

    /// Failure reported by a downstream receiver
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Creates a grammar violation error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use concise_encoding::{DataType, Error, StateId};
    ///
    /// let err = Error::grammar(DataType::List, StateId::AwaitingMapKey);
    /// assert!(err.to_string().contains("list"));
    /// ```
    pub fn grammar(event: DataType, state: StateId) -> Self {
        Error::Grammar { event, state }
    }

    /// Creates an invalid URI error.
    pub fn invalid_uri(uri: &str, reason: impl fmt::Display) -> Self {
        Error::InvalidUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates an invalid identifier error.
    pub fn invalid_identifier(msg: &str) -> Self {
        Error::InvalidIdentifier(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// Receivers use this to report their own failures through the same
    /// error type the rules return.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use concise_encoding::Error;
    ///
    /// let err = Error::custom("disk full");
    /// assert_eq!(err.to_string(), "disk full");
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
