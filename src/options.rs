//! Resource limits for rule validation.
//!
//! [`RuleOptions`] bounds everything a hostile document could use to exhaust
//! memory: array lengths, identifier lengths, nesting depth and object counts.
//! Configuration fills in the gaps: any field left at zero takes its default.
//!
//! ## Examples
//!
//! ```rust
//! use concise_encoding::RuleOptions;
//!
//! let options = RuleOptions::new()
//!     .with_max_container_depth(16)
//!     .with_max_string_length(4096);
//!
//! let applied = options.applied_defaults();
//! assert_eq!(applied.max_container_depth, 16);
//! assert_eq!(applied.max_id_length, RuleOptions::DEFAULT_MAX_ID_LENGTH);
//! ```
//!
//! Limits can also be loaded from any serde format; missing fields stay zero
//! and are defaulted when the rules are built.

use serde::{Deserialize, Serialize};

/// The Concise Encoding version this crate validates by default.
pub const CONCISE_ENCODING_VERSION: u64 = 1;

/// Limits and the expected document version for a [`Rules`](crate::Rules) instance.
///
/// A value of `0` in any field means "use the default".
///
/// # Examples
///
/// ```rust
/// use concise_encoding::RuleOptions;
///
/// let options: RuleOptions = Default::default();
/// assert_eq!(options.max_object_count, 0);
/// assert_eq!(options.applied_defaults().max_object_count, 10_000_000);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOptions {
    pub max_bytes_length: usize,
    pub max_string_length: usize,
    pub max_uri_length: usize,
    pub max_id_length: usize,
    pub max_markup_name_length: usize,
    /// User-visible nesting depth; the rules reserve two more levels internally.
    pub max_container_depth: usize,
    pub max_object_count: u64,
    pub max_reference_count: u64,
    pub version: u64,
}

impl RuleOptions {
    pub const DEFAULT_MAX_BYTES_LENGTH: usize = 1_000_000_000;
    pub const DEFAULT_MAX_STRING_LENGTH: usize = 100_000_000;
    pub const DEFAULT_MAX_URI_LENGTH: usize = 10_000;
    pub const DEFAULT_MAX_ID_LENGTH: usize = 100;
    pub const DEFAULT_MAX_MARKUP_NAME_LENGTH: usize = 100;
    pub const DEFAULT_MAX_CONTAINER_DEPTH: usize = 1000;
    pub const DEFAULT_MAX_OBJECT_COUNT: u64 = 10_000_000;
    pub const DEFAULT_MAX_REFERENCE_COUNT: u64 = 100_000;

    /// Creates options with every field unset (all defaults).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with every zero field replaced by its default.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use concise_encoding::{RuleOptions, CONCISE_ENCODING_VERSION};
    ///
    /// let options = RuleOptions::new().with_max_id_length(8).applied_defaults();
    /// assert_eq!(options.max_id_length, 8);
    /// assert_eq!(options.version, CONCISE_ENCODING_VERSION);
    /// ```
    #[must_use]
    pub fn applied_defaults(&self) -> Self {
        fn or<T: PartialEq + Default>(value: T, default: T) -> T {
            if value == T::default() {
                default
            } else {
                value
            }
        }

        RuleOptions {
            max_bytes_length: or(self.max_bytes_length, Self::DEFAULT_MAX_BYTES_LENGTH),
            max_string_length: or(self.max_string_length, Self::DEFAULT_MAX_STRING_LENGTH),
            max_uri_length: or(self.max_uri_length, Self::DEFAULT_MAX_URI_LENGTH),
            max_id_length: or(self.max_id_length, Self::DEFAULT_MAX_ID_LENGTH),
            max_markup_name_length: or(
                self.max_markup_name_length,
                Self::DEFAULT_MAX_MARKUP_NAME_LENGTH,
            ),
            max_container_depth: or(
                self.max_container_depth,
                Self::DEFAULT_MAX_CONTAINER_DEPTH,
            ),
            max_object_count: or(self.max_object_count, Self::DEFAULT_MAX_OBJECT_COUNT),
            max_reference_count: or(
                self.max_reference_count,
                Self::DEFAULT_MAX_REFERENCE_COUNT,
            ),
            version: or(self.version, CONCISE_ENCODING_VERSION),
        }
    }

    #[must_use]
    pub fn with_max_bytes_length(mut self, max: usize) -> Self {
        self.max_bytes_length = max;
        self
    }

    #[must_use]
    pub fn with_max_string_length(mut self, max: usize) -> Self {
        self.max_string_length = max;
        self
    }

    #[must_use]
    pub fn with_max_uri_length(mut self, max: usize) -> Self {
        self.max_uri_length = max;
        self
    }

    /// Sets the maximum length in bytes of a string marker or reference ID.
    #[must_use]
    pub fn with_max_id_length(mut self, max: usize) -> Self {
        self.max_id_length = max;
        self
    }

    #[must_use]
    pub fn with_max_markup_name_length(mut self, max: usize) -> Self {
        self.max_markup_name_length = max;
        self
    }

    /// Sets how many containers may be nested inside one another.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use concise_encoding::{Event, RuleOptions, validate_events_with_options};
    ///
    /// let options = RuleOptions::new().with_max_container_depth(1);
    /// let nested = [
    ///     Event::Version(1), Event::List, Event::List, Event::End, Event::End,
    ///     Event::EndDocument,
    /// ];
    /// assert!(validate_events_with_options(&nested, options).is_err());
    /// ```
    #[must_use]
    pub fn with_max_container_depth(mut self, max: usize) -> Self {
        self.max_container_depth = max;
        self
    }

    #[must_use]
    pub fn with_max_object_count(mut self, max: u64) -> Self {
        self.max_object_count = max;
        self
    }

    /// Sets the maximum number of markers a document may define.
    #[must_use]
    pub fn with_max_reference_count(mut self, max: u64) -> Self {
        self.max_reference_count = max;
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }
}
