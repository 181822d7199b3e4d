//! # concise_encoding
//!
//! Grammar rules and a dynamic value layer for Concise Encoding documents.
//!
//! ## What is Concise Encoding?
//!
//! Concise Encoding is a data format with two interchangeable renderings: a
//! compact binary form and a human-editable text form. Both describe the same
//! document structure: a version, one top-level object, and an end marker.
//! Objects include scalars, chunked arrays, lists, maps, markup, metadata,
//! comments, and markers and references for recursive or shared data.
//!
//! This crate does not read or write either rendering. It works on the event
//! stream that sits between a decoder and whatever consumes the document.
//!
//! ## Key Features
//!
//! - **Single-pass validation**: [`Rules`] checks every event against the
//!   grammar as it arrives, with no lookahead and no rescanning
//! - **Chunked arrays**: strings and byte arrays may arrive split into any
//!   number of chunks and data events, validated as they stream
//! - **Configurable limits**: array lengths, nesting depth, object and
//!   reference counts, all set through [`RuleOptions`]
//! - **Markers and references**: IDs are checked for duplicates and
//!   resolved, and references must be legal where they appear
//! - **Dynamic values**: [`Value`] trees can be built from events and emitted
//!   back as events
//!
//! ## Quick Start
//!
//! ### Validating a Document
//!
//! ```rust
//! use concise_encoding::{validate_events, Event, ArrayType};
//!
//! let events = vec![
//!     Event::Version(1),
//!     Event::Map,
//!     Event::ArrayBegin(ArrayType::String),
//!     Event::ArrayChunk { length: 4, is_final: true },
//!     Event::ArrayData(b"name".to_vec()),
//!     Event::Bool(true),
//!     Event::End,
//!     Event::EndDocument,
//! ];
//! assert!(validate_events(&events).is_ok());
//! ```
//!
//! ### Driving the Rules Directly
//!
//! ```rust
//! use concise_encoding::{EventReceiver, NullReceiver, RuleOptions, Rules};
//!
//! let mut rules = Rules::new(NullReceiver, RuleOptions::default());
//! rules.on_version(1).unwrap();
//! rules.on_list().unwrap();
//! rules.on_int(-3).unwrap();
//! // A list cannot be closed twice.
//! rules.on_end().unwrap();
//! assert!(rules.on_end().is_err());
//! ```
//!
//! ### Building Values
//!
//! ```rust
//! use concise_encoding::{from_events, to_events, Key, Value, ValueMap};
//!
//! let value = Value::from(ValueMap::from([
//!     (Key::from("id"), Value::from(42)),
//!     (Key::from("tags"), Value::from(vec![Value::from("a"), Value::from("b")])),
//! ]));
//!
//! let events = to_events(&value).unwrap();
//! assert_eq!(from_events(&events).unwrap(), value);
//! ```
//!
//! ## Examples
//!
//! See the `demos/` directory:
//!
//! - **`validate.rs`** - Validating well-formed and malformed event streams
//! - **`values.rs`** - Building a value tree with markers and references
//!
//! Run either with: `cargo run --example <name>`

mod arrays;
pub mod error;
pub mod events;
pub mod ids;
pub mod map;
pub mod options;
pub mod rules;
pub mod states;
pub mod value;

pub use error::{Error, Result};
pub use events::{ArrayType, Event, EventReceiver, EventRecorder, NullReceiver, Time};
pub use ids::Identifier;
pub use map::ValueMap;
pub use options::{RuleOptions, CONCISE_ENCODING_VERSION};
pub use rules::Rules;
pub use states::{CategorySet, DataType, RuleState, StateId};
pub use value::{Key, Value, ValueBuilder};

/// Replays `events` through [`Rules`] with default options.
///
/// The stream need not be a whole document; include
/// [`Event::EndDocument`] to also check that everything was closed.
///
/// # Errors
///
/// Returns the error for the first event that breaks the grammar or a limit.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn validate_events(events: &[Event]) -> Result<()> {
    validate_events_with_options(events, RuleOptions::default())
}

/// Replays `events` through [`Rules`] with custom options.
///
/// # Examples
///
/// ```rust
/// use concise_encoding::{validate_events_with_options, Error, Event, RuleOptions};
///
/// let options = RuleOptions::new().with_max_object_count(2);
/// let events = [
///     Event::Version(1), Event::List, Event::Nil, Event::Nil, Event::End,
///     Event::EndDocument,
/// ];
/// assert_eq!(
///     validate_events_with_options(&events, options),
///     Err(Error::ObjectCountExceeded { max: 2 })
/// );
/// ```
///
/// # Errors
///
/// Returns the error for the first event that breaks the grammar or a limit.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn validate_events_with_options(events: &[Event], options: RuleOptions) -> Result<()> {
    let mut rules = Rules::new(NullReceiver, options);
    for event in events {
        event.dispatch(&mut rules)?;
    }
    Ok(())
}

/// Builds a [`Value`] from a validated event stream.
///
/// # Errors
///
/// Returns an error if the events break the grammar or do not contain a
/// complete top-level object.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_events(events: &[Event]) -> Result<Value> {
    from_events_with_options(events, RuleOptions::default())
}

/// Builds a [`Value`] from a validated event stream with custom options.
///
/// # Errors
///
/// Returns an error if the events break the grammar or do not contain a
/// complete top-level object.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_events_with_options(events: &[Event], options: RuleOptions) -> Result<Value> {
    let mut rules = Rules::new(ValueBuilder::new(), options);
    for event in events {
        event.dispatch(&mut rules)?;
    }
    rules.into_inner().into_value()
}

/// Produces the complete, validated document for `value`.
///
/// The events start with the version and finish with `EndDocument`.
///
/// # Errors
///
/// Returns an error if the value cannot form a legal document, for example a
/// reference to a marker it does not contain.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_events(value: &Value) -> Result<Vec<Event>> {
    to_events_with_options(value, RuleOptions::default())
}

/// Produces the complete, validated document for `value` with custom options.
///
/// # Errors
///
/// Returns an error if the value cannot form a legal document or exceeds a
/// limit in `options`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_events_with_options(value: &Value, options: RuleOptions) -> Result<Vec<Event>> {
    let mut rules = Rules::new(EventRecorder::new(), options);
    let version = rules.options().version;
    rules.on_version(version)?;
    value.emit(&mut rules)?;
    rules.on_end_document()?;
    Ok(rules.into_inner().into_events())
}
