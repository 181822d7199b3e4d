//! Dynamic value representation for Concise Encoding documents.
//!
//! This module provides the [`Value`] enum, which holds any document object,
//! and [`Key`], the subset of values that may key a map. [`ValueBuilder`]
//! assembles a `Value` from an event stream and [`Value::emit`] turns one back
//! into events.
//!
//! ## Core Types
//!
//! - [`Value`]: nil, bool, integer, float, UUID, time, arrays, containers, markers and references
//! - [`Key`]: a hashable keyable value
//! - [`ValueBuilder`]: an [`EventReceiver`] producing a `Value`
//!
//! ## Usage Patterns
//!
//! ### Creating Values
//!
//! ```rust
//! use concise_encoding::{Key, Value, ValueMap};
//!
//! let list = Value::from(vec![Value::from(1), Value::from("two"), Value::Nil]);
//! let map = Value::from(ValueMap::from([(Key::from("a"), list)]));
//! assert!(map.is_map());
//! ```
//!
//! ### Building From Events
//!
//! ```rust
//! use concise_encoding::{EventReceiver, Value, ValueBuilder};
//!
//! let mut builder = ValueBuilder::new();
//! builder.on_list().unwrap();
//! builder.on_comment().unwrap();
//! builder.on_string("ignored").unwrap();
//! builder.on_end().unwrap();
//! builder.on_int(-5).unwrap();
//! builder.on_end().unwrap();
//!
//! // Comments carry no data and are dropped.
//! assert_eq!(builder.into_value().unwrap(), Value::from(vec![Value::from(-5)]));
//! ```

use crate::ids::Identifier;
use crate::states::StateId;
use crate::{ArrayType, Error, EventReceiver, Result, Time, ValueMap};
use num_bigint::{BigInt, Sign};

/// Any object a document can hold.
///
/// Integers of every width share [`Value::Integer`]; the event form chosen on
/// output depends on magnitude. Comments, metadata and padding have no value
/// representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(BigInt),
    Float(f64),
    Uuid([u8; 16]),
    Time(Time),
    Bytes(Vec<u8>),
    String(String),
    Uri(String),
    Custom(Vec<u8>),
    List(Vec<Value>),
    Map(ValueMap),
    Markup {
        name: Key,
        attributes: ValueMap,
        contents: Vec<Value>,
    },
    Marker {
        id: Identifier,
        value: Box<Value>,
    },
    Reference(Identifier),
}

/// A value that may be used as a map or attribute key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Bool(bool),
    Integer(BigInt),
    Uuid([u8; 16]),
    Time(Time),
    String(String),
    Uri(String),
    Marker { id: Identifier, key: Box<Key> },
    Reference(Identifier),
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_markup(&self) -> bool {
        matches!(self, Value::Markup { .. })
    }

    /// Returns `true` for values that may appear as a map key.
    #[must_use]
    pub fn is_keyable(&self) -> bool {
        match self {
            Value::Bool(_)
            | Value::Integer(_)
            | Value::Uuid(_)
            | Value::Time(_)
            | Value::String(_)
            | Value::Uri(_)
            | Value::Reference(_) => true,
            Value::Marker { value, .. } => value.is_keyable(),
            _ => false,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is an integer that fits in an `i64`, returns it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use concise_encoding::Value;
    ///
    /// assert_eq!(Value::from(-7).as_i64(), Some(-7));
    /// assert_eq!(Value::from(u64::MAX).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => i64::try_from(i).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Integer(i) => u64::try_from(i).ok(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_big_int(&self) -> Option<&BigInt> {
        match self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_uri(&self) -> Option<&str> {
        match self {
            Value::Uri(u) => Some(u),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_time(&self) -> Option<&Time> {
        match self {
            Value::Time(t) => Some(t),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` in a map value.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Sends this value to `receiver` as a sequence of events.
    ///
    /// Integers whose magnitude fits in 64 bits are sent as positive or
    /// negative integer events, wider ones as big integers. NaN floats are
    /// sent as quiet NaN.
    ///
    /// # Errors
    ///
    /// Returns whatever error the receiver reports.
    pub fn emit<R: EventReceiver + ?Sized>(&self, receiver: &mut R) -> Result<()> {
        match self {
            Value::Nil => receiver.on_nil(),
            Value::Bool(b) => receiver.on_bool(*b),
            Value::Integer(i) => emit_integer(i, receiver),
            Value::Float(f) if f.is_nan() => receiver.on_nan(false),
            Value::Float(f) => receiver.on_float(*f),
            Value::Uuid(u) => receiver.on_uuid(*u),
            Value::Time(t) => receiver.on_time(t),
            Value::Bytes(b) => receiver.on_bytes(b),
            Value::String(s) => receiver.on_string(s),
            Value::Uri(u) => receiver.on_uri(u),
            Value::Custom(c) => receiver.on_custom(c),
            Value::List(items) => {
                receiver.on_list()?;
                for item in items {
                    item.emit(receiver)?;
                }
                receiver.on_end()
            }
            Value::Map(map) => {
                receiver.on_map()?;
                emit_entries(map, receiver)?;
                receiver.on_end()
            }
            Value::Markup {
                name,
                attributes,
                contents,
            } => {
                receiver.on_markup()?;
                name.emit(receiver)?;
                emit_entries(attributes, receiver)?;
                receiver.on_end()?;
                for item in contents {
                    item.emit(receiver)?;
                }
                receiver.on_end()
            }
            Value::Marker { id, value } => {
                receiver.on_marker()?;
                emit_identifier(id, receiver)?;
                value.emit(receiver)
            }
            Value::Reference(id) => {
                receiver.on_reference()?;
                emit_identifier(id, receiver)
            }
        }
    }
}

impl Key {
    /// Sends this key to `receiver` as a sequence of events.
    ///
    /// # Errors
    ///
    /// Returns whatever error the receiver reports.
    pub fn emit<R: EventReceiver + ?Sized>(&self, receiver: &mut R) -> Result<()> {
        match self {
            Key::Bool(b) => receiver.on_bool(*b),
            Key::Integer(i) => emit_integer(i, receiver),
            Key::Uuid(u) => receiver.on_uuid(*u),
            Key::Time(t) => receiver.on_time(t),
            Key::String(s) => receiver.on_string(s),
            Key::Uri(u) => receiver.on_uri(u),
            Key::Marker { id, key } => {
                receiver.on_marker()?;
                emit_identifier(id, receiver)?;
                key.emit(receiver)
            }
            Key::Reference(id) => {
                receiver.on_reference()?;
                emit_identifier(id, receiver)
            }
        }
    }
}

fn emit_integer<R: EventReceiver + ?Sized>(value: &BigInt, receiver: &mut R) -> Result<()> {
    match u64::try_from(value.magnitude()) {
        Ok(magnitude) if value.sign() == Sign::Minus => receiver.on_negative_int(magnitude),
        Ok(magnitude) => receiver.on_positive_int(magnitude),
        Err(_) => receiver.on_big_int(value),
    }
}

fn emit_identifier<R: EventReceiver + ?Sized>(id: &Identifier, receiver: &mut R) -> Result<()> {
    match id {
        Identifier::Int(v) => receiver.on_positive_int(*v),
        Identifier::String(s) => receiver.on_string(s),
        Identifier::Uri(u) => receiver.on_uri(u),
    }
}

fn emit_entries<R: EventReceiver + ?Sized>(map: &ValueMap, receiver: &mut R) -> Result<()> {
    for (key, value) in map {
        key.emit(receiver)?;
        value.emit(receiver)?;
    }
    Ok(())
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(BigInt::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(BigInt::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Integer(BigInt::from(value))
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<Time> for Value {
    fn from(value: Time) -> Self {
        Value::Time(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Map(value)
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Bool(b) => Value::Bool(b),
            Key::Integer(i) => Value::Integer(i),
            Key::Uuid(u) => Value::Uuid(u),
            Key::Time(t) => Value::Time(t),
            Key::String(s) => Value::String(s),
            Key::Uri(u) => Value::Uri(u),
            Key::Marker { id, key } => Value::Marker {
                id,
                value: Box::new(Value::from(*key)),
            },
            Key::Reference(id) => Value::Reference(id),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

impl From<bool> for Key {
    fn from(value: bool) -> Self {
        Key::Bool(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Integer(BigInt::from(value))
    }
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Key::Integer(BigInt::from(value))
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::String(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::String(value)
    }
}

impl From<Time> for Key {
    fn from(value: Time) -> Self {
        Key::Time(value)
    }
}

impl TryFrom<Value> for Key {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(Key::Bool(b)),
            Value::Integer(i) => Ok(Key::Integer(i)),
            Value::Uuid(u) => Ok(Key::Uuid(u)),
            Value::Time(t) => Ok(Key::Time(t)),
            Value::String(s) => Ok(Key::String(s)),
            Value::Uri(u) => Ok(Key::Uri(u)),
            Value::Marker { id, value } => Ok(Key::Marker {
                id,
                key: Box::new(Key::try_from(*value)?),
            }),
            Value::Reference(id) => Ok(Key::Reference(id)),
            other => Err(Error::custom(format!(
                "{} cannot be used as a key",
                describe(&other)
            ))),
        }
    }
}

impl TryFrom<Value> for Identifier {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Identifier::from_big_int(&i),
            Value::String(s) => Ok(Identifier::String(s)),
            Value::Uri(u) => Ok(Identifier::Uri(u)),
            _ => Err(Error::invalid_identifier(
                "ID must be an integer, string or URI",
            )),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| Error::custom(format!("expected i64, found {}", describe(&value))))
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(Error::custom(format!(
                "expected string, found {}",
                describe(&other)
            ))),
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Nil => "nil",
        Value::Bool(_) => "boolean",
        Value::Integer(_) => "integer",
        Value::Float(_) => "float",
        Value::Uuid(_) => "UUID",
        Value::Time(_) => "time",
        Value::Bytes(_) => "bytes",
        Value::String(_) => "string",
        Value::Uri(_) => "URI",
        Value::Custom(_) => "custom",
        Value::List(_) => "list",
        Value::Map(_) => "map",
        Value::Markup { .. } => "markup",
        Value::Marker { .. } => "marker",
        Value::Reference(_) => "reference",
    }
}

/// An array being reassembled from its chunks.
#[derive(Debug)]
struct PendingArray {
    kind: ArrayType,
    data: Vec<u8>,
    remaining: usize,
    is_final: bool,
}

impl PendingArray {
    fn is_complete(&self) -> bool {
        self.is_final && self.remaining == 0
    }

    fn into_value(self) -> Result<Value> {
        Ok(match self.kind {
            ArrayType::Bytes => Value::Bytes(self.data),
            ArrayType::Custom => Value::Custom(self.data),
            ArrayType::String => Value::String(
                String::from_utf8(self.data).map_err(|_| Error::InvalidUtf8 { context: "string" })?,
            ),
            ArrayType::Uri => Value::Uri(
                String::from_utf8(self.data).map_err(|_| Error::InvalidUtf8 { context: "URI" })?,
            ),
        })
    }
}

#[derive(Debug, Default)]
struct MapFrame {
    map: ValueMap,
    key: Option<Key>,
}

impl MapFrame {
    fn add(&mut self, value: Value) -> Result<()> {
        match self.key.take() {
            None => self.key = Some(Key::try_from(value)?),
            Some(key) => {
                self.map.insert(key, value);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MarkupFrame {
    name: Option<Key>,
    attributes: MapFrame,
    contents: Vec<Value>,
    in_contents: bool,
}

#[derive(Debug)]
enum Frame {
    List(Vec<Value>),
    Map(MapFrame),
    Markup(MarkupFrame),
    /// Holds the ID once it has been received.
    Marker(Option<Identifier>),
    Reference,
}

/// Builds a [`Value`] from a stream of events.
///
/// Place it behind [`Rules`](crate::Rules) when the stream is untrusted; the
/// builder itself only checks what it needs in order to assemble values.
/// Comments and metadata are skipped along with everything inside them.
#[derive(Debug, Default)]
pub struct ValueBuilder {
    frames: Vec<Frame>,
    array: Option<PendingArray>,
    /// Open containers inside the comment or metadata being skipped.
    skip_depth: usize,
    result: Option<Value>,
}

impl ValueBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the top-level value, if it has been completed.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Consumes the builder, returning the completed top-level value.
    ///
    /// # Errors
    ///
    /// Fails if containers are still open or no value was received.
    pub fn into_value(self) -> Result<Value> {
        if !self.frames.is_empty() {
            return Err(Error::UnclosedContainers {
                open: self.frames.len(),
            });
        }
        if let Some(array) = self.array {
            return Err(Error::UnterminatedArray { kind: array.kind });
        }
        self.result.ok_or(Error::MissingValue {
            state: StateId::AwaitingTopObject,
        })
    }

    fn is_skipping(&self) -> bool {
        self.skip_depth > 0
    }

    fn scalar(&mut self, value: Value) -> Result<()> {
        if self.is_skipping() {
            return Ok(());
        }
        self.complete(value)
    }

    /// Opens a container, or deepens the skip if inside a comment or metadata.
    fn open(&mut self, frame: Frame, skip_ends: usize) -> Result<()> {
        if self.is_skipping() {
            self.skip_depth += skip_ends;
        } else {
            self.frames.push(frame);
        }
        Ok(())
    }

    /// Places a finished value into whatever is waiting for it.
    fn complete(&mut self, value: Value) -> Result<()> {
        let frame = match self.frames.last_mut() {
            Some(frame) => frame,
            None => {
                self.result = Some(value);
                return Ok(());
            }
        };
        match frame {
            Frame::List(items) => items.push(value),
            Frame::Map(entries) => entries.add(value)?,
            Frame::Markup(markup) => {
                if markup.name.is_none() {
                    markup.name = Some(Key::try_from(value)?);
                } else if markup.in_contents {
                    markup.contents.push(value);
                } else {
                    markup.attributes.add(value)?;
                }
            }
            Frame::Marker(pending) => {
                if pending.is_none() {
                    *pending = Some(Identifier::try_from(value)?);
                    return Ok(());
                }
                if let Some(id) = pending.take() {
                    self.frames.pop();
                    return self.complete(Value::Marker {
                        id,
                        value: Box::new(value),
                    });
                }
            }
            Frame::Reference => {
                self.frames.pop();
                let id = Identifier::try_from(value)?;
                return self.complete(Value::Reference(id));
            }
        }
        Ok(())
    }
}

impl EventReceiver for ValueBuilder {
    fn on_version(&mut self, _: u64) -> Result<()> {
        Ok(())
    }

    fn on_padding(&mut self, _: usize) -> Result<()> {
        Ok(())
    }

    fn on_nil(&mut self) -> Result<()> {
        self.scalar(Value::Nil)
    }

    fn on_bool(&mut self, value: bool) -> Result<()> {
        self.scalar(Value::Bool(value))
    }

    fn on_positive_int(&mut self, value: u64) -> Result<()> {
        self.scalar(Value::Integer(BigInt::from(value)))
    }

    fn on_negative_int(&mut self, value: u64) -> Result<()> {
        self.scalar(Value::Integer(-BigInt::from(value)))
    }

    fn on_big_int(&mut self, value: &BigInt) -> Result<()> {
        self.scalar(Value::Integer(value.clone()))
    }

    fn on_float(&mut self, value: f64) -> Result<()> {
        self.scalar(Value::Float(value))
    }

    fn on_nan(&mut self, _signaling: bool) -> Result<()> {
        self.scalar(Value::Float(f64::NAN))
    }

    fn on_uuid(&mut self, value: [u8; 16]) -> Result<()> {
        self.scalar(Value::Uuid(value))
    }

    fn on_time(&mut self, value: &Time) -> Result<()> {
        self.scalar(Value::Time(value.clone()))
    }

    fn on_list(&mut self) -> Result<()> {
        self.open(Frame::List(Vec::new()), 1)
    }

    fn on_map(&mut self) -> Result<()> {
        self.open(Frame::Map(MapFrame::default()), 1)
    }

    fn on_markup(&mut self) -> Result<()> {
        // Attributes and contents are each closed by their own End.
        self.open(Frame::Markup(MarkupFrame::default()), 2)
    }

    fn on_metadata(&mut self) -> Result<()> {
        self.skip_depth += 1;
        Ok(())
    }

    fn on_comment(&mut self) -> Result<()> {
        self.skip_depth += 1;
        Ok(())
    }

    fn on_marker(&mut self) -> Result<()> {
        self.open(Frame::Marker(None), 0)
    }

    fn on_reference(&mut self) -> Result<()> {
        self.open(Frame::Reference, 0)
    }

    fn on_end(&mut self) -> Result<()> {
        if self.is_skipping() {
            self.skip_depth -= 1;
            return Ok(());
        }
        if let Some(Frame::Markup(markup)) = self.frames.last_mut() {
            if !markup.in_contents {
                markup.in_contents = true;
                return Ok(());
            }
        }
        let value = match self.frames.pop() {
            Some(Frame::List(items)) => Value::List(items),
            Some(Frame::Map(entries)) => Value::Map(entries.map),
            Some(Frame::Markup(markup)) => Value::Markup {
                name: markup.name.ok_or(Error::EmptyMarkupName)?,
                attributes: markup.attributes.map,
                contents: markup.contents,
            },
            Some(Frame::Marker(_)) => {
                return Err(Error::MissingValue {
                    state: StateId::AwaitingMarkedObject,
                })
            }
            Some(Frame::Reference) => {
                return Err(Error::MissingValue {
                    state: StateId::AwaitingReferenceId,
                })
            }
            None => return Err(Error::UnbalancedEnd),
        };
        self.complete(value)
    }

    fn on_array_begin(&mut self, kind: ArrayType) -> Result<()> {
        if !self.is_skipping() {
            self.array = Some(PendingArray {
                kind,
                data: Vec::new(),
                remaining: 0,
                is_final: false,
            });
        }
        Ok(())
    }

    fn on_array_chunk(&mut self, length: usize, is_final: bool) -> Result<()> {
        if self.is_skipping() {
            return Ok(());
        }
        let array = self
            .array
            .as_mut()
            .ok_or_else(|| Error::custom("array chunk outside of an array"))?;
        array.remaining = length;
        array.is_final = is_final;
        self.finish_array_if_complete()
    }

    fn on_array_data(&mut self, data: &[u8]) -> Result<()> {
        if self.is_skipping() {
            return Ok(());
        }
        let array = self
            .array
            .as_mut()
            .ok_or_else(|| Error::custom("array data outside of an array"))?;
        if data.len() > array.remaining {
            return Err(Error::ChunkLengthExceeded {
                length: data.len(),
                remaining: array.remaining,
            });
        }
        array.data.extend_from_slice(data);
        array.remaining -= data.len();
        self.finish_array_if_complete()
    }

    fn on_end_document(&mut self) -> Result<()> {
        Ok(())
    }
}

impl ValueBuilder {
    fn finish_array_if_complete(&mut self) -> Result<()> {
        if !self.array.as_ref().is_some_and(PendingArray::is_complete) {
            return Ok(());
        }
        match self.array.take() {
            Some(array) => {
                let value = array.into_value()?;
                self.complete(value)
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Event, EventRecorder};
    use chrono::NaiveDate;

    fn build(events: &[Event]) -> Result<Value> {
        let mut builder = ValueBuilder::new();
        for event in events {
            event.dispatch(&mut builder)?;
        }
        builder.into_value()
    }

    fn emitted(value: &Value) -> Vec<Event> {
        let mut recorder = EventRecorder::new();
        value.emit(&mut recorder).unwrap();
        recorder.into_events()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(build(&[Event::Nil]).unwrap(), Value::Nil);
        assert_eq!(build(&[Event::NegativeInt(3)]).unwrap(), Value::from(-3));
        let wide: BigInt = BigInt::from(u64::MAX) * 4;
        assert_eq!(
            build(&[Event::BigInt(wide.clone())]).unwrap(),
            Value::Integer(wide)
        );
    }

    #[test]
    fn test_chunked_string() {
        let value = build(&[
            Event::ArrayBegin(ArrayType::String),
            Event::ArrayChunk {
                length: 2,
                is_final: false,
            },
            Event::ArrayData(b"he".to_vec()),
            Event::ArrayChunk {
                length: 3,
                is_final: true,
            },
            Event::ArrayData(b"l".to_vec()),
            Event::ArrayData(b"lo".to_vec()),
        ])
        .unwrap();
        assert_eq!(value, Value::from("hello"));
    }

    #[test]
    fn test_empty_array() {
        let mut builder = ValueBuilder::new();
        builder.on_bytes(&[]).unwrap();
        assert_eq!(builder.into_value().unwrap(), Value::Bytes(Vec::new()));
    }

    #[test]
    fn test_map_with_mixed_keys() {
        let mut builder = ValueBuilder::new();
        builder.on_map().unwrap();
        builder.on_string("a").unwrap();
        builder.on_bool(true).unwrap();
        builder.on_positive_int(2).unwrap();
        builder.on_list().unwrap();
        builder.on_end().unwrap();
        builder.on_end().unwrap();

        let expected = ValueMap::from([
            (Key::from("a"), Value::Bool(true)),
            (Key::from(2u64), Value::List(vec![])),
        ]);
        assert_eq!(builder.into_value().unwrap(), Value::Map(expected));
    }

    #[test]
    fn test_non_keyable_key_rejected() {
        let mut builder = ValueBuilder::new();
        builder.on_map().unwrap();
        assert!(builder.on_float(1.5).is_err());
    }

    #[test]
    fn test_metadata_and_comments_dropped() {
        let mut builder = ValueBuilder::new();
        builder.on_metadata().unwrap();
        builder.on_string("k").unwrap();
        builder.on_markup().unwrap();
        builder.on_string("n").unwrap();
        builder.on_end().unwrap();
        builder.on_string("text").unwrap();
        builder.on_end().unwrap();
        builder.on_end().unwrap();
        builder.on_comment().unwrap();
        builder.on_string("note").unwrap();
        builder.on_end().unwrap();
        builder.on_int(7).unwrap();
        assert_eq!(builder.into_value().unwrap(), Value::from(7));
    }

    #[test]
    fn test_markup() {
        let mut builder = ValueBuilder::new();
        builder.on_markup().unwrap();
        builder.on_string("p").unwrap();
        builder.on_string("class").unwrap();
        builder.on_string("intro").unwrap();
        builder.on_end().unwrap();
        builder.on_string("Hello ").unwrap();
        builder.on_markup().unwrap();
        builder.on_string("b").unwrap();
        builder.on_end().unwrap();
        builder.on_string("world").unwrap();
        builder.on_end().unwrap();
        builder.on_end().unwrap();

        let value = builder.into_value().unwrap();
        let Value::Markup {
            name,
            attributes,
            contents,
        } = value
        else {
            panic!("expected markup");
        };
        assert_eq!(name, Key::from("p"));
        assert_eq!(
            attributes.get(&Key::from("class")),
            Some(&Value::from("intro"))
        );
        assert_eq!(contents.len(), 2);
        assert!(contents[1].is_markup());
    }

    #[test]
    fn test_marker_and_reference() {
        let mut builder = ValueBuilder::new();
        builder.on_list().unwrap();
        builder.on_marker().unwrap();
        builder.on_string("x").unwrap();
        builder.on_map().unwrap();
        builder.on_end().unwrap();
        builder.on_reference().unwrap();
        builder.on_string("x").unwrap();
        builder.on_end().unwrap();

        let id = Identifier::String("x".into());
        assert_eq!(
            builder.into_value().unwrap(),
            Value::List(vec![
                Value::Marker {
                    id: id.clone(),
                    value: Box::new(Value::Map(ValueMap::new())),
                },
                Value::Reference(id),
            ])
        );
    }

    #[test]
    fn test_unfinished_value() {
        let mut builder = ValueBuilder::new();
        builder.on_list().unwrap();
        assert_eq!(
            builder.into_value(),
            Err(Error::UnclosedContainers { open: 1 })
        );
        assert!(matches!(
            ValueBuilder::new().into_value(),
            Err(Error::MissingValue { .. })
        ));
    }

    #[test]
    fn test_integer_emission_by_width() {
        assert_eq!(emitted(&Value::from(5)), vec![Event::PositiveInt(5)]);
        assert_eq!(emitted(&Value::from(-5)), vec![Event::NegativeInt(5)]);
        let min = Value::from(i64::MIN);
        assert_eq!(emitted(&min), vec![Event::NegativeInt(1 << 63)]);
        let wide: BigInt = BigInt::from(u64::MAX) + 1;
        assert_eq!(
            emitted(&Value::Integer(wide.clone())),
            vec![Event::BigInt(wide)]
        );
    }

    #[test]
    fn test_nan_emitted_quiet() {
        assert_eq!(
            emitted(&Value::Float(f64::NAN)),
            vec![Event::NaN { signaling: false }]
        );
    }

    #[test]
    fn test_emit_markup_events() {
        let value = Value::Markup {
            name: Key::from("br"),
            attributes: ValueMap::new(),
            contents: Vec::new(),
        };
        let events = emitted(&value);
        assert_eq!(events.first(), Some(&Event::Markup));
        assert_eq!(events.iter().filter(|e| **e == Event::End).count(), 2);
    }

    #[test]
    fn test_emit_then_build() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let value = Value::from(vec![
            Value::Time(Time::Date(date)),
            Value::Uri("https://example.com".into()),
            Value::Custom(vec![1, 2, 3]),
            Value::Uuid([7; 16]),
            Value::from(ValueMap::from([(Key::Bool(false), Value::Nil)])),
        ]);
        let mut builder = ValueBuilder::new();
        value.emit(&mut builder).unwrap();
        assert_eq!(builder.into_value().unwrap(), value);
    }

    #[test]
    fn test_key_conversion() {
        assert_eq!(Key::try_from(Value::from("k")).unwrap(), Key::from("k"));
        assert!(Key::try_from(Value::Nil).is_err());
        assert!(Key::try_from(Value::List(vec![])).is_err());
        assert_eq!(Value::from(Key::from(3u64)), Value::from(3u64));
        assert!(Value::Reference(Identifier::Int(1)).is_keyable());
        assert!(!Value::Float(0.0).is_keyable());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from(u64::MAX).as_u64(), Some(u64::MAX));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("s").as_str(), Some("s"));
        assert_eq!(Value::from(Some(1)), Value::from(1));
        assert_eq!(Value::from(None::<i64>), Value::Nil);
        assert_eq!(i64::try_from(Value::from(9)).unwrap(), 9);
        assert!(String::try_from(Value::Nil).is_err());
    }
}
