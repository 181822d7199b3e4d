//! The event vocabulary shared by every stage of a Concise Encoding pipeline.
//!
//! Decoders produce events, [`Rules`](crate::Rules) validates them, and
//! builders or encoders consume them. All three speak [`EventReceiver`].
//!
//! ## Examples
//!
//! ```rust
//! use concise_encoding::{Event, EventReceiver, EventRecorder};
//!
//! let mut recorder = EventRecorder::new();
//! recorder.on_list().unwrap();
//! recorder.on_string("hi").unwrap();
//! recorder.on_end().unwrap();
//!
//! assert_eq!(recorder.events()[0], Event::List);
//! assert_eq!(recorder.events().len(), 5); // list, begin, chunk, data, end
//! ```

use crate::states::DataType;
use crate::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a chunked array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrayType {
    Bytes,
    String,
    Uri,
    Custom,
}

impl ArrayType {
    /// The grammar category of a completed array of this kind.
    #[must_use]
    pub const fn data_type(self) -> DataType {
        match self {
            ArrayType::Bytes => DataType::Bytes,
            ArrayType::String => DataType::String,
            ArrayType::Uri => DataType::Uri,
            ArrayType::Custom => DataType::Custom,
        }
    }

    /// Returns `true` if the array's content must be valid UTF-8.
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, ArrayType::String | ArrayType::Uri)
    }
}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.data_type(), f)
    }
}

/// A date, time of day, or timestamp.
///
/// # Examples
///
/// ```rust
/// use chrono::NaiveDate;
/// use concise_encoding::Time;
///
/// let date = NaiveDate::from_ymd_opt(2021, 3, 14).unwrap();
/// assert_eq!(Time::Date(date).to_string(), "2021-03-14");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Time {
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(DateTime<FixedOffset>),
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Time::Date(d) => write!(f, "{}", d),
            Time::Time(t) => write!(f, "{}", t),
            Time::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

/// One unit of document structure or data, in owned form.
///
/// Useful for recording a stream and replaying it later with
/// [`Event::dispatch`]. Events implement serde traits, so a recorded stream
/// can be stored in any serde format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Version(u64),
    Padding(usize),
    Nil,
    Bool(bool),
    PositiveInt(u64),
    NegativeInt(u64),
    BigInt(BigInt),
    Float(f64),
    NaN { signaling: bool },
    Uuid([u8; 16]),
    Time(Time),
    List,
    Map,
    Markup,
    Metadata,
    Comment,
    Marker,
    Reference,
    End,
    ArrayBegin(ArrayType),
    ArrayChunk { length: usize, is_final: bool },
    ArrayData(Vec<u8>),
    EndDocument,
}

impl Event {
    /// Sends this event to `receiver`.
    ///
    /// # Errors
    ///
    /// Returns whatever error the receiver reports.
    pub fn dispatch<R: EventReceiver + ?Sized>(&self, receiver: &mut R) -> Result<()> {
        match self {
            Event::Version(v) => receiver.on_version(*v),
            Event::Padding(n) => receiver.on_padding(*n),
            Event::Nil => receiver.on_nil(),
            Event::Bool(b) => receiver.on_bool(*b),
            Event::PositiveInt(v) => receiver.on_positive_int(*v),
            Event::NegativeInt(v) => receiver.on_negative_int(*v),
            Event::BigInt(v) => receiver.on_big_int(v),
            Event::Float(v) => receiver.on_float(*v),
            Event::NaN { signaling } => receiver.on_nan(*signaling),
            Event::Uuid(v) => receiver.on_uuid(*v),
            Event::Time(v) => receiver.on_time(v),
            Event::List => receiver.on_list(),
            Event::Map => receiver.on_map(),
            Event::Markup => receiver.on_markup(),
            Event::Metadata => receiver.on_metadata(),
            Event::Comment => receiver.on_comment(),
            Event::Marker => receiver.on_marker(),
            Event::Reference => receiver.on_reference(),
            Event::End => receiver.on_end(),
            Event::ArrayBegin(kind) => receiver.on_array_begin(*kind),
            Event::ArrayChunk { length, is_final } => receiver.on_array_chunk(*length, *is_final),
            Event::ArrayData(data) => receiver.on_array_data(data),
            Event::EndDocument => receiver.on_end_document(),
        }
    }
}

/// Anything that consumes a stream of document events.
///
/// Implemented by [`Rules`](crate::Rules) (which validates and forwards),
/// [`ValueBuilder`](crate::ValueBuilder), [`EventRecorder`] and
/// [`NullReceiver`]. A receiver placed behind `Rules` may assume everything it
/// sees is grammar-legal.
pub trait EventReceiver {
    fn on_version(&mut self, version: u64) -> Result<()>;
    fn on_padding(&mut self, count: usize) -> Result<()>;
    fn on_nil(&mut self) -> Result<()>;
    fn on_bool(&mut self, value: bool) -> Result<()>;
    fn on_positive_int(&mut self, value: u64) -> Result<()>;
    /// `value` is the magnitude; the integer is `-value`.
    fn on_negative_int(&mut self, value: u64) -> Result<()>;
    fn on_big_int(&mut self, value: &BigInt) -> Result<()>;
    fn on_float(&mut self, value: f64) -> Result<()>;
    fn on_nan(&mut self, signaling: bool) -> Result<()>;
    fn on_uuid(&mut self, value: [u8; 16]) -> Result<()>;
    fn on_time(&mut self, value: &Time) -> Result<()>;
    fn on_list(&mut self) -> Result<()>;
    fn on_map(&mut self) -> Result<()>;
    fn on_markup(&mut self) -> Result<()>;
    fn on_metadata(&mut self) -> Result<()>;
    fn on_comment(&mut self) -> Result<()>;
    fn on_marker(&mut self) -> Result<()>;
    fn on_reference(&mut self) -> Result<()>;
    fn on_end(&mut self) -> Result<()>;
    fn on_array_begin(&mut self, kind: ArrayType) -> Result<()>;
    fn on_array_chunk(&mut self, length: usize, is_final: bool) -> Result<()>;
    fn on_array_data(&mut self, data: &[u8]) -> Result<()>;
    fn on_end_document(&mut self) -> Result<()>;

    /// Sends a complete array as a single final chunk.
    fn on_array(&mut self, kind: ArrayType, data: &[u8]) -> Result<()> {
        self.on_array_begin(kind)?;
        self.on_array_chunk(data.len(), true)?;
        if !data.is_empty() {
            self.on_array_data(data)?;
        }
        Ok(())
    }

    fn on_string(&mut self, value: &str) -> Result<()> {
        self.on_array(ArrayType::String, value.as_bytes())
    }

    fn on_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.on_array(ArrayType::Bytes, value)
    }

    fn on_uri(&mut self, value: &str) -> Result<()> {
        self.on_array(ArrayType::Uri, value.as_bytes())
    }

    fn on_custom(&mut self, value: &[u8]) -> Result<()> {
        self.on_array(ArrayType::Custom, value)
    }

    /// Sends a signed integer as a positive or negative integer event.
    fn on_int(&mut self, value: i64) -> Result<()> {
        if value < 0 {
            self.on_negative_int(value.unsigned_abs())
        } else {
            self.on_positive_int(value as u64)
        }
    }
}

/// A receiver that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReceiver;

impl EventReceiver for NullReceiver {
    fn on_version(&mut self, _: u64) -> Result<()> {
        Ok(())
    }
    fn on_padding(&mut self, _: usize) -> Result<()> {
        Ok(())
    }
    fn on_nil(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_bool(&mut self, _: bool) -> Result<()> {
        Ok(())
    }
    fn on_positive_int(&mut self, _: u64) -> Result<()> {
        Ok(())
    }
    fn on_negative_int(&mut self, _: u64) -> Result<()> {
        Ok(())
    }
    fn on_big_int(&mut self, _: &BigInt) -> Result<()> {
        Ok(())
    }
    fn on_float(&mut self, _: f64) -> Result<()> {
        Ok(())
    }
    fn on_nan(&mut self, _: bool) -> Result<()> {
        Ok(())
    }
    fn on_uuid(&mut self, _: [u8; 16]) -> Result<()> {
        Ok(())
    }
    fn on_time(&mut self, _: &Time) -> Result<()> {
        Ok(())
    }
    fn on_list(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_map(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_markup(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_metadata(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_comment(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_marker(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_reference(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_end(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_array_begin(&mut self, _: ArrayType) -> Result<()> {
        Ok(())
    }
    fn on_array_chunk(&mut self, _: usize, _: bool) -> Result<()> {
        Ok(())
    }
    fn on_array_data(&mut self, _: &[u8]) -> Result<()> {
        Ok(())
    }
    fn on_end_document(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A receiver that records every event it is sent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventRecorder {
    events: Vec<Event>,
}

impl EventRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Replays every recorded event into `receiver`.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error the receiver reports.
    pub fn replay<R: EventReceiver + ?Sized>(&self, receiver: &mut R) -> Result<()> {
        self.events.iter().try_for_each(|e| e.dispatch(receiver))
    }

    fn record(&mut self, event: Event) -> Result<()> {
        self.events.push(event);
        Ok(())
    }
}

impl EventReceiver for EventRecorder {
    fn on_version(&mut self, version: u64) -> Result<()> {
        self.record(Event::Version(version))
    }
    fn on_padding(&mut self, count: usize) -> Result<()> {
        self.record(Event::Padding(count))
    }
    fn on_nil(&mut self) -> Result<()> {
        self.record(Event::Nil)
    }
    fn on_bool(&mut self, value: bool) -> Result<()> {
        self.record(Event::Bool(value))
    }
    fn on_positive_int(&mut self, value: u64) -> Result<()> {
        self.record(Event::PositiveInt(value))
    }
    fn on_negative_int(&mut self, value: u64) -> Result<()> {
        self.record(Event::NegativeInt(value))
    }
    fn on_big_int(&mut self, value: &BigInt) -> Result<()> {
        self.record(Event::BigInt(value.clone()))
    }
    fn on_float(&mut self, value: f64) -> Result<()> {
        self.record(Event::Float(value))
    }
    fn on_nan(&mut self, signaling: bool) -> Result<()> {
        self.record(Event::NaN { signaling })
    }
    fn on_uuid(&mut self, value: [u8; 16]) -> Result<()> {
        self.record(Event::Uuid(value))
    }
    fn on_time(&mut self, value: &Time) -> Result<()> {
        self.record(Event::Time(value.clone()))
    }
    fn on_list(&mut self) -> Result<()> {
        self.record(Event::List)
    }
    fn on_map(&mut self) -> Result<()> {
        self.record(Event::Map)
    }
    fn on_markup(&mut self) -> Result<()> {
        self.record(Event::Markup)
    }
    fn on_metadata(&mut self) -> Result<()> {
        self.record(Event::Metadata)
    }
    fn on_comment(&mut self) -> Result<()> {
        self.record(Event::Comment)
    }
    fn on_marker(&mut self) -> Result<()> {
        self.record(Event::Marker)
    }
    fn on_reference(&mut self) -> Result<()> {
        self.record(Event::Reference)
    }
    fn on_end(&mut self) -> Result<()> {
        self.record(Event::End)
    }
    fn on_array_begin(&mut self, kind: ArrayType) -> Result<()> {
        self.record(Event::ArrayBegin(kind))
    }
    fn on_array_chunk(&mut self, length: usize, is_final: bool) -> Result<()> {
        self.record(Event::ArrayChunk { length, is_final })
    }
    fn on_array_data(&mut self, data: &[u8]) -> Result<()> {
        self.record(Event::ArrayData(data.to_vec()))
    }
    fn on_end_document(&mut self) -> Result<()> {
        self.record(Event::EndDocument)
    }
}
