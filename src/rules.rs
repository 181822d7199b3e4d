//! The grammar-validating rule engine.
//!
//! [`Rules`] sits between an event producer (a decoder, or code driving the
//! API directly) and a downstream [`EventReceiver`]. Every event is checked
//! against the current grammar state before it is forwarded unchanged; the
//! first illegal event, malformed array or exceeded limit fails immediately.
//!
//! ## Usage
//!
//! ```rust
//! use concise_encoding::{EventReceiver, EventRecorder, RuleOptions, Rules};
//!
//! let mut rules = Rules::new(EventRecorder::new(), RuleOptions::default());
//! rules.on_version(1).unwrap();
//! rules.on_list().unwrap();
//! rules.on_string("").unwrap();
//! rules.on_end().unwrap();
//! rules.on_end_document().unwrap();
//!
//! let recorded = rules.into_inner();
//! assert_eq!(recorded.events().len(), 7);
//! ```
//!
//! ## State Model
//!
//! The engine keeps a stack of [`RuleState`]s, innermost last. The bottom is
//! seeded with "awaiting end of document" and "awaiting version" at reset.
//! Completed objects funnel through a single child-ended step that advances
//! the parent state; metadata and marker wrappers are transparent and pass
//! the completed object's category on to the container beneath them.

use crate::arrays::{ArrayRole, ArrayState};
use crate::ids::{IdTables, Identifier};
use crate::states::{CategorySet, DataType, RuleState, StateId, Transition};
use crate::{ArrayType, Error, EventReceiver, Result, RuleOptions, Time};
use log::{debug, trace};
use num_bigint::{BigInt, Sign};

/// Levels reserved below user containers for the version and end-of-document states.
const RESERVED_DEPTH: usize = 2;

/// Validates an event stream and forwards it to `R`.
///
/// A `Rules` instance handles one document at a time. After an error, or to
/// start another document, call [`Rules::reset`].
pub struct Rules<R> {
    receiver: R,
    options: RuleOptions,
    max_depth: usize,
    stack: Vec<RuleState>,
    array: Option<ArrayState>,
    ids: IdTables,
    object_count: u64,
    marker_count: u64,
}

impl<R: EventReceiver> Rules<R> {
    /// Creates rules that forward to `receiver`, with zero limits defaulted.
    pub fn new(receiver: R, options: RuleOptions) -> Self {
        let options = options.applied_defaults();
        let max_depth = options.max_container_depth.saturating_add(RESERVED_DEPTH);
        let mut rules = Rules {
            receiver,
            options,
            max_depth,
            stack: Vec::new(),
            array: None,
            ids: IdTables::default(),
            object_count: 0,
            marker_count: 0,
        };
        rules.reset();
        rules
    }

    /// Clears all state so a new document can be validated.
    pub fn reset(&mut self) {
        debug!("resetting rules");
        self.stack.clear();
        self.stack.push(StateId::AwaitingEndDocument.state());
        self.stack.push(StateId::AwaitingVersion.state());
        self.array = None;
        self.ids.clear();
        self.object_count = 0;
        self.marker_count = 0;
    }

    /// The options in effect, with defaults applied.
    #[must_use]
    pub fn options(&self) -> &RuleOptions {
        &self.options
    }

    #[must_use]
    pub fn receiver(&self) -> &R {
        &self.receiver
    }

    pub fn receiver_mut(&mut self) -> &mut R {
        &mut self.receiver
    }

    pub fn into_inner(self) -> R {
        self.receiver
    }

    /// Number of user-visible containers currently open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack
            .iter()
            .filter(|s| !matches!(s.id, StateId::AwaitingArrayChunk | StateId::AwaitingArrayData))
            .count()
            .saturating_sub(RESERVED_DEPTH)
    }

    #[must_use]
    pub fn object_count(&self) -> u64 {
        self.object_count
    }

    /// Returns `true` once `EndDocument` has been accepted.
    #[must_use]
    pub fn is_document_complete(&self) -> bool {
        self.top().id == StateId::DocumentEnded
    }

    fn top(&self) -> RuleState {
        // The bottom of the stack is only ever replaced, never popped.
        self.stack
            .last()
            .copied()
            .unwrap_or_else(|| StateId::DocumentEnded.state())
    }

    fn replace_top(&mut self, id: StateId) {
        if let Some(top) = self.stack.last_mut() {
            *top = id.state();
        }
    }

    fn first_real(&self) -> Option<RuleState> {
        self.stack.iter().rev().find(|s| s.is_real_container).copied()
    }

    fn assert_allowed(&self, data_type: DataType) -> Result<()> {
        let top = self.top();
        if top.id == StateId::DocumentEnded {
            return Err(Error::DocumentEnded { event: data_type });
        }
        if !top.allows(data_type) {
            return Err(Error::grammar(data_type, top.id));
        }
        if top.id.is_transparent() && !CategorySet::PSEUDO.contains(data_type) {
            self.assert_allowed_in_real_parent(CategorySet::of(data_type), data_type)?;
        }
        Ok(())
    }

    fn assert_allowed_in_real_parent(&self, kind: CategorySet, data_type: DataType) -> Result<()> {
        if let Some(parent) = self.first_real() {
            if !parent.allowed.intersects(kind) {
                return Err(Error::grammar(data_type, parent.id));
            }
        }
        Ok(())
    }

    /// Records the category a marked object begins with, for cyclic references.
    fn note_object_begin(&mut self, data_type: DataType) {
        for state in self.stack.iter().rev() {
            match state.id {
                StateId::AwaitingMarkedObject => {
                    self.ids.marked_object_began(data_type);
                    return;
                }
                id if id.is_transparent() => continue,
                _ => return,
            }
        }
    }

    fn push_container(&mut self, data_type: DataType, id: StateId) -> Result<()> {
        self.assert_allowed(data_type)?;
        if self.stack.len() >= self.max_depth {
            return Err(Error::DepthExceeded {
                max: self.options.max_container_depth,
            });
        }
        if CategorySet::ANY_OBJECT.contains(data_type) {
            self.note_object_begin(data_type);
        }
        trace!("push {} ({})", id, self.stack.len());
        self.stack.push(id.state());
        Ok(())
    }

    fn count_object(&mut self) -> Result<()> {
        self.object_count += 1;
        if self.object_count > self.options.max_object_count {
            return Err(Error::ObjectCountExceeded {
                max: self.options.max_object_count,
            });
        }
        Ok(())
    }

    /// Runs after any scalar, array or container completes in the current state.
    fn on_child_ended(&mut self, kind: CategorySet) -> Result<()> {
        if kind == CategorySet::of(DataType::Comment) {
            return Ok(());
        }
        let top = self.top();
        if top.is_awaiting_id {
            return self.on_identifier_ended(top.id);
        }
        if top.id != StateId::AwaitingCommentContents {
            self.count_object()?;
        }
        self.advance(kind)
    }

    fn on_identifier_ended(&mut self, id: StateId) -> Result<()> {
        if id == StateId::AwaitingReferenceId {
            self.stack.pop();
            let ident = self.pop_identifier()?;
            let kind = self.ids.resolve(&ident)?;
            self.count_object()?;
            self.assert_allowed_in_real_parent(kind, DataType::Reference)?;
            return self.advance(kind);
        }
        self.ids.begin_marker()?;
        self.replace_top(StateId::AwaitingMarkedObject);
        Ok(())
    }

    fn pop_identifier(&mut self) -> Result<Identifier> {
        self.ids
            .pop_unassigned()
            .ok_or_else(|| Error::invalid_identifier("no identifier pending"))
    }

    /// Moves the parent state on after one of its children has completed.
    ///
    /// Transparent wrappers pop themselves and repeat the step on whatever is
    /// beneath them, so stacked metadata and markers all reach the real
    /// container.
    fn advance(&mut self, kind: CategorySet) -> Result<()> {
        let top = self.top();
        match top.id {
            StateId::AwaitingMetadataObject => {
                self.stack.pop();
                self.assert_allowed_in_real_parent(kind, DataType::Metadata)?;
                self.advance(kind)
            }
            StateId::AwaitingMarkedObject => {
                self.stack.pop();
                let ident = self.pop_identifier()?;
                self.ids.assign(ident, kind)?;
                self.assert_allowed_in_real_parent(kind, DataType::Marker)?;
                self.advance(kind)
            }
            id => {
                match id.successor() {
                    Transition::Stay => {}
                    Transition::Replace(next) => self.replace_top(next),
                    Transition::Pop => {
                        trace!("pop {}", id);
                        self.stack.pop();
                    }
                }
                Ok(())
            }
        }
    }

    fn on_scalar(&mut self, data_type: DataType) -> Result<()> {
        self.assert_allowed(data_type)?;
        self.on_child_ended(CategorySet::of(data_type))
    }

    fn identifier_expected(&self) -> bool {
        self.top().is_awaiting_id
    }

    fn on_integer_identifier(&mut self, id: Identifier) -> Result<()> {
        if self.identifier_expected() {
            self.ids.push_unassigned(id);
        }
        Ok(())
    }

    fn max_length_for(&self, kind: ArrayType, role: ArrayRole) -> usize {
        let max = match kind {
            ArrayType::Bytes | ArrayType::Custom => self.options.max_bytes_length,
            ArrayType::String => self.options.max_string_length,
            ArrayType::Uri => self.options.max_uri_length,
        };
        match (role, kind) {
            (ArrayRole::Identifier, ArrayType::String) => max.min(self.options.max_id_length),
            (ArrayRole::MarkupName, _) => max.min(self.options.max_markup_name_length),
            _ => max,
        }
    }

    /// Validates a completed array. Runs before the completing event is forwarded.
    fn end_array(&mut self) -> Result<()> {
        let Some(array) = self.array.take() else {
            return Ok(());
        };
        self.stack.pop();
        let kind = array.kind;
        let role = array.role;
        let length = array.declared;
        let content = array.finish()?;
        trace!("array {} complete ({} bytes)", kind, length);

        match role {
            ArrayRole::Identifier => {
                self.ids.push_unassigned(identifier_from_array(kind, content)?);
            }
            ArrayRole::MarkupName if length == 0 => return Err(Error::EmptyMarkupName),
            _ => {}
        }
        self.on_child_ended(CategorySet::of(kind.data_type()))
    }

    /// Containers, wrappers and arrays still waiting for their remaining events.
    fn count_open_containers(&self) -> usize {
        self.stack
            .iter()
            .filter(|s| !s.id.is_document_level())
            .count()
    }
}

fn identifier_from_array(kind: ArrayType, content: Vec<u8>) -> Result<Identifier> {
    if content.is_empty() {
        return Err(Error::EmptyIdentifier);
    }
    // Content was validated as UTF-8 while it streamed in.
    let text = String::from_utf8(content).map_err(|_| Error::InvalidUtf8 {
        context: "identifier",
    })?;
    match kind {
        ArrayType::Uri => {
            if text.len() < 2 {
                return Err(Error::invalid_uri(&text, "too short to hold a scheme"));
            }
            url::Url::parse(&text).map_err(|e| Error::invalid_uri(&text, e))?;
            Ok(Identifier::Uri(text))
        }
        _ => Ok(Identifier::String(text)),
    }
}

impl<R: EventReceiver> EventReceiver for Rules<R> {
    fn on_version(&mut self, version: u64) -> Result<()> {
        self.assert_allowed(DataType::Version)?;
        if version != self.options.version {
            return Err(Error::VersionMismatch {
                expected: self.options.version,
                found: version,
            });
        }
        self.replace_top(StateId::AwaitingTopObject);
        self.receiver.on_version(version)
    }

    fn on_padding(&mut self, count: usize) -> Result<()> {
        self.assert_allowed(DataType::Padding)?;
        self.receiver.on_padding(count)
    }

    fn on_nil(&mut self) -> Result<()> {
        self.on_scalar(DataType::Nil)?;
        self.receiver.on_nil()
    }

    fn on_bool(&mut self, value: bool) -> Result<()> {
        self.on_scalar(DataType::Bool)?;
        self.receiver.on_bool(value)
    }

    fn on_positive_int(&mut self, value: u64) -> Result<()> {
        self.assert_allowed(DataType::PositiveInt)?;
        self.on_integer_identifier(Identifier::Int(value))?;
        self.on_child_ended(CategorySet::of(DataType::PositiveInt))?;
        self.receiver.on_positive_int(value)
    }

    fn on_negative_int(&mut self, value: u64) -> Result<()> {
        self.assert_allowed(DataType::NegativeInt)?;
        if self.identifier_expected() {
            return Err(Error::invalid_identifier("ID cannot be negative"));
        }
        self.on_child_ended(CategorySet::of(DataType::NegativeInt))?;
        self.receiver.on_negative_int(value)
    }

    fn on_big_int(&mut self, value: &BigInt) -> Result<()> {
        let data_type = if value.sign() == Sign::Minus {
            DataType::NegativeInt
        } else {
            DataType::PositiveInt
        };
        self.assert_allowed(data_type)?;
        if self.identifier_expected() {
            let id = Identifier::from_big_int(value)?;
            self.ids.push_unassigned(id);
        }
        self.on_child_ended(CategorySet::of(data_type))?;
        self.receiver.on_big_int(value)
    }

    fn on_float(&mut self, value: f64) -> Result<()> {
        self.on_scalar(DataType::Float)?;
        self.receiver.on_float(value)
    }

    fn on_nan(&mut self, signaling: bool) -> Result<()> {
        self.on_scalar(DataType::Float)?;
        self.receiver.on_nan(signaling)
    }

    fn on_uuid(&mut self, value: [u8; 16]) -> Result<()> {
        self.on_scalar(DataType::Uuid)?;
        self.receiver.on_uuid(value)
    }

    fn on_time(&mut self, value: &Time) -> Result<()> {
        self.on_scalar(DataType::Time)?;
        self.receiver.on_time(value)
    }

    fn on_list(&mut self) -> Result<()> {
        self.push_container(DataType::List, StateId::AwaitingListItem)?;
        self.receiver.on_list()
    }

    fn on_map(&mut self) -> Result<()> {
        self.push_container(DataType::Map, StateId::AwaitingMapKey)?;
        self.receiver.on_map()
    }

    fn on_markup(&mut self) -> Result<()> {
        self.push_container(DataType::Markup, StateId::AwaitingMarkupName)?;
        self.receiver.on_markup()
    }

    fn on_metadata(&mut self) -> Result<()> {
        self.push_container(DataType::Metadata, StateId::AwaitingMetadataKey)?;
        self.receiver.on_metadata()
    }

    fn on_comment(&mut self) -> Result<()> {
        self.push_container(DataType::Comment, StateId::AwaitingCommentContents)?;
        self.receiver.on_comment()
    }

    fn on_marker(&mut self) -> Result<()> {
        self.push_container(DataType::Marker, StateId::AwaitingMarkerId)?;
        self.marker_count += 1;
        if self.marker_count > self.options.max_reference_count {
            return Err(Error::ReferenceCountExceeded {
                max: self.options.max_reference_count,
            });
        }
        self.receiver.on_marker()
    }

    fn on_reference(&mut self) -> Result<()> {
        self.push_container(DataType::Reference, StateId::AwaitingReferenceId)?;
        self.receiver.on_reference()
    }

    fn on_end(&mut self) -> Result<()> {
        let top = self.top();
        if top.id == StateId::DocumentEnded {
            return Err(Error::DocumentEnded {
                event: DataType::End,
            });
        }
        if !top.allows(DataType::End) {
            if top.id.is_value_slot() {
                return Err(Error::MissingValue { state: top.id });
            }
            if self.count_open_containers() == 0 {
                return Err(Error::UnbalancedEnd);
            }
            return Err(Error::grammar(DataType::End, top.id));
        }

        match top.id {
            StateId::AwaitingMarkupKey => {
                self.replace_top(StateId::AwaitingMarkupContents);
            }
            StateId::AwaitingMetadataKey => {
                self.replace_top(StateId::AwaitingMetadataObject);
            }
            id => {
                trace!("pop {}", id);
                self.stack.pop();
                let kind = match id {
                    StateId::AwaitingListItem => DataType::List,
                    StateId::AwaitingMapKey => DataType::Map,
                    StateId::AwaitingMarkupContents => DataType::Markup,
                    _ => DataType::Comment,
                };
                self.on_child_ended(CategorySet::of(kind))?;
            }
        }
        self.receiver.on_end()
    }

    fn on_array_begin(&mut self, kind: ArrayType) -> Result<()> {
        let data_type = kind.data_type();
        self.assert_allowed(data_type)?;
        let top = self.top();
        let role = if top.is_awaiting_id {
            ArrayRole::Identifier
        } else {
            match top.id {
                StateId::AwaitingMarkupName => ArrayRole::MarkupName,
                StateId::AwaitingCommentContents => ArrayRole::Comment,
                _ => ArrayRole::Data,
            }
        };
        let max_length = self.max_length_for(kind, role);
        self.array = Some(ArrayState::new(kind, role, max_length));
        self.stack.push(StateId::AwaitingArrayChunk.state());
        self.receiver.on_array_begin(kind)
    }

    fn on_array_chunk(&mut self, length: usize, is_final: bool) -> Result<()> {
        self.assert_allowed(DataType::ArrayChunk)?;
        let Some(array) = self.array.as_mut() else {
            return Err(Error::grammar(DataType::ArrayChunk, self.top().id));
        };
        array.begin_chunk(length, is_final)?;
        let complete = array.is_complete();
        if length > 0 {
            self.replace_top(StateId::AwaitingArrayData);
        }
        if complete {
            self.end_array()?;
        }
        self.receiver.on_array_chunk(length, is_final)
    }

    fn on_array_data(&mut self, data: &[u8]) -> Result<()> {
        self.assert_allowed(DataType::ArrayData)?;
        let Some(array) = self.array.as_mut() else {
            return Err(Error::grammar(DataType::ArrayData, self.top().id));
        };
        array.add_data(data)?;
        let chunk_done = array.is_chunk_complete();
        let complete = array.is_complete();
        if chunk_done && !complete {
            self.replace_top(StateId::AwaitingArrayChunk);
        }
        if complete {
            self.end_array()?;
        }
        self.receiver.on_array_data(data)
    }

    fn on_end_document(&mut self) -> Result<()> {
        let top = self.top();
        if top.id == StateId::DocumentEnded {
            return Err(Error::DocumentEnded {
                event: DataType::EndDocument,
            });
        }
        if !top.allows(DataType::EndDocument) {
            if let Some(array) = &self.array {
                return Err(Error::UnterminatedArray { kind: array.kind });
            }
            let open = self.count_open_containers();
            if open > 0 {
                return Err(Error::UnclosedContainers { open });
            }
            return Err(Error::grammar(DataType::EndDocument, top.id));
        }
        self.replace_top(StateId::DocumentEnded);
        debug!("document complete: {} objects", self.object_count);
        self.receiver.on_end_document()
    }
}
