//! Grammar state table.
//!
//! Each [`StateId`] names one position in the document grammar ("awaiting a
//! map key", "awaiting an array chunk header", ...). Its [`RuleState`] says
//! which [`DataType`] categories may arrive next and carries two structural
//! flags. Everything here is a pure function of the state identity, evaluated
//! at compile time.

use std::fmt;

/// Category of an incoming event, used to test it against a state's allow set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    Version,
    Padding,
    Nil,
    Bool,
    PositiveInt,
    NegativeInt,
    Float,
    Uuid,
    Time,
    List,
    Map,
    Markup,
    Metadata,
    Comment,
    Marker,
    Reference,
    End,
    Bytes,
    String,
    Uri,
    Custom,
    ArrayChunk,
    ArrayData,
    EndDocument,
}

impl DataType {
    #[inline]
    const fn bit(self) -> u32 {
        1 << self as u32
    }

    const fn name(self) -> &'static str {
        match self {
            DataType::Version => "version",
            DataType::Padding => "padding",
            DataType::Nil => "nil",
            DataType::Bool => "boolean",
            DataType::PositiveInt => "positive integer",
            DataType::NegativeInt => "negative integer",
            DataType::Float => "float",
            DataType::Uuid => "UUID",
            DataType::Time => "time",
            DataType::List => "list",
            DataType::Map => "map",
            DataType::Markup => "markup",
            DataType::Metadata => "metadata",
            DataType::Comment => "comment",
            DataType::Marker => "marker",
            DataType::Reference => "reference",
            DataType::End => "end of container",
            DataType::Bytes => "bytes",
            DataType::String => "string",
            DataType::Uri => "URI",
            DataType::Custom => "custom",
            DataType::ArrayChunk => "array chunk",
            DataType::ArrayData => "array data",
            DataType::EndDocument => "end of document",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of [`DataType`] categories.
///
/// Also used to describe a completed object: normally a single category, or
/// [`CategorySet::ANY_OBJECT`] when a reference points outside the document.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CategorySet(u32);

impl CategorySet {
    pub const EMPTY: CategorySet = CategorySet(0);

    /// Annotations that may appear almost anywhere without occupying a slot.
    pub const PSEUDO: CategorySet = CategorySet::of(DataType::Padding)
        .with(DataType::Comment)
        .with(DataType::Metadata);

    /// Every complete object a document slot can hold.
    pub const ANY_OBJECT: CategorySet = CategorySet::of(DataType::Nil)
        .with(DataType::Bool)
        .with(DataType::PositiveInt)
        .with(DataType::NegativeInt)
        .with(DataType::Float)
        .with(DataType::Uuid)
        .with(DataType::Time)
        .with(DataType::List)
        .with(DataType::Map)
        .with(DataType::Markup)
        .with(DataType::Bytes)
        .with(DataType::String)
        .with(DataType::Uri)
        .with(DataType::Custom);

    /// Object categories that may be used as map or attribute keys.
    pub const KEYABLE: CategorySet = CategorySet::of(DataType::Bool)
        .with(DataType::PositiveInt)
        .with(DataType::NegativeInt)
        .with(DataType::Uuid)
        .with(DataType::Time)
        .with(DataType::String)
        .with(DataType::Uri);

    #[inline]
    pub const fn of(data_type: DataType) -> Self {
        CategorySet(data_type.bit())
    }

    #[inline]
    pub const fn with(self, data_type: DataType) -> Self {
        CategorySet(self.0 | data_type.bit())
    }

    #[inline]
    pub const fn union(self, other: CategorySet) -> Self {
        CategorySet(self.0 | other.0)
    }

    #[inline]
    pub const fn contains(self, data_type: DataType) -> bool {
        self.0 & data_type.bit() != 0
    }

    #[inline]
    pub const fn intersects(self, other: CategorySet) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<DataType> for CategorySet {
    fn from(data_type: DataType) -> Self {
        CategorySet::of(data_type)
    }
}

impl fmt::Debug for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for bit in 0..=DataType::EndDocument as u8 {
            if self.0 & (1 << bit) != 0 {
                set.entry(&ALL_TYPES[bit as usize]);
            }
        }
        set.finish()
    }
}

const ALL_TYPES: [DataType; 24] = [
    DataType::Version,
    DataType::Padding,
    DataType::Nil,
    DataType::Bool,
    DataType::PositiveInt,
    DataType::NegativeInt,
    DataType::Float,
    DataType::Uuid,
    DataType::Time,
    DataType::List,
    DataType::Map,
    DataType::Markup,
    DataType::Metadata,
    DataType::Comment,
    DataType::Marker,
    DataType::Reference,
    DataType::End,
    DataType::Bytes,
    DataType::String,
    DataType::Uri,
    DataType::Custom,
    DataType::ArrayChunk,
    DataType::ArrayData,
    DataType::EndDocument,
];

const ALLOW_ANY: CategorySet = CategorySet::ANY_OBJECT
    .union(CategorySet::PSEUDO)
    .with(DataType::Marker)
    .with(DataType::Reference);

const ALLOW_KEY: CategorySet = CategorySet::KEYABLE
    .union(CategorySet::PSEUDO)
    .with(DataType::Marker)
    .with(DataType::Reference)
    .with(DataType::End);

const ALLOW_LIST_ITEM: CategorySet = ALLOW_ANY.with(DataType::End);

const ALLOW_MARKUP_NAME: CategorySet = CategorySet::of(DataType::PositiveInt)
    .with(DataType::String)
    .with(DataType::Padding);

const ALLOW_MARKUP_CONTENTS: CategorySet = CategorySet::of(DataType::String)
    .with(DataType::Markup)
    .with(DataType::Comment)
    .with(DataType::Padding)
    .with(DataType::End);

const ALLOW_COMMENT_CONTENTS: CategorySet = CategorySet::of(DataType::String)
    .with(DataType::Comment)
    .with(DataType::Padding)
    .with(DataType::End);

// Negative integers are admitted so that they fail as bad identifiers rather
// than as grammar errors.
const ALLOW_MARKER_ID: CategorySet = CategorySet::of(DataType::PositiveInt)
    .with(DataType::NegativeInt)
    .with(DataType::String)
    .with(DataType::Padding);

const ALLOW_REFERENCE_ID: CategorySet = ALLOW_MARKER_ID.with(DataType::Uri);

const ALLOW_MARKED_OBJECT: CategorySet = CategorySet::ANY_OBJECT.union(CategorySet::PSEUDO);

const ALLOW_END_DOCUMENT: CategorySet = CategorySet::of(DataType::EndDocument)
    .with(DataType::Comment)
    .with(DataType::Padding);

/// Identity of a grammar state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateId {
    AwaitingVersion,
    AwaitingTopObject,
    AwaitingEndDocument,
    DocumentEnded,
    AwaitingListItem,
    AwaitingMapKey,
    AwaitingMapValue,
    AwaitingMarkupName,
    AwaitingMarkupKey,
    AwaitingMarkupValue,
    AwaitingMarkupContents,
    AwaitingMetadataKey,
    AwaitingMetadataValue,
    AwaitingMetadataObject,
    AwaitingCommentContents,
    AwaitingMarkerId,
    AwaitingMarkedObject,
    AwaitingReferenceId,
    AwaitingArrayChunk,
    AwaitingArrayData,
}

/// One frame of the rule engine's container stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleState {
    pub id: StateId,
    pub allowed: CategorySet,
    /// The state occupies a grammar slot; transparent wrappers delegate to it.
    pub is_real_container: bool,
    /// The next scalar or array completed here is a marker or reference ID.
    pub is_awaiting_id: bool,
}

impl RuleState {
    #[inline]
    pub const fn allows(&self, data_type: DataType) -> bool {
        self.allowed.contains(data_type)
    }
}

/// What happens to a state once one of its children has completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Replace(StateId),
    Pop,
}

impl StateId {
    /// Returns the full rule state for this identity.
    pub const fn state(self) -> RuleState {
        let (allowed, is_real_container, is_awaiting_id) = match self {
            StateId::AwaitingVersion => (CategorySet::of(DataType::Version), false, false),
            StateId::AwaitingTopObject => (ALLOW_ANY, true, false),
            StateId::AwaitingEndDocument => (ALLOW_END_DOCUMENT, false, false),
            StateId::DocumentEnded => (CategorySet::EMPTY, false, false),
            StateId::AwaitingListItem => (ALLOW_LIST_ITEM, true, false),
            StateId::AwaitingMapKey => (ALLOW_KEY, true, false),
            StateId::AwaitingMapValue => (ALLOW_ANY, true, false),
            StateId::AwaitingMarkupName => (ALLOW_MARKUP_NAME, true, false),
            StateId::AwaitingMarkupKey => (ALLOW_KEY, true, false),
            StateId::AwaitingMarkupValue => (ALLOW_ANY, true, false),
            StateId::AwaitingMarkupContents => (ALLOW_MARKUP_CONTENTS, true, false),
            StateId::AwaitingMetadataKey => (ALLOW_KEY, true, false),
            StateId::AwaitingMetadataValue => (ALLOW_ANY, true, false),
            StateId::AwaitingMetadataObject => (ALLOW_ANY, false, false),
            StateId::AwaitingCommentContents => (ALLOW_COMMENT_CONTENTS, false, false),
            StateId::AwaitingMarkerId => (ALLOW_MARKER_ID, false, true),
            StateId::AwaitingMarkedObject => (ALLOW_MARKED_OBJECT, false, false),
            StateId::AwaitingReferenceId => (ALLOW_REFERENCE_ID, false, true),
            StateId::AwaitingArrayChunk => (CategorySet::of(DataType::ArrayChunk), false, false),
            StateId::AwaitingArrayData => (CategorySet::of(DataType::ArrayData), false, false),
        };
        RuleState {
            id: self,
            allowed,
            is_real_container,
            is_awaiting_id,
        }
    }

    /// The transition applied when a child object completes in this state.
    pub const fn successor(self) -> Transition {
        match self {
            StateId::AwaitingTopObject => Transition::Pop,
            StateId::AwaitingMapKey => Transition::Replace(StateId::AwaitingMapValue),
            StateId::AwaitingMapValue => Transition::Replace(StateId::AwaitingMapKey),
            StateId::AwaitingMarkupName => Transition::Replace(StateId::AwaitingMarkupKey),
            StateId::AwaitingMarkupKey => Transition::Replace(StateId::AwaitingMarkupValue),
            StateId::AwaitingMarkupValue => Transition::Replace(StateId::AwaitingMarkupKey),
            StateId::AwaitingMetadataKey => Transition::Replace(StateId::AwaitingMetadataValue),
            StateId::AwaitingMetadataValue => Transition::Replace(StateId::AwaitingMetadataKey),
            StateId::AwaitingMarkerId => Transition::Replace(StateId::AwaitingMarkedObject),
            StateId::AwaitingMetadataObject
            | StateId::AwaitingMarkedObject
            | StateId::AwaitingReferenceId => Transition::Pop,
            _ => Transition::Stay,
        }
    }

    /// States whose checks are delegated to the nearest real container below.
    pub const fn is_transparent(self) -> bool {
        matches!(
            self,
            StateId::AwaitingMetadataObject | StateId::AwaitingMarkedObject
        )
    }

    /// States that hold a value slot which `End` would leave unfilled.
    pub const fn is_value_slot(self) -> bool {
        matches!(
            self,
            StateId::AwaitingMapValue
                | StateId::AwaitingMarkupValue
                | StateId::AwaitingMetadataValue
                | StateId::AwaitingMetadataObject
                | StateId::AwaitingMarkedObject
        )
    }

    /// The version and end-of-document states seeded at reset.
    pub const fn is_document_level(self) -> bool {
        matches!(
            self,
            StateId::AwaitingVersion
                | StateId::AwaitingTopObject
                | StateId::AwaitingEndDocument
                | StateId::DocumentEnded
        )
    }

    const fn description(self) -> &'static str {
        match self {
            StateId::AwaitingVersion => "awaiting version",
            StateId::AwaitingTopObject => "awaiting top-level object",
            StateId::AwaitingEndDocument => "awaiting end of document",
            StateId::DocumentEnded => "document ended",
            StateId::AwaitingListItem => "awaiting list item",
            StateId::AwaitingMapKey => "awaiting map key",
            StateId::AwaitingMapValue => "awaiting map value",
            StateId::AwaitingMarkupName => "awaiting markup name",
            StateId::AwaitingMarkupKey => "awaiting markup attribute key",
            StateId::AwaitingMarkupValue => "awaiting markup attribute value",
            StateId::AwaitingMarkupContents => "awaiting markup contents",
            StateId::AwaitingMetadataKey => "awaiting metadata key",
            StateId::AwaitingMetadataValue => "awaiting metadata value",
            StateId::AwaitingMetadataObject => "awaiting object following metadata",
            StateId::AwaitingCommentContents => "awaiting comment contents",
            StateId::AwaitingMarkerId => "awaiting marker ID",
            StateId::AwaitingMarkedObject => "awaiting marked object",
            StateId::AwaitingReferenceId => "awaiting reference ID",
            StateId::AwaitingArrayChunk => "awaiting array chunk header",
            StateId::AwaitingArrayData => "awaiting array chunk data",
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_table_matches_discriminants() {
        for (i, data_type) in ALL_TYPES.iter().enumerate() {
            assert_eq!(*data_type as usize, i);
        }
    }

    #[test]
    fn test_map_key_rejects_unkeyable_types() {
        let key = StateId::AwaitingMapKey.state();
        for data_type in [
            DataType::Nil,
            DataType::Float,
            DataType::List,
            DataType::Map,
            DataType::Markup,
            DataType::Bytes,
            DataType::Custom,
        ] {
            assert!(!key.allows(data_type), "{data_type} should not be keyable");
        }
        for data_type in [
            DataType::Bool,
            DataType::PositiveInt,
            DataType::String,
            DataType::Reference,
            DataType::Marker,
            DataType::End,
        ] {
            assert!(key.allows(data_type), "{data_type} should be keyable");
        }
    }

    #[test]
    fn test_value_slots_do_not_accept_end() {
        for id in [
            StateId::AwaitingMapValue,
            StateId::AwaitingMarkupValue,
            StateId::AwaitingMetadataValue,
            StateId::AwaitingMetadataObject,
            StateId::AwaitingMarkedObject,
        ] {
            assert!(id.is_value_slot());
            assert!(!id.state().allows(DataType::End));
        }
    }

    #[test]
    fn test_id_states_flagged() {
        assert!(StateId::AwaitingMarkerId.state().is_awaiting_id);
        assert!(StateId::AwaitingReferenceId.state().is_awaiting_id);
        assert!(!StateId::AwaitingMarkerId.state().allows(DataType::Uri));
        assert!(StateId::AwaitingReferenceId.state().allows(DataType::Uri));
        assert!(!StateId::AwaitingListItem.state().is_awaiting_id);
    }

    #[test]
    fn test_successor_table() {
        assert_eq!(
            StateId::AwaitingMapKey.successor(),
            Transition::Replace(StateId::AwaitingMapValue)
        );
        assert_eq!(
            StateId::AwaitingMapValue.successor(),
            Transition::Replace(StateId::AwaitingMapKey)
        );
        assert_eq!(StateId::AwaitingListItem.successor(), Transition::Stay);
        assert_eq!(StateId::AwaitingTopObject.successor(), Transition::Pop);
    }

    #[test]
    fn test_category_set_operations() {
        let set = CategorySet::of(DataType::Bool).with(DataType::String);
        assert!(set.contains(DataType::Bool));
        assert!(!set.contains(DataType::List));
        assert!(set.intersects(CategorySet::KEYABLE));
        assert!(!set.intersects(CategorySet::of(DataType::Map)));
        assert!(CategorySet::EMPTY.is_empty());
        assert_eq!(format!("{:?}", set), "{Bool, String}");
    }
}
