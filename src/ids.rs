//! Marker and reference identifiers.
//!
//! Identifiers are resolved in two phases without ever rescanning the
//! document. While an ID value is being received it is pushed onto the
//! unassigned stack; when its marker's object completes the ID is bound to
//! that object's category, and when a reference completes its ID is looked up
//! to find the category the reference stands for.

use crate::states::{CategorySet, DataType};
use crate::{Error, Result};
use num_bigint::{BigInt, Sign};
use std::collections::HashMap;
use std::fmt;

/// The value naming a marker or reference target.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Identifier {
    Int(u64),
    String(String),
    /// External target; only valid in references.
    Uri(String),
}

impl Identifier {
    /// Converts an integer of arbitrary width to an identifier.
    ///
    /// # Errors
    ///
    /// Fails for negative values and values wider than 64 bits.
    pub fn from_big_int(value: &BigInt) -> Result<Self> {
        if value.sign() == Sign::Minus {
            return Err(Error::invalid_identifier("ID cannot be negative"));
        }
        u64::try_from(value.magnitude())
            .map(Identifier::Int)
            .map_err(|_| Error::invalid_identifier("ID does not fit in 64 bits"))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Int(v) => write!(f, "{}", v),
            Identifier::String(s) => write!(f, "{}", s),
            Identifier::Uri(u) => write!(f, "{}", u),
        }
    }
}

/// Identifier bookkeeping for one document.
#[derive(Debug, Default)]
pub(crate) struct IdTables {
    unassigned: Vec<Identifier>,
    assigned: HashMap<Identifier, CategorySet>,
    /// Markers whose object has begun but not completed, by the category it began with.
    in_progress: HashMap<Identifier, Option<CategorySet>>,
}

impl IdTables {
    pub fn clear(&mut self) {
        self.unassigned.clear();
        self.assigned.clear();
        self.in_progress.clear();
    }

    pub fn push_unassigned(&mut self, id: Identifier) {
        self.unassigned.push(id);
    }

    pub fn pop_unassigned(&mut self) -> Option<Identifier> {
        self.unassigned.pop()
    }

    /// Registers the ID just received for a marker, rejecting duplicates.
    pub fn begin_marker(&mut self) -> Result<()> {
        let Some(id) = self.unassigned.last() else {
            return Ok(());
        };
        if self.assigned.contains_key(id) || self.in_progress.contains_key(id) {
            return Err(Error::DuplicateMarker(id.clone()));
        }
        self.in_progress.insert(id.clone(), None);
        Ok(())
    }

    /// Records the category the innermost pending marker's object began with.
    pub fn marked_object_began(&mut self, data_type: DataType) {
        if let Some(id) = self.unassigned.last() {
            if let Some(slot) = self.in_progress.get_mut(id) {
                slot.get_or_insert(CategorySet::of(data_type));
            }
        }
    }

    /// Binds a marker ID to the category of its completed object.
    pub fn assign(&mut self, id: Identifier, kind: CategorySet) -> Result<()> {
        self.in_progress.remove(&id);
        if self.assigned.contains_key(&id) {
            return Err(Error::DuplicateMarker(id));
        }
        self.assigned.insert(id, kind);
        Ok(())
    }

    /// Finds the categories a reference to `id` may stand for.
    pub fn resolve(&self, id: &Identifier) -> Result<CategorySet> {
        if let Identifier::Uri(_) = id {
            return Ok(CategorySet::ANY_OBJECT);
        }
        if let Some(kind) = self.assigned.get(id) {
            return Ok(*kind);
        }
        // A reference from inside its own marker's object.
        if let Some(Some(kind)) = self.in_progress.get(id) {
            return Ok(*kind);
        }
        Err(Error::UnknownReference(id.clone()))
    }
}
