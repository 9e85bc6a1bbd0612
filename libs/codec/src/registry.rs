//! Message type registry and factory
//!
//! The registry is the single source of truth for the statically-known list
//! of candidate message types: every entry pairs a wire identifier with a
//! concrete Rust type and a constructor. Types sharing an identifier are
//! disambiguated by their ordinal - the declaration order in which they were
//! registered. The lookup index is sorted by `(id, ordinal)` and is stable
//! and deterministic for a given registration sequence.

use std::any::TypeId;
use thiserror::Error;
use wire_types::{AnyMessage, FrameError, GenericMessage, MsgId, MsgPtr, StaticMsgId};

type Constructor = Box<dyn Fn() -> Option<MsgPtr> + Send + Sync>;

/// One candidate message type known to the registry
pub struct MsgEntry {
    pub id: MsgId,
    /// Declaration order among entries sharing `id`, starting at 0
    pub ordinal: usize,
    pub type_id: TypeId,
    pub type_name: &'static str,
    create: Constructor,
}

impl std::fmt::Debug for MsgEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MsgEntry")
            .field("id", &self.id)
            .field("ordinal", &self.ordinal)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Why the factory could not produce a message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CreateError {
    #[error("no message type registered for id {id:#x} at index {idx}")]
    UnknownId { id: MsgId, idx: usize },

    #[error("constructor for message id {id:#x} (index {idx}) declined allocation")]
    AllocFailure { id: MsgId, idx: usize },
}

impl From<CreateError> for FrameError {
    fn from(err: CreateError) -> Self {
        match err {
            CreateError::UnknownId { id, .. } => FrameError::InvalidMsgId { id },
            CreateError::AllocFailure { id, idx } => FrameError::AllocFailure {
                id,
                reason: format!("constructor at index {idx} declined allocation"),
            },
        }
    }
}

/// Registry of candidate message types, consumed by the ID layer and the factory
pub struct MsgRegistry {
    entries: Vec<MsgEntry>,
    /// Indices into `entries`, sorted by (id, ordinal)
    sorted: Vec<usize>,
    fallback: bool,
}

impl std::fmt::Debug for MsgRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MsgRegistry")
            .field("entries", &self.entries)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl MsgRegistry {
    pub fn builder() -> MsgRegistryBuilder {
        MsgRegistryBuilder {
            entries: Vec::new(),
            fallback: false,
        }
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[MsgEntry] {
        &self.entries
    }

    /// Contiguous run of entry indices for `id`, in ordinal order
    fn run(&self, id: MsgId) -> &[usize] {
        let start = self.sorted.partition_point(|&i| self.entries[i].id < id);
        let end = self.sorted.partition_point(|&i| self.entries[i].id <= id);
        &self.sorted[start..end]
    }

    /// Number of registered candidates sharing `id`
    pub fn candidate_count(&self, id: MsgId) -> usize {
        self.run(id).len()
    }

    /// Candidate entry for `(id, idx)`
    pub fn entry(&self, id: MsgId, idx: usize) -> Option<&MsgEntry> {
        self.run(id).get(idx).map(|&i| &self.entries[i])
    }

    /// Construct the message registered for `(id, idx)`
    pub fn create_msg(&self, id: MsgId, idx: usize) -> Result<MsgPtr, CreateError> {
        let entry = self.entry(id, idx).ok_or(CreateError::UnknownId { id, idx })?;
        (entry.create)().ok_or(CreateError::AllocFailure { id, idx })
    }

    /// Whether fallback construction is enabled
    pub fn has_fallback(&self) -> bool {
        self.fallback
    }

    /// Generic fallback message for an unroutable or unreadable frame
    pub fn fallback_msg(&self, id: MsgId) -> Option<MsgPtr> {
        self.fallback
            .then(|| Box::new(GenericMessage::new(id)) as MsgPtr)
    }
}

/// Declaration-ordered builder for [`MsgRegistry`]
pub struct MsgRegistryBuilder {
    entries: Vec<MsgEntry>,
    fallback: bool,
}

impl MsgRegistryBuilder {
    /// Register a default-constructible message type under its static ID
    pub fn register<M>(self) -> Self
    where
        M: AnyMessage + StaticMsgId + Default + 'static,
    {
        self.register_with::<M>(|| Some(Box::new(M::default())))
    }

    /// Register a message type with a custom (possibly fallible) constructor
    ///
    /// A pool-backed constructor returns `None` when its pool is exhausted,
    /// surfacing as an allocation failure to the caller.
    pub fn register_with<M>(
        mut self,
        create: impl Fn() -> Option<MsgPtr> + Send + Sync + 'static,
    ) -> Self
    where
        M: AnyMessage + StaticMsgId + 'static,
    {
        let ordinal = self
            .entries
            .iter()
            .filter(|e| e.id == M::MSG_ID)
            .count();
        self.entries.push(MsgEntry {
            id: M::MSG_ID,
            ordinal,
            type_id: TypeId::of::<M>(),
            type_name: std::any::type_name::<M>(),
            create: Box::new(create),
        });
        self
    }

    /// Produce a [`GenericMessage`] instead of failing on unknown/unreadable IDs
    pub fn with_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }

    pub fn build(self) -> MsgRegistry {
        let mut sorted: Vec<usize> = (0..self.entries.len()).collect();
        sorted.sort_by_key(|&i| (self.entries[i].id, self.entries[i].ordinal));
        MsgRegistry {
            entries: self.entries,
            sorted,
            fallback: self.fallback,
        }
    }
}
