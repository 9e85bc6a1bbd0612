//! Message dispatch engine
//!
//! Routes a message value to one of N statically-registered handler
//! operations based on its numeric identifier (plus an ordinal for
//! identifier collisions). Three interchangeable strategies are provided;
//! they are semantically equivalent and must select the identical handler
//! for every `(id, ordinal)` pair:
//!
//! - `Polymorphic`: the message's own dynamic type is authoritative; no ID
//!   search happens on the dispatch side
//! - `BinarySearch`: binary search over the `(id, ordinal)`-sorted entry
//!   list, then a scan of the same-ID run by ordinal
//! - `Linear`: declaration-order scan; no sorting precondition, O(N) worst
//!   case, the sensible choice for small N

use std::any::TypeId;
use thiserror::Error;
use wire_types::{AnyMessage, MsgId, StaticMsgId};

/// Handler selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStrategy {
    Polymorphic,
    BinarySearch,
    Linear,
}

/// Dispatch failure, distinguishing "no table entry" from "entry refused"
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No registered handler matches the given identifier/ordinal
    #[error("no handler registered for message id {id:#x} (ordinal {ordinal})")]
    NoMatch { id: MsgId, ordinal: usize },

    /// A handler entry was selected but the message's actual type did not
    /// match the type registered under that identifier/ordinal
    #[error("handler for message id {id:#x} (ordinal {ordinal}) declined the message")]
    Declined { id: MsgId, ordinal: usize },
}

type Thunk<H> = Box<dyn Fn(&mut H, &dyn AnyMessage) -> bool + Send + Sync>;

struct HandlerEntry<H> {
    id: MsgId,
    ordinal: usize,
    type_id: TypeId,
    invoke: Thunk<H>,
}

/// Dispatch table over a statically-known, declaration-ordered candidate list
pub struct Dispatcher<H> {
    entries: Vec<HandlerEntry<H>>,
    /// Indices into `entries`, sorted by (id, ordinal)
    sorted: Vec<usize>,
}

impl<H> Dispatcher<H> {
    pub fn builder() -> DispatcherBuilder<H> {
        DispatcherBuilder {
            entries: Vec::new(),
        }
    }

    /// Number of registered handler entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dispatch on the message's dynamic type alone (polymorphic strategy)
    pub fn dispatch(&self, msg: &dyn AnyMessage, handler: &mut H) -> Result<(), DispatchError> {
        let type_id = msg.as_any().type_id();
        let entry = self
            .entries
            .iter()
            .find(|e| e.type_id == type_id)
            .ok_or(DispatchError::NoMatch {
                id: msg.msg_id(),
                ordinal: 0,
            })?;
        self.invoke(entry, msg, handler)
    }

    /// Dispatch by `(id, ordinal)` with an explicit strategy
    pub fn dispatch_by_id(
        &self,
        strategy: DispatchStrategy,
        id: MsgId,
        ordinal: usize,
        msg: &dyn AnyMessage,
        handler: &mut H,
    ) -> Result<(), DispatchError> {
        match strategy {
            DispatchStrategy::Polymorphic => self.dispatch(msg, handler),
            DispatchStrategy::BinarySearch => {
                let start = self.sorted.partition_point(|&i| self.entries[i].id < id);
                let end = self.sorted.partition_point(|&i| self.entries[i].id <= id);
                let entry = self.sorted[start..end]
                    .iter()
                    .map(|&i| &self.entries[i])
                    .find(|e| e.ordinal == ordinal)
                    .ok_or(DispatchError::NoMatch { id, ordinal })?;
                self.invoke(entry, msg, handler)
            }
            DispatchStrategy::Linear => {
                let entry = self
                    .entries
                    .iter()
                    .filter(|e| e.id == id)
                    .nth(ordinal)
                    .ok_or(DispatchError::NoMatch { id, ordinal })?;
                self.invoke(entry, msg, handler)
            }
        }
    }

    fn invoke(
        &self,
        entry: &HandlerEntry<H>,
        msg: &dyn AnyMessage,
        handler: &mut H,
    ) -> Result<(), DispatchError> {
        if (entry.invoke)(handler, msg) {
            Ok(())
        } else {
            Err(DispatchError::Declined {
                id: entry.id,
                ordinal: entry.ordinal,
            })
        }
    }
}

/// Declaration-ordered builder for [`Dispatcher`]
pub struct DispatcherBuilder<H> {
    entries: Vec<HandlerEntry<H>>,
}

impl<H> DispatcherBuilder<H> {
    /// Register a typed handler operation for message type `M`
    ///
    /// Declaration order among same-ID registrations becomes the ordinal.
    pub fn on<M>(mut self, f: impl Fn(&mut H, &M) + Send + Sync + 'static) -> Self
    where
        M: AnyMessage + StaticMsgId + 'static,
    {
        let ordinal = self
            .entries
            .iter()
            .filter(|e| e.id == M::MSG_ID)
            .count();
        self.entries.push(HandlerEntry {
            id: M::MSG_ID,
            ordinal,
            type_id: TypeId::of::<M>(),
            invoke: Box::new(move |handler, msg| match msg.downcast_ref::<M>() {
                Some(m) => {
                    f(handler, m);
                    true
                }
                None => false,
            }),
        });
        self
    }

    pub fn build(self) -> Dispatcher<H> {
        let mut sorted: Vec<usize> = (0..self.entries.len()).collect();
        sorted.sort_by_key(|&i| (self.entries[i].id, self.entries[i].ordinal));
        Dispatcher {
            entries: self.entries,
            sorted,
        }
    }
}
