//! Live subscription registry shared by the document store implementations.
//!
//! # Invariants
//! - Every delivery is a full result set for the subscription's query.
//! - A dropped `Subscription` receives nothing further and is removed from
//!   its registry.
//! - Readers keep only the newest pending result set (last push wins).

use crate::logging::error_detail;
use crate::store::{Document, DocumentQuery, StoreResult};
use log::warn;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Newest undelivered result set of one subscription.
type Slot = Rc<RefCell<Option<Vec<Document>>>>;

struct Entry {
    id: u64,
    query: DocumentQuery,
    slot: Slot,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

/// Fan-out point owned by a store.
#[derive(Default)]
pub(crate) struct SubscriptionHub {
    registry: Rc<RefCell<Registry>>,
}

impl SubscriptionHub {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers `query` with `initial` as its pending delivery.
    pub(crate) fn register(&self, query: DocumentQuery, initial: Vec<Document>) -> Subscription {
        let slot: Slot = Rc::new(RefCell::new(Some(initial)));

        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.entries.push(Entry {
            id,
            query,
            slot: Rc::clone(&slot),
        });

        Subscription {
            id,
            slot,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Re-runs every subscription on `collection` and overwrites its slot.
    ///
    /// A failing re-run is logged and skipped; the write that triggered it
    /// already succeeded.
    pub(crate) fn publish(
        &self,
        collection: &str,
        run: impl Fn(&DocumentQuery) -> StoreResult<Vec<Document>>,
    ) {
        let targets: Vec<(u64, DocumentQuery, Slot)> = self
            .registry
            .borrow()
            .entries
            .iter()
            .filter(|entry| entry.query.collection == collection)
            .map(|entry| (entry.id, entry.query.clone(), Rc::clone(&entry.slot)))
            .collect();

        for (id, query, slot) in targets {
            match run(&query) {
                Ok(documents) => {
                    slot.replace(Some(documents));
                }
                Err(err) => warn!(
                    "event=subscription_push module=store status=error subscription_id={id} collection={collection} error={}",
                    error_detail(&err)
                ),
            }
        }
    }

    pub(crate) fn active_count(&self) -> usize {
        self.registry.borrow().entries.len()
    }
}

/// Handle to a standing query. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    slot: Slot,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    /// Takes the newest undelivered result set, if any.
    pub fn try_latest(&self) -> Option<Vec<Document>> {
        self.slot.take()
    }

    fn has_pending(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .borrow_mut()
                .entries
                .retain(|entry| entry.id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("pending", &self.has_pending())
            .finish()
    }
}
