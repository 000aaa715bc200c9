//! Recording client sink for tests and demos.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use canopy_core::{DocId, DocKey, Fields};
use canopy_publish::sink::ClientSink;
use core::cell::RefCell;
use hashbrown::HashMap;

/// An event observed downstream of the output channel.
#[derive(Clone, Debug, PartialEq)]
pub enum SinkEvent {
    Added {
        collection: String,
        id: DocId,
        fields: Fields,
    },
    Changed {
        collection: String,
        id: DocId,
        fields: Fields,
    },
    Removed {
        collection: String,
        id: DocId,
    },
    Ready,
}

impl SinkEvent {
    /// Returns the document id the event concerns, if any.
    pub fn id(&self) -> Option<&DocId> {
        match self {
            SinkEvent::Added { id, .. }
            | SinkEvent::Changed { id, .. }
            | SinkEvent::Removed { id, .. } => Some(id),
            SinkEvent::Ready => None,
        }
    }
}

/// Records every sink event and mirrors the client-visible document set.
#[derive(Default)]
pub struct RecordingSink {
    events: RefCell<Vec<SinkEvent>>,
    docs: RefCell<HashMap<DocKey, Fields>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the event log.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.borrow().clone()
    }

    /// Drains and returns the event log.
    pub fn take_events(&self) -> Vec<SinkEvent> {
        core::mem::take(&mut *self.events.borrow_mut())
    }

    /// Number of documents the client currently holds.
    pub fn document_count(&self) -> usize {
        self.docs.borrow().len()
    }

    /// Returns true if the client currently holds the document.
    pub fn has_document(&self, collection: &str, id: &DocId) -> bool {
        self.docs
            .borrow()
            .contains_key(&DocKey::new(collection, id.clone()))
    }

    /// Returns the client's current view of a document's fields.
    pub fn document(&self, collection: &str, id: &DocId) -> Option<Fields> {
        self.docs
            .borrow()
            .get(&DocKey::new(collection, id.clone()))
            .cloned()
    }
}

impl ClientSink for RecordingSink {
    fn added(&self, collection: &str, id: &DocId, fields: &Fields) {
        self.events.borrow_mut().push(SinkEvent::Added {
            collection: collection.to_string(),
            id: id.clone(),
            fields: fields.clone(),
        });
        self.docs
            .borrow_mut()
            .insert(DocKey::new(collection, id.clone()), fields.clone());
    }

    fn changed(&self, collection: &str, id: &DocId, fields: &Fields) {
        self.events.borrow_mut().push(SinkEvent::Changed {
            collection: collection.to_string(),
            id: id.clone(),
            fields: fields.clone(),
        });
        self.docs
            .borrow_mut()
            .entry(DocKey::new(collection, id.clone()))
            .or_default()
            .merge(fields);
    }

    fn removed(&self, collection: &str, id: &DocId) {
        self.events.borrow_mut().push(SinkEvent::Removed {
            collection: collection.to_string(),
            id: id.clone(),
        });
        self.docs
            .borrow_mut()
            .remove(&DocKey::new(collection, id.clone()));
    }

    fn ready(&self) {
        self.events.borrow_mut().push(SinkEvent::Ready);
    }
}
