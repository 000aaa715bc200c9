//! In-memory observable document collection.
//!
//! Documents live in insertion order, so cursor snapshots are
//! deterministic. Observers are registered per cursor filter and notified
//! synchronously, in registration order, as mutations land.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use canopy_core::{DocId, Document, Error, Fields, Result};
use canopy_publish::cursor::{DocumentCursor, DocumentObserver, FieldObserver, ObserverHandle};
use core::cell::RefCell;

/// Predicate selecting documents for a live query.
pub type DocFilter = Rc<dyn Fn(&Document) -> bool>;

enum ObserverKind {
    Document(DocumentObserver),
    Fields(FieldObserver),
}

struct RegisteredObserver {
    filter: DocFilter,
    kind: ObserverKind,
}

struct CollectionInner {
    name: String,
    docs: Vec<Document>,
    observers: Vec<(u64, Rc<RegisteredObserver>)>,
    next_observer_id: u64,
}

/// A named, insertion-ordered document store with live cursors.
///
/// Mutations notify matching observers synchronously before returning, one
/// observer at a time in registration order. Callers keep document ids
/// unique within the collection.
#[derive(Clone)]
pub struct MemoryCollection {
    inner: Rc<RefCell<CollectionInner>>,
}

impl MemoryCollection {
    /// Creates an empty collection with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CollectionInner {
                name: name.into(),
                docs: Vec::new(),
                observers: Vec::new(),
                next_observer_id: 1,
            })),
        }
    }

    /// Returns the collection name.
    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// Returns the number of stored documents.
    pub fn len(&self) -> usize {
        self.inner.borrow().docs.len()
    }

    /// Returns true if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().docs.is_empty()
    }

    /// Returns a copy of a document by id.
    pub fn get(&self, id: &DocId) -> Option<Document> {
        self.inner
            .borrow()
            .docs
            .iter()
            .find(|doc| doc.id() == id)
            .cloned()
    }

    /// Returns the number of live observer registrations.
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// Inserts a document and notifies matching observers with `added`.
    pub fn insert(&self, doc: Document) {
        self.inner.borrow_mut().docs.push(doc.clone());
        self.each_observer(|obs| {
            if (obs.filter)(&doc) {
                if let ObserverKind::Document(o) = &obs.kind {
                    (o.added)(&doc);
                }
            }
        });
    }

    /// Merges fields into a document and routes the change per observer:
    /// still matching observers get a full-document `changed` (and, at the
    /// field level, only the keys whose values actually changed), observers
    /// the document now enters get `added`, observers it leaves get
    /// `removed`.
    pub fn update(&self, id: &DocId, fields: &Fields) -> Result<()> {
        let (old_doc, new_doc) = {
            let mut inner = self.inner.borrow_mut();
            let name = inner.name.clone();
            let Some(doc) = inner.docs.iter_mut().find(|doc| doc.id() == id) else {
                return Err(Error::not_found(name, id.clone()));
            };
            let old = doc.clone();
            doc.apply(fields);
            (old, doc.clone())
        };

        let mut changed = Fields::new();
        for (name, value) in fields.iter() {
            if old_doc.field(name) != Some(value) {
                changed.set(name, value.clone());
            }
        }

        self.each_observer(|obs| {
            let was = (obs.filter)(&old_doc);
            let is = (obs.filter)(&new_doc);
            match &obs.kind {
                ObserverKind::Document(o) => {
                    if was && is {
                        (o.changed)(&new_doc);
                    } else if is {
                        (o.added)(&new_doc);
                    } else if was {
                        (o.removed)(&old_doc);
                    }
                }
                ObserverKind::Fields(o) => {
                    if was && is && !changed.is_empty() {
                        (o.changed)(new_doc.id(), &changed);
                    }
                }
            }
        });
        Ok(())
    }

    /// Removes a document and notifies matching observers with `removed`.
    pub fn remove(&self, id: &DocId) -> Result<Document> {
        let doc = {
            let mut inner = self.inner.borrow_mut();
            let name = inner.name.clone();
            let Some(pos) = inner.docs.iter().position(|doc| doc.id() == id) else {
                return Err(Error::not_found(name, id.clone()));
            };
            inner.docs.remove(pos)
        };

        self.each_observer(|obs| {
            if (obs.filter)(&doc) {
                if let ObserverKind::Document(o) = &obs.kind {
                    (o.removed)(&doc);
                }
            }
        });
        Ok(doc)
    }

    /// Returns a live cursor over the documents matching the predicate.
    pub fn find(&self, filter: impl Fn(&Document) -> bool + 'static) -> Box<dyn DocumentCursor> {
        Box::new(MemoryCursor {
            inner: self.inner.clone(),
            name: self.inner.borrow().name.clone(),
            filter: Rc::new(filter),
        })
    }

    /// Returns a live cursor over every document in the collection.
    pub fn find_all(&self) -> Box<dyn DocumentCursor> {
        self.find(|_| true)
    }

    /// Invokes `f` for each observer that was registered when the mutation
    /// landed and is still alive when its turn comes. No collection borrow
    /// is held during the call, so callbacks may register and stop
    /// observers freely.
    fn each_observer(&self, f: impl Fn(&RegisteredObserver)) {
        let snapshot: Vec<(u64, Rc<RegisteredObserver>)> =
            self.inner.borrow().observers.clone();
        for (id, obs) in snapshot {
            let alive = self
                .inner
                .borrow()
                .observers
                .iter()
                .any(|(oid, _)| *oid == id);
            if alive {
                f(&obs);
            }
        }
    }
}

struct MemoryCursor {
    inner: Rc<RefCell<CollectionInner>>,
    name: String,
    filter: DocFilter,
}

impl MemoryCursor {
    fn register(&self, observer: Rc<RegisteredObserver>) -> ObserverHandle {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_observer_id;
            inner.next_observer_id += 1;
            inner.observers.push((id, observer));
            id
        };
        let inner = self.inner.clone();
        ObserverHandle::new(move || {
            inner.borrow_mut().observers.retain(|(oid, _)| *oid != id);
        })
    }
}

impl DocumentCursor for MemoryCursor {
    fn collection(&self) -> &str {
        &self.name
    }

    fn snapshot(&self) -> Vec<Document> {
        self.inner
            .borrow()
            .docs
            .iter()
            .filter(|doc| (self.filter)(doc))
            .cloned()
            .collect()
    }

    fn observe(&self, observer: DocumentObserver) -> ObserverHandle {
        let initial = self.snapshot();
        let entry = Rc::new(RegisteredObserver {
            filter: self.filter.clone(),
            kind: ObserverKind::Document(observer),
        });
        let handle = self.register(entry.clone());
        if let ObserverKind::Document(o) = &entry.kind {
            for doc in &initial {
                (o.added)(doc);
            }
        }
        handle
    }

    fn observe_changed_fields(&self, observer: FieldObserver) -> ObserverHandle {
        self.register(Rc::new(RegisteredObserver {
            filter: self.filter.clone(),
            kind: ObserverKind::Fields(observer),
        }))
    }
}
