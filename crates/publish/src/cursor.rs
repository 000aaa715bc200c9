//! Query engine interface consumed by the publication tree.
//!
//! The engine behind this seam executes queries and detects changes; the
//! publication tree only resolves factories to live cursors and reacts to
//! their events. Observer callbacks are boxed closures, delivered one at a
//! time in engine order.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use canopy_core::{DocId, Document, Fields, Value};

/// An argument bound to a cursor factory.
///
/// A child query always receives its governing document first, followed by
/// the parent node's own arguments, so ancestor documents accumulate toward
/// the subscription arguments at the tail.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    /// A governing document from an enclosing level of the hierarchy.
    Document(Document),
    /// A plain subscription argument.
    Value(Value),
}

impl Arg {
    /// Returns the document if this is a Document argument, None otherwise.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Arg::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Returns the value if this is a Value argument, None otherwise.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Document> for Arg {
    fn from(doc: Document) -> Self {
        Arg::Document(doc)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

/// A query bound to arguments, yielding a live cursor or declining.
///
/// Declining (returning None) is a valid outcome, not an error: the node
/// that invoked the factory simply stays inert.
pub type CursorFactory = Rc<dyn Fn(&[Arg]) -> Option<Box<dyn DocumentCursor>>>;

/// Document-level observer callbacks.
pub struct DocumentObserver {
    /// A document entered the result set. The current result set is
    /// delivered through this callback during `observe` itself.
    pub added: Box<dyn Fn(&Document)>,
    /// A document's content changed; the full document is re-delivered.
    pub changed: Box<dyn Fn(&Document)>,
    /// A document left the result set.
    pub removed: Box<dyn Fn(&Document)>,
}

/// Field-level observer callback, carrying only the changed keys.
pub struct FieldObserver {
    /// Fields of a matched document changed.
    pub changed: Box<dyn Fn(&DocId, &Fields)>,
}

/// A live, observable result set over one collection.
pub trait DocumentCursor {
    /// Name of the collection the result set draws from.
    fn collection(&self) -> &str;

    /// Deterministic snapshot of the documents currently in the result set.
    fn snapshot(&self) -> Vec<Document>;

    /// Registers document-level callbacks. The current result set is
    /// delivered synchronously as `added` calls before this returns.
    fn observe(&self, observer: DocumentObserver) -> ObserverHandle;

    /// Registers a field-level change callback. No initial delivery.
    fn observe_changed_fields(&self, observer: FieldObserver) -> ObserverHandle;
}

/// Owns one live observer registration.
///
/// Stopping is final; a stopped registration never fires again and cannot be
/// restarted. Dropping the handle stops the registration as well.
pub struct ObserverHandle {
    stop: Option<Box<dyn FnOnce()>>,
}

impl ObserverHandle {
    /// Creates a handle around the engine's stop closure.
    pub fn new(stop: impl FnOnce() + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    /// Stops the registration.
    pub fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}
