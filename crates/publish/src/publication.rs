//! Recursive publication tree.
//!
//! A `Publication` mirrors one level of a composite query hierarchy, bound
//! to the specific document that spawned it (or to the subscription
//! arguments at the root). Each node owns a live cursor over its query's
//! result set and one set of child nodes per matched document; children are
//! created lazily when a document first appears and torn down when it
//! disappears or is replaced.
//!
//! When a governing document changes, the arguments of every child query
//! beneath it change with it, which may change each child's result set
//! entirely. `republish` reconciles that: it compares the ids published
//! before and after re-resolution and releases exactly the ids that dropped
//! out, leaving surviving ids untouched.

use crate::channel::OutputChannel;
use crate::composite::CompositeQuery;
use crate::cursor::{Arg, DocumentCursor, DocumentObserver, FieldObserver, ObserverHandle};
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use canopy_core::{DocId, Document};
use core::cell::RefCell;
use hashbrown::{HashMap, HashSet};

/// Shared handle to a publication node.
///
/// Nodes are shared between the tree and the observer callbacks that feed
/// them; callbacks hold weak references so a torn-down node goes away with
/// its last handle.
pub type PublicationHandle = Rc<RefCell<Publication>>;

/// One level of the query hierarchy, bound to a governing document (or to
/// the subscription arguments at the root).
pub struct Publication {
    channel: Rc<RefCell<OutputChannel>>,
    query: Rc<CompositeQuery>,
    args: Vec<Arg>,
    cursor: Option<Box<dyn DocumentCursor>>,
    collection: Option<String>,
    observers: Vec<ObserverHandle>,
    /// One entry per currently published document, holding the child nodes
    /// spawned for it (empty under a leaf). Presence doubles as the
    /// already-published guard: a re-delivered document routes through
    /// `changed` instead of a second refcount-incrementing `added`.
    published: HashMap<DocId, Vec<PublicationHandle>>,
}

impl Publication {
    /// Creates an unpublished node.
    pub fn new(
        channel: Rc<RefCell<OutputChannel>>,
        query: Rc<CompositeQuery>,
        args: Vec<Arg>,
    ) -> PublicationHandle {
        Rc::new(RefCell::new(Self {
            channel,
            query,
            args,
            cursor: None,
            collection: None,
            observers: Vec::new(),
            published: HashMap::new(),
        }))
    }

    /// Ids currently published by this node.
    pub fn published_ids(&self) -> HashSet<DocId> {
        self.published.keys().cloned().collect()
    }

    /// Returns true if the node holds a live cursor.
    #[inline]
    pub fn is_publishing(&self) -> bool {
        self.cursor.is_some()
    }

    /// Returns the arguments the node's query is bound to.
    #[inline]
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Resolves the bound query and begins observing its result set.
    ///
    /// A declining query leaves the node inert: no observers, no children.
    /// That is a valid terminal state, not an error. The current result set
    /// arrives as synchronous `added` calls while the observer registers, so
    /// the initial documents are published before this returns.
    pub fn publish(node: &PublicationHandle) {
        let cursor = {
            let n = node.borrow();
            (n.query.find)(&n.args)
        };
        let Some(cursor) = cursor else {
            return;
        };
        node.borrow_mut().collection = Some(cursor.collection().to_string());

        let weak = Rc::downgrade(node);
        let added_weak = weak.clone();
        let changed_weak = weak.clone();
        let removed_weak = weak.clone();
        let doc_handle = cursor.observe(DocumentObserver {
            added: Box::new(move |doc| {
                if let Some(node) = added_weak.upgrade() {
                    Publication::handle_added(&node, doc);
                }
            }),
            changed: Box::new(move |new_doc| {
                if let Some(node) = changed_weak.upgrade() {
                    Publication::republish_children_of(&node, new_doc);
                }
            }),
            removed: Box::new(move |doc| {
                if let Some(node) = removed_weak.upgrade() {
                    Publication::handle_removed(&node, doc);
                }
            }),
        });

        let field_handle = cursor.observe_changed_fields(FieldObserver {
            changed: Box::new(move |id, fields| {
                if let Some(node) = weak.upgrade() {
                    let (channel, collection) = {
                        let n = node.borrow();
                        (n.channel.clone(), n.collection.clone())
                    };
                    if let Some(collection) = collection {
                        channel.borrow_mut().changed(&collection, id, fields);
                    }
                }
            }),
        });

        let mut n = node.borrow_mut();
        n.observers.push(doc_handle);
        n.observers.push(field_handle);
        n.cursor = Some(cursor);
    }

    /// Stops the node's observers, re-resolves its query with the current
    /// arguments, and reconciles the result sets: every id published before
    /// but absent after is torn down and released through the channel.
    ///
    /// Only ids are compared, never field content. A document replaced by a
    /// different one sharing its id is the query engine's own `changed`
    /// event to report.
    pub fn republish(node: &PublicationHandle) {
        let before = {
            let mut n = node.borrow_mut();
            n.observers.clear();
            n.cursor = None;
            n.published_ids()
        };

        Publication::publish(node);

        let after: HashSet<DocId> = {
            let n = node.borrow();
            match n.cursor.as_ref() {
                Some(cursor) => cursor
                    .snapshot()
                    .into_iter()
                    .map(|doc| doc.id().clone())
                    .collect(),
                None => HashSet::new(),
            }
        };

        for id in dropped_ids(&before, &after) {
            Publication::unpublish_children_of(node, &id);
            let (channel, collection) = {
                let n = node.borrow();
                (n.channel.clone(), n.collection.clone().unwrap_or_default())
            };
            channel.borrow_mut().removed(&collection, &id);
        }
    }

    /// Stops observing, releases every document this node still publishes,
    /// then tears down all child nodes. After this returns neither the node
    /// nor its descendants claim any document.
    pub fn unpublish(node: &PublicationHandle) {
        let (channel, collection, published) = {
            let mut n = node.borrow_mut();
            n.observers.clear();
            n.cursor = None;
            (
                n.channel.clone(),
                n.collection.clone().unwrap_or_default(),
                core::mem::take(&mut n.published),
            )
        };

        for id in published.keys() {
            channel.borrow_mut().removed(&collection, id);
        }
        for children in published.values() {
            for child in children {
                Publication::unpublish(child);
            }
        }
    }

    fn handle_added(node: &PublicationHandle, doc: &Document) {
        let (channel, collection, already_published) = {
            let n = node.borrow();
            (
                n.channel.clone(),
                n.collection.clone().unwrap_or_default(),
                n.published.contains_key(doc.id()),
            )
        };

        if already_published {
            // Same id re-delivered while still tracked (republish, or an
            // engine re-add that outran its remove): the content goes out as
            // a change, never a second claim.
            channel
                .borrow_mut()
                .changed(&collection, doc.id(), doc.fields());
            Publication::republish_children_of(node, doc);
        } else {
            channel.borrow_mut().added(&collection, doc);
            let children = Publication::spawn_children(node, doc);
            node.borrow_mut()
                .published
                .insert(doc.id().clone(), children.clone());
            for child in &children {
                Publication::publish(child);
            }
        }
    }

    fn handle_removed(node: &PublicationHandle, doc: &Document) {
        Publication::unpublish_children_of(node, doc.id());
        let (channel, collection) = {
            let n = node.borrow();
            (n.channel.clone(), n.collection.clone().unwrap_or_default())
        };
        channel.borrow_mut().removed(&collection, doc.id());
    }

    /// Builds (but does not publish) one child node per declared child
    /// query, each bound to the governing document followed by this node's
    /// own arguments.
    fn spawn_children(node: &PublicationHandle, doc: &Document) -> Vec<PublicationHandle> {
        let n = node.borrow();
        n.query
            .children
            .iter()
            .map(|child_query| {
                let mut args = Vec::with_capacity(n.args.len() + 1);
                args.push(Arg::Document(doc.clone()));
                args.extend(n.args.iter().cloned());
                Publication::new(n.channel.clone(), child_query.clone(), args)
            })
            .collect()
    }

    /// Re-resolves every child of the given document with the new document
    /// as the leading argument.
    fn republish_children_of(node: &PublicationHandle, doc: &Document) {
        let children = {
            let n = node.borrow();
            n.published.get(doc.id()).cloned().unwrap_or_default()
        };
        for child in children {
            child.borrow_mut().args[0] = Arg::Document(doc.clone());
            Publication::republish(&child);
        }
    }

    /// Recursively tears down the children spawned for a document and drops
    /// its published entry, clearing the already-published guard.
    fn unpublish_children_of(node: &PublicationHandle, id: &DocId) {
        let children = node.borrow_mut().published.remove(id).unwrap_or_default();
        for child in children {
            Publication::unpublish(&child);
        }
    }
}

/// Ids present in `before` but absent from `after`: the documents a
/// republished node must release.
pub fn dropped_ids(before: &HashSet<DocId>, after: &HashSet<DocId>) -> Vec<DocId> {
    before.difference(after).cloned().collect()
}
