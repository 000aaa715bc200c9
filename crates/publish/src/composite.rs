//! Composite query declarations and subscription glue.
//!
//! A `CompositeQuery` declares the shape of a publication hierarchy; a
//! `CompositeSubscription` runs one instance of it for one client. The
//! `PublicationRegistry` is the thin bootstrap layer a host server uses to
//! expose publications by name.

use crate::channel::OutputChannel;
use crate::cursor::{Arg, CursorFactory, DocumentCursor};
use crate::publication::{Publication, PublicationHandle};
use crate::sink::ClientSink;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use canopy_core::{Error, Result, Value};
use core::cell::{Cell, RefCell};
use hashbrown::HashMap;

/// One level of a composite query declaration: a query factory plus the
/// child declarations instantiated per matched document.
pub struct CompositeQuery {
    /// Resolves the bound arguments to a live cursor, or declines.
    pub find: CursorFactory,
    /// Child declarations, one set of nodes spawned per matched document.
    pub children: Vec<Rc<CompositeQuery>>,
}

impl CompositeQuery {
    /// Creates a declaration with no children.
    pub fn new(
        find: impl Fn(&[Arg]) -> Option<Box<dyn DocumentCursor>> + 'static,
    ) -> Self {
        Self {
            find: Rc::new(find),
            children: Vec::new(),
        }
    }

    /// Adds a child declaration.
    pub fn with_child(mut self, child: CompositeQuery) -> Self {
        self.children.push(Rc::new(child));
        self
    }
}

/// A running composite subscription: one channel, one publication tree.
///
/// Stopping tears the tree down depth-first, releasing every document it
/// ever published, and then closes the channel. Dropping the subscription
/// stops it.
pub struct CompositeSubscription {
    root: PublicationHandle,
    channel: Rc<RefCell<OutputChannel>>,
    stopped: Cell<bool>,
}

impl CompositeSubscription {
    /// Builds the channel and the root node, publishes the whole tree, and
    /// signals ready. The root arguments are the subscription's own call
    /// arguments.
    pub fn start(
        sink: Rc<dyn ClientSink>,
        query: Rc<CompositeQuery>,
        args: &[Value],
    ) -> Self {
        let channel = Rc::new(RefCell::new(OutputChannel::new(sink)));
        let root_args: Vec<Arg> = args.iter().cloned().map(Arg::Value).collect();
        let root = Publication::new(channel.clone(), query, root_args);
        Publication::publish(&root);
        channel.borrow().ready();

        Self {
            root,
            channel,
            stopped: Cell::new(false),
        }
    }

    /// Tears down the tree and closes the channel. Idempotent.
    pub fn stop(&self) {
        if self.stopped.replace(true) {
            return;
        }
        Publication::unpublish(&self.root);
        self.channel.borrow_mut().close();
    }

    /// Returns true once the subscription has been stopped.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }

    /// Number of documents currently claimed by the tree.
    pub fn tracked(&self) -> usize {
        self.channel.borrow().tracked()
    }
}

impl Drop for CompositeSubscription {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Factory producing a composite declaration from subscription arguments.
pub type CompositeHandler = Rc<dyn Fn(&[Value]) -> Rc<CompositeQuery>>;

/// Named-publication registry: the bootstrap glue between a host server and
/// the publication engine.
pub struct PublicationRegistry {
    handlers: HashMap<String, CompositeHandler>,
}

impl Default for PublicationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PublicationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a named publication. Duplicate names are rejected.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&[Value]) -> Rc<CompositeQuery> + 'static,
    ) -> Result<()> {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(Error::duplicate_publication(name));
        }
        self.handlers.insert(name, Rc::new(handler));
        Ok(())
    }

    /// Removes a named publication. Running subscriptions are unaffected.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    /// Starts a subscription to a named publication.
    pub fn subscribe(
        &self,
        name: &str,
        sink: Rc<dyn ClientSink>,
        args: &[Value],
    ) -> Result<CompositeSubscription> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| Error::unknown_publication(name))?;
        let query = handler(args);
        Ok(CompositeSubscription::start(sink, query, args))
    }

    /// Returns true if a publication is registered under the name.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered publications.
    #[inline]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no publication is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
