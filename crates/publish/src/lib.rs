//! Canopy Publish - Composite live-query publication engine.
//!
//! This crate composes multiple live, hierarchically-nested collection
//! queries into a single outbound change stream for one client, reporting
//! each distinct document at most once even when it is reachable through
//! several independent query paths.
//!
//! # Core Concepts
//!
//! - `DocRefCounter`: Counts the publishing paths currently claiming each
//!   document; a count reaching zero means no path claims it anymore
//! - `OutputChannel`: Diff layer in front of the client sink; suppresses
//!   redundant adds and no-op field changes, and turns the last path release
//!   into the one client-visible removal
//! - `Publication`: A recursive node mirroring one level of the query
//!   hierarchy, bound to the document that spawned it; spawns and tears down
//!   child nodes as documents enter and leave its result set
//! - `CompositeQuery` / `CompositeSubscription`: The declaration tree and the
//!   per-client subscription glue around the root node
//!
//! The query engine behind the cursors and the client channel in front of
//! the sink are both external: this crate only consumes `DocumentCursor`
//! and produces to `ClientSink`.
//!
//! # Example
//!
//! ```ignore
//! use canopy_publish::{CompositeQuery, CompositeSubscription};
//! use alloc::rc::Rc;
//!
//! // Publish every author, and under each author their posts.
//! let query = CompositeQuery::new(move |_args| Some(authors.find_all()))
//!     .with_child(CompositeQuery::new(move |args| {
//!         let author = args[0].as_document()?.clone();
//!         Some(posts.find(move |post| post.field("author") == author.field("name")))
//!     }));
//!
//! let sub = CompositeSubscription::start(sink, Rc::new(query), &[]);
//! // ... live updates flow until ...
//! sub.stop();
//! ```

#![no_std]

extern crate alloc;

pub mod channel;
pub mod composite;
pub mod cursor;
pub mod publication;
pub mod ref_count;
pub mod sink;

pub use channel::OutputChannel;
pub use composite::{CompositeHandler, CompositeQuery, CompositeSubscription, PublicationRegistry};
pub use cursor::{Arg, CursorFactory, DocumentCursor, DocumentObserver, FieldObserver, ObserverHandle};
pub use publication::{Publication, PublicationHandle};
pub use ref_count::{DocRefCounter, RefChangeCallback};
pub use sink::ClientSink;

// Re-export commonly used types from dependencies
pub use canopy_core::{DocId, DocKey, Document, Fields, Value};
