//! Canopy Memory - In-memory observable collections for Canopy.
//!
//! This crate provides a reference implementation of the query-engine
//! interface the publication engine consumes: a named, insertion-ordered
//! document store whose live cursors deliver added/changed/removed events
//! synchronously as the collection mutates. It backs the engine's own
//! integration tests and serves as a template for real engine bindings.
//!
//! - `MemoryCollection`: the document store; `find` returns a live cursor
//!   over a filter predicate
//! - `RecordingSink`: a client sink that records the event log and mirrors
//!   the client-visible document set

#![no_std]

extern crate alloc;

pub mod collection;
pub mod recording;

pub use collection::{DocFilter, MemoryCollection};
pub use recording::{RecordingSink, SinkEvent};
