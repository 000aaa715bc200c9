//! Canopy Core - Core document and value types for the Canopy publication engine.
//!
//! This crate provides the foundational types shared by the publication
//! engine and its collaborators:
//!
//! - `Value`: Runtime field values (Null, Bool, Int64, Float64, String, Bytes)
//! - `Fields`: An ordered mapping of field name to value
//! - `Document`: An identified record with named fields
//! - `DocId` / `DocKey`: Document identity within and across collections
//! - `Error`: Error types for publication operations
//!
//! # Example
//!
//! ```rust
//! use canopy_core::{Document, Fields, Value};
//!
//! let mut fields = Fields::new();
//! fields.set("name", Value::String("Alice".into()));
//! fields.set("age", Value::Int64(30));
//!
//! let doc = Document::new("u1", fields);
//!
//! assert_eq!(doc.id().as_str(), "u1");
//! assert_eq!(doc.field("age"), Some(&Value::Int64(30)));
//! ```

#![no_std]

extern crate alloc;

mod document;
mod error;
mod value;

pub use document::{DocId, DocKey, Document, Fields};
pub use error::{Error, Result};
pub use value::Value;
