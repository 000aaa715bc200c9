//! Outbound client channel interface.

use canopy_core::{DocId, Fields};

/// Sink receiving the composed change stream for one client.
///
/// Methods take `&self`; implementations are expected to use interior
/// mutability. Delivery is synchronous and in event order. The channel in
/// front of this sink guarantees at-most-once adds and removals per
/// document, so implementations need no dedup of their own.
pub trait ClientSink {
    /// A document entered the stream.
    fn added(&self, collection: &str, id: &DocId, fields: &Fields);

    /// Fields of an already published document changed.
    fn changed(&self, collection: &str, id: &DocId, fields: &Fields);

    /// A document left the stream.
    fn removed(&self, collection: &str, id: &DocId);

    /// The initial result set is fully published.
    fn ready(&self);
}
