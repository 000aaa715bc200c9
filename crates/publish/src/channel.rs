//! Output channel: dedup and diff layer in front of the client sink.
//!
//! Every node of one publication tree reports through the same channel. The
//! channel owns the per-subscription doc-hash table and refcounter, so that
//! a document reachable through several branches produces exactly one
//! client-visible `added` and exactly one `removed`, and no-op updates are
//! suppressed entirely.

use crate::ref_count::DocRefCounter;
use crate::sink::ClientSink;
use alloc::rc::Rc;
use canopy_core::{DocId, DocKey, Document, Fields};
use core::cell::RefCell;
use hashbrown::HashMap;

struct ChannelInner {
    /// Last field set forwarded to the client per document. An absent entry
    /// means the client holds no record of the document.
    doc_hash: HashMap<DocKey, Fields>,
    sink: Rc<dyn ClientSink>,
}

/// Sits between the publication tree and the client sink.
///
/// `added` claims a publishing path before diffing; `removed` only releases
/// one path. The refcounter's zero transition is the single place a removal
/// becomes client-visible, which decouples "one path stopped claiming this
/// document" from "no path claims it anymore".
pub struct OutputChannel {
    inner: Rc<RefCell<ChannelInner>>,
    refs: DocRefCounter,
}

impl OutputChannel {
    /// Creates a channel for one subscription around the given sink.
    pub fn new(sink: Rc<dyn ClientSink>) -> Self {
        let inner = Rc::new(RefCell::new(ChannelInner {
            doc_hash: HashMap::new(),
            sink,
        }));

        let shared = inner.clone();
        let refs = DocRefCounter::new(move |key: &DocKey, count| {
            if count == 0 {
                let mut inner = shared.borrow_mut();
                inner.doc_hash.remove(key);
                inner.sink.removed(&key.collection, &key.id);
            }
        });

        Self { inner, refs }
    }

    /// Claims a publishing path for the document, then forwards it to the
    /// client unless identical content is already published.
    pub fn added(&mut self, collection: &str, doc: &Document) {
        let key = DocKey::new(collection, doc.id().clone());
        self.refs.increment(key.clone());

        let mut inner = self.inner.borrow_mut();
        let is_new = match inner.doc_hash.get(&key) {
            Some(hash) => doc
                .fields()
                .iter()
                .any(|(name, value)| hash.get(name) != Some(value)),
            None => true,
        };
        if is_new {
            inner.doc_hash.insert(key, doc.fields().clone());
            inner.sink.added(collection, doc.id(), doc.fields());
        }
    }

    /// Forwards a field-level change if at least one supplied field differs
    /// from the published state. Exactly the supplied fields are sent; the
    /// stored hash absorbs them (an absent hash starts empty).
    pub fn changed(&mut self, collection: &str, id: &DocId, fields: &Fields) {
        let key = DocKey::new(collection, id.clone());
        let mut inner = self.inner.borrow_mut();
        let differs = match inner.doc_hash.get(&key) {
            Some(hash) => fields
                .iter()
                .any(|(name, value)| hash.get(name) != Some(value)),
            None => !fields.is_empty(),
        };
        if differs {
            inner.doc_hash.entry(key).or_default().merge(fields);
            inner.sink.changed(collection, id, fields);
        }
    }

    /// Releases one publishing path. The client sees a removal only when the
    /// last path lets go.
    pub fn removed(&mut self, collection: &str, id: &DocId) {
        let key = DocKey::new(collection, id.clone());
        self.refs.decrement(&key);
    }

    /// Signals that the initial result set is fully published.
    pub fn ready(&self) {
        self.inner.borrow().sink.ready();
    }

    /// Teardown backstop: every document still claimed by any path is forced
    /// to zero and reported removed.
    pub fn close(&mut self) {
        let remaining = self.refs.drain();
        let mut inner = self.inner.borrow_mut();
        for key in remaining {
            inner.doc_hash.remove(&key);
            inner.sink.removed(&key.collection, &key.id);
        }
        inner.doc_hash.clear();
    }

    /// Number of documents currently claimed by at least one path.
    #[inline]
    pub fn tracked(&self) -> usize {
        self.refs.len()
    }

    /// Current claim count for a document; absence is zero.
    pub fn claims(&self, collection: &str, id: &DocId) -> u32 {
        self.refs.count(&DocKey::new(collection, id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};
    use alloc::vec;
    use alloc::vec::Vec;
    use canopy_core::Value;

    #[derive(Clone, Debug, PartialEq)]
    enum Event {
        Added(String, DocId, Fields),
        Changed(String, DocId, Fields),
        Removed(String, DocId),
        Ready,
    }

    #[derive(Default)]
    struct TestSink {
        events: RefCell<Vec<Event>>,
    }

    impl TestSink {
        fn events(&self) -> Vec<Event> {
            self.events.borrow().clone()
        }
    }

    impl ClientSink for TestSink {
        fn added(&self, collection: &str, id: &DocId, fields: &Fields) {
            self.events.borrow_mut().push(Event::Added(
                collection.to_string(),
                id.clone(),
                fields.clone(),
            ));
        }

        fn changed(&self, collection: &str, id: &DocId, fields: &Fields) {
            self.events.borrow_mut().push(Event::Changed(
                collection.to_string(),
                id.clone(),
                fields.clone(),
            ));
        }

        fn removed(&self, collection: &str, id: &DocId) {
            self.events
                .borrow_mut()
                .push(Event::Removed(collection.to_string(), id.clone()));
        }

        fn ready(&self) {
            self.events.borrow_mut().push(Event::Ready);
        }
    }

    fn make_doc(id: &str, value: i64) -> Document {
        let mut fields = Fields::new();
        fields.set("value", Value::Int64(value));
        Document::new(id, fields)
    }

    fn channel() -> (Rc<TestSink>, OutputChannel) {
        let sink = Rc::new(TestSink::default());
        let channel = OutputChannel::new(sink.clone());
        (sink, channel)
    }

    #[test]
    fn test_added_forwards_new_document() {
        let (sink, mut ch) = channel();
        let doc = make_doc("a", 1);

        ch.added("docs", &doc);

        assert_eq!(
            sink.events(),
            vec![Event::Added("docs".into(), "a".into(), doc.fields().clone())]
        );
        assert_eq!(ch.claims("docs", &"a".into()), 1);
    }

    #[test]
    fn test_identical_re_add_suppressed() {
        let (sink, mut ch) = channel();
        let doc = make_doc("a", 1);

        ch.added("docs", &doc);
        ch.added("docs", &doc);

        // Second path claimed, but only one client-visible add.
        assert_eq!(sink.events().len(), 1);
        assert_eq!(ch.claims("docs", &"a".into()), 2);
    }

    #[test]
    fn test_re_add_with_different_content_forwards_added() {
        let (sink, mut ch) = channel();

        ch.added("docs", &make_doc("a", 1));
        ch.added("docs", &make_doc("a", 2));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], Event::Added(_, _, fields)
            if fields.get("value") == Some(&Value::Int64(2))));
    }

    #[test]
    fn test_changed_noop_suppressed() {
        let (sink, mut ch) = channel();
        ch.added("docs", &make_doc("a", 1));

        let mut same = Fields::new();
        same.set("value", Value::Int64(1));
        ch.changed("docs", &"a".into(), &same);

        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_changed_forwards_exactly_supplied_fields() {
        let (sink, mut ch) = channel();
        let mut fields = Fields::new();
        fields.set("value", Value::Int64(1));
        fields.set("name", Value::String("x".into()));
        ch.added("docs", &Document::new("a", fields));

        let mut update = Fields::new();
        update.set("value", Value::Int64(2));
        ch.changed("docs", &"a".into(), &update);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        match &events[1] {
            Event::Changed(_, id, sent) => {
                assert_eq!(id.as_str(), "a");
                assert_eq!(sent.len(), 1);
                assert_eq!(sent.get("value"), Some(&Value::Int64(2)));
            }
            other => panic!("expected changed, got {:?}", other),
        }
    }

    #[test]
    fn test_changed_merges_into_hash() {
        let (sink, mut ch) = channel();
        ch.added("docs", &make_doc("a", 1));

        let mut update = Fields::new();
        update.set("value", Value::Int64(2));
        ch.changed("docs", &"a".into(), &update);
        // Merged: the same update again is now a no-op.
        ch.changed("docs", &"a".into(), &update);

        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn test_changed_without_hash_starts_empty() {
        let (sink, mut ch) = channel();

        let mut update = Fields::new();
        update.set("value", Value::Int64(2));
        ch.changed("docs", &"a".into(), &update);

        // Forwarded: every supplied field differs from the empty base.
        assert_eq!(sink.events().len(), 1);
        assert!(matches!(&sink.events()[0], Event::Changed(_, _, _)));
    }

    #[test]
    fn test_removed_forwards_only_at_zero() {
        let (sink, mut ch) = channel();
        let doc = make_doc("a", 1);

        ch.added("docs", &doc);
        ch.added("docs", &doc);
        ch.removed("docs", doc.id());
        assert_eq!(sink.events().len(), 1);

        ch.removed("docs", doc.id());
        assert_eq!(
            sink.events()[1],
            Event::Removed("docs".into(), "a".into())
        );
    }

    #[test]
    fn test_removed_evicts_hash() {
        let (sink, mut ch) = channel();
        let doc = make_doc("a", 1);

        ch.added("docs", &doc);
        ch.removed("docs", doc.id());
        // Hash evicted at zero: the same document is new again.
        ch.added("docs", &doc);

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[2], Event::Added(_, _, _)));
    }

    #[test]
    fn test_removed_unknown_is_noop() {
        let (sink, mut ch) = channel();
        ch.removed("docs", &"ghost".into());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_close_reports_all_claimed() {
        let (sink, mut ch) = channel();
        ch.added("docs", &make_doc("a", 1));
        ch.added("docs", &make_doc("b", 2));
        ch.added("docs", &make_doc("b", 2));

        ch.close();

        let removed: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Removed(_, _)))
            .collect();
        assert_eq!(removed.len(), 2);
        assert_eq!(ch.tracked(), 0);
    }

    #[test]
    fn test_ready_passthrough() {
        let (sink, ch) = channel();
        ch.ready();
        assert_eq!(sink.events(), vec![Event::Ready]);
    }
}
