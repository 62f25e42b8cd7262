//! Field binding: live link between a displayed info value and its source
//!
//! The display node owns the binding target; the remote source only holds a
//! weak observer handle to it. Updates are posted through the bridge, never
//! applied directly, since sources publish from background threads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dcnview_core::prelude::*;
use dcnview_core::{EntityRef, Value};
use dcnview_transport::{InfoSource, Observer};

use crate::bridge::WeakUi;
use crate::message::Message;

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

/// Distinguishes successive bindings of the same field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

impl BindingId {
    pub fn next() -> Self {
        Self(NEXT_BINDING_ID.fetch_add(1, Ordering::SeqCst))
    }
}

struct BindingTarget {
    id: BindingId,
    entity: EntityRef,
    ui: WeakUi,
}

impl Observer<Value> for BindingTarget {
    fn notify(&self, value: &Value) {
        let posted = self.ui.post(Message::ValueUpdated {
            binding: self.id,
            entity: self.entity.clone(),
            value: value.clone(),
        });
        if !posted {
            trace!("UI gone, dropping update for {}", self.entity.name);
        }
    }
}

/// Dropping the binding unbinds it
pub struct FieldBinding {
    id: BindingId,
    source: Weak<InfoSource>,
    _target: Arc<BindingTarget>,
}

impl FieldBinding {
    pub fn bind(source: &Arc<InfoSource>, entity: EntityRef, ui: WeakUi) -> Self {
        let id = BindingId::next();
        let target = Arc::new(BindingTarget { id, entity, ui });
        source.add_on_update_callback(&target);
        Self {
            id,
            source: Arc::downgrade(source),
            _target: target,
        }
    }

    pub fn id(&self) -> BindingId {
        self.id
    }

    pub fn is_bound_to(&self, source: &Arc<InfoSource>) -> bool {
        std::ptr::eq(self.source.as_ptr(), Arc::as_ptr(source))
    }

    /// The source, if it is still alive
    pub fn source(&self) -> Option<Arc<InfoSource>> {
        self.source.upgrade()
    }
}

impl std::fmt::Debug for FieldBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBinding")
            .field("id", &self.id)
            .field("source_alive", &(self.source.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ui_channel;
    use dcnview_core::InfoRecord;

    fn source() -> Arc<InfoSource> {
        Arc::new(InfoSource::new(InfoRecord::new(
            EntityRef::new("aa", "svc", "cat", "level"),
            Value::Int(5),
        )))
    }

    #[test]
    fn test_update_is_posted_not_applied() {
        let (ui, mut rx) = ui_channel();
        let source = source();
        let binding = FieldBinding::bind(
            &source,
            EntityRef::new("aa", "svc", "cat", "level"),
            WeakUi::new(&ui),
        );

        source.publish(Value::Int(7)).unwrap();
        match rx.try_recv() {
            Ok(Message::ValueUpdated { binding: id, value, .. }) => {
                assert_eq!(id, binding.id());
                assert_eq!(value, Value::Int(7));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_dropping_binding_unbinds() {
        let (ui, mut rx) = ui_channel();
        let source = source();
        let binding = FieldBinding::bind(
            &source,
            EntityRef::new("aa", "svc", "cat", "level"),
            WeakUi::new(&ui),
        );
        assert_eq!(source.observer_count(), 1);

        drop(binding);
        assert_eq!(source.observer_count(), 0);
        assert_eq!(source.publish(Value::Int(8)).unwrap(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_binding_does_not_keep_source_alive() {
        let source = source();
        let binding = FieldBinding::bind(
            &source,
            EntityRef::new("aa", "svc", "cat", "level"),
            WeakUi::detached(),
        );
        assert!(binding.is_bound_to(&source));

        drop(source);
        assert!(binding.source().is_none());
    }

    #[test]
    fn test_binding_ids_are_unique() {
        assert_ne!(BindingId::next(), BindingId::next());
    }
}
