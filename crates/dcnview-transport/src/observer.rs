//! Weak observer registry and the remote info source
//!
//! A publisher stores only [`Weak`] handles to its observers. Dropping the
//! last strong reference to an observer invalidates its handle; later
//! deliveries to it are no-ops and the dead entry is pruned.

use std::sync::{Arc, Mutex, Weak};

use dcnview_core::prelude::*;
use dcnview_core::{InfoRecord, Value};

/// Receives values from a publisher. Called on the publisher's thread.
pub trait Observer<T>: Send + Sync {
    fn notify(&self, value: &T);
}

/// Non-owning list of observers
pub struct ObserverRegistry<T> {
    observers: Mutex<Vec<Weak<dyn Observer<T>>>>,
}

impl<T: 'static> ObserverRegistry<T> {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Register an observer without keeping it alive
    pub fn subscribe<O: Observer<T> + 'static>(&self, observer: &Arc<O>) {
        let weak: Weak<O> = Arc::downgrade(observer);
        let weak: Weak<dyn Observer<T>> = weak;
        if let Ok(mut observers) = self.observers.lock() {
            observers.push(weak);
        }
    }

    /// Deliver `value` to every live observer and prune dead ones.
    ///
    /// Observers are upgraded under the lock and called after it is
    /// released, so an observer may subscribe or drop during delivery.
    /// Returns the number of observers reached.
    pub fn notify(&self, value: &T) -> usize {
        let live: Vec<Arc<dyn Observer<T>>> = match self.observers.lock() {
            Ok(mut observers) => {
                observers.retain(|weak| weak.strong_count() > 0);
                observers.iter().filter_map(Weak::upgrade).collect()
            }
            Err(_) => return 0,
        };

        for observer in &live {
            observer.notify(value);
        }
        live.len()
    }

    /// Number of observers still alive
    pub fn live_count(&self) -> usize {
        self.observers
            .lock()
            .map(|observers| observers.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }
}

impl<T: 'static> Default for ObserverRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A remote info object: latest record plus update callbacks
pub struct InfoSource {
    record: Mutex<InfoRecord>,
    observers: ObserverRegistry<Value>,
}

impl InfoSource {
    pub fn new(record: InfoRecord) -> Self {
        Self {
            record: Mutex::new(record),
            observers: ObserverRegistry::new(),
        }
    }

    /// Snapshot of the current record
    pub fn record(&self) -> Option<InfoRecord> {
        self.record.lock().ok().map(|record| record.clone())
    }

    pub fn value(&self) -> Option<Value> {
        self.record.lock().ok().map(|record| record.value.clone())
    }

    /// Register for value updates. The callback is held weakly.
    pub fn add_on_update_callback<O: Observer<Value> + 'static>(&self, observer: &Arc<O>) {
        self.observers.subscribe(observer);
    }

    /// Store a new value and notify observers
    ///
    /// The value must keep the declared type of the field.
    pub fn publish(&self, value: Value) -> Result<usize> {
        {
            let mut record = self
                .record
                .lock()
                .map_err(|_| Error::transport("info source lock poisoned"))?;
            if value.value_type() != record.value_type {
                return Err(Error::invalid_value(record.value_type, value.to_string()));
            }
            record.value = value.clone();
        }
        Ok(self.observers.notify(&value))
    }

    pub fn observer_count(&self) -> usize {
        self.observers.live_count()
    }
}

impl std::fmt::Debug for InfoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfoSource")
            .field("record", &self.record())
            .field("observers", &self.observer_count())
            .finish()
    }
}
