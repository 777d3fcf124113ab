//! Change notification
//!
//! Listeners subscribe per property or globally and are invoked with the
//! previous value after the store has committed the new one. Dispatch is
//! synchronous on the caller's thread; listeners must not block.
//!
//! A panicking listener never takes down the engine or starves the
//! listeners after it. Each invocation is isolated, and panics are
//! converted into [`ListenerPanicked`] reports delivered to the error
//! sink.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::warn;

use mower_api::Property;

use crate::store::ChangeEvent;
use crate::value::Value;

/// Callback invoked with the property that changed and its previous value
pub type ChangeListener = Arc<dyn Fn(Property, Option<&Value>) + Send + Sync>;

/// Callback invoked with failures the engine cannot surface otherwise
pub type ErrorListener = Arc<dyn Fn(&(dyn std::error::Error + 'static)) + Send + Sync>;

/// Callback invoked once per reconciliation batch that changed something
pub type ChangedListener = Arc<dyn Fn() + Send + Sync>;

/// A subscribed listener panicked during dispatch
#[derive(Debug, Error)]
#[error("listener for {property:?} panicked: {message}")]
pub struct ListenerPanicked {
    pub property: Property,
    pub message: String,
}

/// Listener registry and dispatcher
///
/// Registration is lock-protected but dispatch happens on a snapshot taken
/// outside the lock, so a listener may freely register further listeners.
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    inner: Arc<RwLock<Listeners>>,
}

#[derive(Default)]
struct Listeners {
    by_property: HashMap<Property, Vec<ChangeListener>>,
    global: Vec<ChangeListener>,
    changed: Vec<ChangedListener>,
    errors: Vec<ErrorListener>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to changes of a single property
    pub fn on_change<F>(&self, property: Property, listener: F)
    where
        F: Fn(Property, Option<&Value>) + Send + Sync + 'static,
    {
        self.inner
            .write()
            .by_property
            .entry(property)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Subscribe to changes of every property
    pub fn on_any_change<F>(&self, listener: F)
    where
        F: Fn(Property, Option<&Value>) + Send + Sync + 'static,
    {
        self.inner.write().global.push(Arc::new(listener));
    }

    /// Subscribe to the batch-level changed signal
    ///
    /// Unlike the per-property listeners, this fires at most once per
    /// reconciliation batch, and only when something outside the silent
    /// set changed. Consumers that re-render on any change should
    /// subscribe here instead of to every property.
    pub fn on_changed<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.write().changed.push(Arc::new(listener));
    }

    /// Subscribe to engine failures (listener panics, poll errors)
    pub fn on_error<F>(&self, listener: F)
    where
        F: Fn(&(dyn std::error::Error + 'static)) + Send + Sync + 'static,
    {
        self.inner.write().errors.push(Arc::new(listener));
    }

    /// Dispatch one committed change to its subscribers
    pub fn dispatch(&self, event: &ChangeEvent) {
        let (targeted, global) = {
            let listeners = self.inner.read();
            (
                listeners
                    .by_property
                    .get(&event.property)
                    .cloned()
                    .unwrap_or_default(),
                listeners.global.clone(),
            )
        };

        for listener in targeted.iter().chain(global.iter()) {
            self.invoke(listener, event);
        }
    }

    /// Dispatch a batch of committed changes in order
    pub fn dispatch_all(&self, events: &[ChangeEvent]) {
        for event in events {
            self.dispatch(event);
        }
    }

    /// Fire the batch-level changed signal
    ///
    /// Called after the per-property listeners for the batch have run.
    pub fn notify_changed(&self) {
        let listeners = self.inner.read().changed.clone();
        for listener in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                warn!("changed listener panicked");
            }
        }
    }

    /// Report a failure to the error sink
    pub fn report_error(&self, error: &(dyn std::error::Error + 'static)) {
        let sinks = self.inner.read().errors.clone();
        if sinks.is_empty() {
            warn!(%error, "engine error with no error listener registered");
            return;
        }
        for sink in sinks {
            // An error listener that panics is only logged; reporting it
            // back through the sink would recurse.
            if panic::catch_unwind(AssertUnwindSafe(|| sink(error))).is_err() {
                warn!("error listener panicked");
            }
        }
    }

    fn invoke(&self, listener: &ChangeListener, event: &ChangeEvent) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            listener(event.property, event.previous.as_ref())
        }));
        if let Err(payload) = result {
            let report = ListenerPanicked {
                property: event.property,
                message: panic_message(&*payload),
            };
            warn!(property = ?event.property, message = %report.message, "listener panicked");
            self.report_error(&report);
        }
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.inner.read();
        f.debug_struct("ChangeNotifier")
            .field("properties", &listeners.by_property.len())
            .field("global", &listeners.global.len())
            .field("changed", &listeners.changed.len())
            .field("errors", &listeners.errors.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn event(property: Property, previous: Option<Value>) -> ChangeEvent {
        ChangeEvent { property, previous, custom: false }
    }

    #[test]
    fn test_targeted_listener_sees_previous_value() {
        let notifier = ChangeNotifier::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        notifier.on_change(Property::BatteryLevel, move |_, previous| {
            *sink.lock().unwrap() = previous.cloned();
        });

        notifier.dispatch(&event(Property::BatteryLevel, Some(Value::Int(80))));
        assert_eq!(*seen.lock().unwrap(), Some(Value::Int(80)));
    }

    #[test]
    fn test_targeted_listener_ignores_other_properties() {
        let notifier = ChangeNotifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        notifier.on_change(Property::BatteryLevel, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        notifier.dispatch(&event(Property::Volume, None));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_global_listener_sees_every_property() {
        let notifier = ChangeNotifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        notifier.on_any_change(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        notifier.dispatch_all(&[
            event(Property::BatteryLevel, None),
            event(Property::Volume, None),
        ]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_targeted_listeners_run_before_global() {
        let notifier = ChangeNotifier::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let a = order.clone();
        let b = order.clone();
        notifier.on_any_change(move |_, _| a.lock().unwrap().push("global"));
        notifier.on_change(Property::Volume, move |_, _| b.lock().unwrap().push("targeted"));

        notifier.dispatch(&event(Property::Volume, None));
        assert_eq!(*order.lock().unwrap(), vec!["targeted", "global"]);
    }

    #[test]
    fn test_panicking_listener_does_not_starve_the_rest() {
        let notifier = ChangeNotifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        notifier.on_change(Property::Volume, |_, _| panic!("boom"));
        notifier.on_change(Property::Volume, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        notifier.dispatch(&event(Property::Volume, None));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panic_is_reported_to_error_sink() {
        let notifier = ChangeNotifier::new();
        let reported = Arc::new(Mutex::new(None));
        let sink = reported.clone();
        notifier.on_error(move |error| {
            *sink.lock().unwrap() = Some(error.to_string());
        });
        notifier.on_change(Property::Volume, |_, _| panic!("boom"));

        notifier.dispatch(&event(Property::Volume, None));
        let message = reported.lock().unwrap().clone().unwrap();
        assert!(message.contains("Volume"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn test_changed_signal_fires_subscribers() {
        let notifier = ChangeNotifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        notifier.on_changed(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        notifier.notify_changed();
        notifier.notify_changed();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_changed_listener_is_isolated() {
        let notifier = ChangeNotifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        notifier.on_changed(|| panic!("boom"));
        notifier.on_changed(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        notifier.notify_changed();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_can_register_listeners() {
        let notifier = ChangeNotifier::new();
        let inner = notifier.clone();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        notifier.on_change(Property::Volume, move |_, _| {
            let counter = counter.clone();
            inner.on_change(Property::BatteryLevel, move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        notifier.dispatch(&event(Property::Volume, None));
        notifier.dispatch(&event(Property::BatteryLevel, None));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
