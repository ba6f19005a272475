#![forbid(unsafe_code)]

//! Test helpers for observing signals and the events they trace.

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;

use super::signal::{Signal, Subscriber, Unsubscribe};
use super::strict_eq::StrictEq;

/// Values delivered to a subscriber after priming.
pub struct CollectedValues<T> {
    values: Rc<RefCell<Vec<T>>>,
    unsubscribe: Unsubscribe,
}

impl<T: Clone> CollectedValues<T> {
    /// Snapshot of the values collected so far.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.values.borrow().clone()
    }

    /// Stop collecting.
    pub fn unsubscribe(&self) {
        self.unsubscribe.unsubscribe();
    }
}

struct Changes<T> {
    values: Rc<RefCell<Vec<T>>>,
    primed: bool,
}

impl<T: Clone> Subscriber<T> for Changes<T> {
    fn resume(&mut self, value: &T) -> ControlFlow<()> {
        if self.primed {
            self.values.borrow_mut().push(value.clone());
        } else {
            self.primed = true;
        }
        ControlFlow::Continue(())
    }
}

/// Subscribe to `signal` and collect every change after the priming value.
pub fn collect_values<T: Clone + StrictEq + 'static>(signal: &Signal<T>) -> CollectedValues<T> {
    let values = Rc::new(RefCell::new(Vec::new()));
    let unsubscribe = signal.sub(Changes {
        values: Rc::clone(&values),
        primed: false,
    });
    CollectedValues {
        values,
        unsubscribe,
    }
}

/// Run `f` with a thread-local subscriber and return the `message` field of
/// every event it emitted, in order.
#[cfg(feature = "tracing")]
pub fn capture_events<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    let messages = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(EventCapture {
        messages: Arc::clone(&messages),
    });
    let out = tracing::subscriber::with_default(subscriber, f);
    let captured = match messages.lock() {
        Ok(mut guard) => std::mem::take(&mut *guard),
        Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    };
    (out, captured)
}

#[cfg(feature = "tracing")]
struct EventCapture {
    messages: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

#[cfg(feature = "tracing")]
impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = MessageField(None);
        event.record(&mut visitor);
        if let Some(message) = visitor.0
            && let Ok(mut messages) = self.messages.lock()
        {
            messages.push(message);
        }
    }
}

#[cfg(feature = "tracing")]
struct MessageField(Option<String>);

#[cfg(feature = "tracing")]
impl tracing::field::Visit for MessageField {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{value:?}").trim_matches('"').to_string());
        }
    }
}
