#![forbid(unsafe_code)]

//! Observable values with resumable subscribers.
//!
//! # Design
//!
//! A [`Signal<T>`] owns one current value and an ordered list of
//! [`Subscriber`]s. A subscriber is a small state machine: it is started
//! once to reach its first suspension point, then resumed with each new
//! value. It keeps whatever state it needs between resumptions in its own
//! fields and stops by returning [`ControlFlow::Break`].
//!
//! Subscribing primes the subscriber: `start` runs, then `resume` receives
//! the current value. A freshly attached subscriber therefore observes the
//! current value through the same path as any later change.
//!
//! # Failure Modes
//!
//! - **Updater panics**: The panic propagates out of `update`. The stored
//!   value is unchanged and nobody is notified.
//! - **Subscriber panics**: The panic propagates out of `update`. The new
//!   value is already stored; subscribers later in the pass are not resumed.
//! - **Reentrant update from a subscriber**: The nested update runs its own
//!   pass. The subscriber currently on the stack is busy and is skipped by
//!   that pass rather than resumed twice at once.
//! - **Signal dropped**: Outstanding [`Unsubscribe`] handles become inert.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::ControlFlow;
use std::rc::{Rc, Weak};

use super::strict_eq::StrictEq;

/// A stateful observer driven by a [`Signal`].
///
/// Any `FnMut(&T) -> ControlFlow<()>` closure is a subscriber with no setup
/// step.
pub trait Subscriber<T> {
    /// Run up to the first point where the subscriber wants a value.
    ///
    /// Called exactly once, when the subscriber is registered.
    fn start(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Deliver one value. Return `Break` to stop receiving values.
    fn resume(&mut self, value: &T) -> ControlFlow<()>;
}

impl<T, F> Subscriber<T> for F
where
    F: FnMut(&T) -> ControlFlow<()>,
{
    fn resume(&mut self, value: &T) -> ControlFlow<()> {
        self(value)
    }
}

/// A registered subscriber.
struct Entry<T> {
    id: u64,
    /// Cleared on unsubscribe or completion. Shared with the handle.
    live: Rc<Cell<bool>>,
    subscriber: RefCell<Box<dyn Subscriber<T>>>,
}

/// Shared interior for [`Signal<T>`].
struct SignalInner<T> {
    value: T,
    /// Bumped once per value change.
    version: u64,
    next_id: u64,
    /// Registration order. Dead entries are pruned lazily.
    subscribers: Vec<Rc<Entry<T>>>,
}

/// Type-erased access from an [`Unsubscribe`] handle back to its signal.
trait Detach {
    fn detach(&self, id: u64);
}

impl<T> Detach for RefCell<SignalInner<T>> {
    fn detach(&self, id: u64) {
        // Busy means an updater is running; the entry is already dead and
        // will be pruned by the next pass.
        if let Ok(mut inner) = self.try_borrow_mut() {
            inner.subscribers.retain(|entry| entry.id != id);
        }
    }
}

/// A shared, version-tracked value with resumable subscribers.
///
/// Cloning a `Signal` creates a new handle to the **same** value and
/// subscriber list.
///
/// # Invariants
///
/// 1. There is always exactly one current value.
/// 2. `version` increments by 1 on each update that changes the value.
/// 3. Each subscriber is resumed at most once per notification pass.
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Signal")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field(
                "subscribers",
                &inner.subscribers.iter().filter(|e| e.live.get()).count(),
            )
            .finish()
    }
}

impl<T: Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Signal<T> {
    /// Create a signal holding `value` with no subscribers.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                value,
                version: 0,
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Access the current value by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if the closure updates this same signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Number of value changes since construction.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of currently registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|e| e.live.get())
            .count()
    }
}

impl<T: Clone> Signal<T> {
    /// Current value.
    #[must_use]
    pub fn value(&self) -> T {
        self.inner.borrow().value.clone()
    }
}

impl<T: Clone + StrictEq + 'static> Signal<T> {
    /// Replace the value with `f(current)` and notify subscribers.
    ///
    /// If the new value is strictly equal to the current one the call does
    /// nothing. Otherwise every registered subscriber is resumed once, in
    /// registration order, before this returns.
    ///
    /// # Panics
    ///
    /// Panics if `f` updates this same signal.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = {
            let inner = self.inner.borrow();
            f(&inner.value)
        };

        let (snapshot, delivered) = {
            let mut inner = self.inner.borrow_mut();
            if next.strict_eq(&inner.value) {
                return;
            }
            inner.value = next;
            inner.version += 1;
            inner.subscribers.retain(|e| e.live.get());
            #[cfg(feature = "tracing")]
            Self::log_notify(inner.version, inner.subscribers.len());
            (inner.subscribers.clone(), inner.value.clone())
        };

        for entry in &snapshot {
            self.deliver(entry, &delivered);
        }
    }

    /// Replace the value. Equivalent to `update(|_| value)`.
    pub fn set(&self, value: T) {
        self.update(move |_| value);
    }

    /// Register a subscriber and prime it with the current value.
    ///
    /// The subscriber is started, then resumed with the current value. If it
    /// finishes during priming it is deregistered and the returned handle is
    /// inert. Otherwise it receives every later change until it finishes or
    /// the handle is used.
    ///
    /// Dropping the handle does not unsubscribe; see
    /// [`Unsubscribe::into_guard`].
    pub fn sub(&self, subscriber: impl Subscriber<T> + 'static) -> Unsubscribe {
        let entry = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            let entry = Rc::new(Entry {
                id,
                live: Rc::new(Cell::new(true)),
                subscriber: RefCell::new(Box::new(subscriber) as Box<dyn Subscriber<T>>),
            });
            inner.subscribers.push(Rc::clone(&entry));
            entry
        };

        if self.prime(&entry).is_break() {
            self.finish(&entry);
            return Unsubscribe::inert();
        }

        let target: Weak<dyn Detach> = Rc::downgrade(&self.inner) as Weak<dyn Detach>;
        Unsubscribe {
            id: entry.id,
            live: Some(Rc::clone(&entry.live)),
            target: Cell::new(Some(target)),
        }
    }

    /// Register a plain callback.
    ///
    /// The callback runs immediately with the current value, then once per
    /// change.
    pub fn sub_callback(&self, mut callback: impl FnMut(&T) + 'static) -> Unsubscribe {
        self.sub(move |value: &T| {
            callback(value);
            ControlFlow::Continue(())
        })
    }

    fn prime(&self, entry: &Entry<T>) -> ControlFlow<()> {
        if entry.subscriber.borrow_mut().start().is_break() {
            return ControlFlow::Break(());
        }
        let current = self.value();
        if !entry.live.get() {
            return ControlFlow::Break(());
        }
        entry.subscriber.borrow_mut().resume(&current)
    }

    fn deliver(&self, entry: &Entry<T>, value: &T) {
        if !entry.live.get() {
            return;
        }
        let Ok(mut subscriber) = entry.subscriber.try_borrow_mut() else {
            #[cfg(feature = "tracing")]
            tracing::trace!(message = "signal.skip_busy", id = entry.id);
            return;
        };
        let flow = subscriber.resume(value);
        drop(subscriber);
        if flow.is_break() {
            self.finish(entry);
        }
    }

    fn finish(&self, entry: &Entry<T>) {
        entry.live.set(false);
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.subscribers.retain(|e| e.id != entry.id);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(message = "signal.subscriber_finished", id = entry.id);
    }

    #[cfg(feature = "tracing")]
    fn log_notify(version: u64, subscribers: usize) {
        tracing::trace!(message = "signal.notify", version, subscribers);
    }
}

/// Detach handle returned by [`Signal::sub`].
///
/// Calling [`unsubscribe`](Self::unsubscribe) more than once has no further
/// effect. Dropping the handle leaves the subscriber attached.
pub struct Unsubscribe {
    id: u64,
    live: Option<Rc<Cell<bool>>>,
    target: Cell<Option<Weak<dyn Detach>>>,
}

impl Unsubscribe {
    /// A handle whose subscriber has already finished.
    fn inert() -> Self {
        Self {
            id: 0,
            live: None,
            target: Cell::new(None),
        }
    }

    /// Remove the subscriber from its signal.
    pub fn unsubscribe(&self) {
        if let Some(live) = &self.live {
            live.set(false);
        }
        if let Some(target) = self.target.take().and_then(|weak| weak.upgrade()) {
            target.detach(self.id);
        }
    }

    /// Whether the subscriber is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.live.as_ref().is_some_and(|live| live.get())
    }

    /// Convert into a guard that unsubscribes when dropped.
    #[must_use]
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard { handle: self }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// RAII guard that unsubscribes on drop.
#[must_use = "dropping the guard unsubscribes immediately"]
#[derive(Debug)]
pub struct SubscriptionGuard {
    handle: Unsubscribe,
}

impl SubscriptionGuard {
    /// Whether the subscriber is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.handle.unsubscribe();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
