#![forbid(unsafe_code)]

//! Reactive data bindings for Apiary.
//!
//! This module provides change-tracking primitives for headless UI state:
//!
//! - [`Signal`]: A shared, version-tracked value with resumable subscribers.
//! - [`Subscriber`]: A stateful observer driven by a signal. It is started
//!   once, then resumed with every new value until it finishes or is
//!   unsubscribed.
//! - [`Unsubscribe`]: Idempotent detach handle returned by [`Signal::sub`].
//!   [`SubscriptionGuard`] is its RAII form.
//! - [`StrictEq`]: The equality rule used to suppress no-op updates.
//! - [`Computed`]: A lazily-evaluated, memoized value derived from one or
//!   more signals.
//!
//! # Architecture
//!
//! `Signal<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are kept in registration order. A notification pass iterates
//! a snapshot of that list, so subscribers attached or detached mid-pass
//! never cause skipped or doubled deliveries for the others.
//!
//! `Computed<T>` subscribes to its sources and marks itself dirty on change.
//! Recomputation is deferred until `get()`.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per update that changes the value.
//! 2. Subscribers are resumed in registration order, once per pass.
//! 3. An update producing a value strictly equal to the current one is a
//!    no-op (no store, no version bump, no notifications).
//! 4. A subscriber that returns `ControlFlow::Break` is deregistered and
//!    never resumed again.
//! 5. After [`Unsubscribe::unsubscribe`] returns, the subscriber receives no
//!    further values.
//! 6. `Computed::get()` never returns a stale value.

pub mod computed;
pub mod signal;
pub mod strict_eq;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use computed::Computed;
pub use signal::{Signal, Subscriber, SubscriptionGuard, Unsubscribe};
pub use strict_eq::StrictEq;
