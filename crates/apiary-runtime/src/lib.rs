#![forbid(unsafe_code)]

//! Reactive runtime for the Apiary frontend.
//!
//! Every piece of view state in Apiary (field values, tab selection, request
//! and response caches) is held in a [`reactive::Signal`]. Views attach
//! subscribers to the signals they render and are resumed synchronously on
//! each change.

pub mod reactive;

pub use reactive::{Computed, Signal, StrictEq, Subscriber, SubscriptionGuard, Unsubscribe};
