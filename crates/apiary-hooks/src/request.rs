#![forbid(unsafe_code)]

//! Editable HTTP request state.
//!
//! The request is held as `Rc<HttpRequest>`: every update stores a new
//! allocation, so subscribers are notified even when the patch is empty.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use apiary_runtime::reactive::Signal;
use serde::{Deserialize, Serialize};

use crate::callback::{self, AsyncHandler};
use crate::error::{HookError, Result};

/// A header (or query parameter) pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HttpRequest {
    pub url: String,
    pub method: String,
    pub body: String,
    pub headers: Vec<KeyValue>,
}

impl HttpRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            ..Self::default()
        }
    }
}

/// Partial update of an [`HttpRequest`]. Unset fields keep their value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<KeyValue>>,
}

impl RequestPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = KeyValue>) -> Self {
        self.headers = Some(headers.into_iter().collect());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.method.is_none() && self.body.is_none() && self.headers.is_none()
    }

    /// Merge onto `base`.
    #[must_use]
    pub fn apply(self, base: &HttpRequest) -> HttpRequest {
        HttpRequest {
            url: self.url.unwrap_or_else(|| base.url.clone()),
            method: self.method.unwrap_or_else(|| base.method.clone()),
            body: self.body.unwrap_or_else(|| base.body.clone()),
            headers: self.headers.unwrap_or_else(|| base.headers.clone()),
        }
    }
}

/// Configuration for [`RequestState`].
#[derive(Clone)]
pub struct RequestOptions {
    initial: Rc<HttpRequest>,
    on_update: AsyncHandler<Rc<HttpRequest>, ()>,
}

impl RequestOptions {
    #[must_use]
    pub fn new(initial: HttpRequest) -> Self {
        Self {
            initial: Rc::new(initial),
            on_update: callback::noop(),
        }
    }

    /// Called with every updated request, typically to persist it.
    #[must_use]
    pub fn on_update<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Rc<HttpRequest>) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        self.on_update = callback::handler(f);
        self
    }
}

/// Request editor state.
#[derive(Clone)]
pub struct RequestState {
    request: Signal<Rc<HttpRequest>>,
    loading: Signal<bool>,
    error: Signal<Option<Rc<HookError>>>,
    in_flight: Rc<Cell<usize>>,
    options: RequestOptions,
}

impl RequestState {
    #[must_use]
    pub fn new(options: RequestOptions) -> Self {
        Self {
            request: Signal::new(Rc::clone(&options.initial)),
            loading: Signal::new(false),
            error: Signal::new(None),
            in_flight: Rc::new(Cell::new(0)),
            options,
        }
    }

    pub fn request_signal(&self) -> &Signal<Rc<HttpRequest>> {
        &self.request
    }

    pub fn loading_signal(&self) -> &Signal<bool> {
        &self.loading
    }

    pub fn error_signal(&self) -> &Signal<Option<Rc<HookError>>> {
        &self.error
    }

    #[must_use]
    pub fn request(&self) -> Rc<HttpRequest> {
        self.request.value()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.value()
    }

    #[must_use]
    pub fn error(&self) -> Option<Rc<HookError>> {
        self.error.value()
    }

    /// Apply `patch` and hand the new request to `on_update`.
    ///
    /// The patched request is stored before the callback runs. A callback
    /// failure is kept in the error signal and returned; `loading` stays
    /// set until every overlapping update has settled or been dropped.
    pub async fn update(&self, patch: RequestPatch) -> Result<()> {
        self.in_flight.set(self.in_flight.get() + 1);
        let _in_flight = InFlight(self);
        self.loading.set(true);
        self.error.set(None);

        let next = Rc::new(self.request.with(|current| patch.apply(current)));
        self.request.set(Rc::clone(&next));
        let result = (self.options.on_update)(next).await;
        if let Err(err) = &result {
            #[cfg(feature = "tracing")]
            tracing::debug!(message = "request.update_failed", error = %err);
            self.error.set(Some(Rc::new(err.clone())));
        }
        result
    }

    /// Restore the initial request and clear `loading` and `error`.
    pub fn reset(&self) {
        self.request.set(Rc::clone(&self.options.initial));
        self.loading.set(false);
        self.error.set(None);
    }
}

/// One pending [`RequestState::update`]. Settles the counter when dropped.
struct InFlight<'a>(&'a RequestState);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let state = self.0;
        let remaining = state.in_flight.get().saturating_sub(1);
        state.in_flight.set(remaining);
        state.loading.set(remaining > 0);
    }
}
