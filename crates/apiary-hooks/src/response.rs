#![forbid(unsafe_code)]

//! Response panel state.

use std::rc::Rc;

use apiary_runtime::reactive::Signal;
use serde::{Deserialize, Serialize};

use crate::error::HookError;
use crate::format::format_body;
use crate::request::KeyValue;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HttpResponse {
    pub code: i32,
    pub body: String,
    pub headers: Vec<KeyValue>,
}

impl HttpResponse {
    /// The body pretty-printed when it is JSON, verbatim otherwise.
    #[must_use]
    pub fn formatted_body(&self) -> String {
        format_body(&self.body)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// Anything that can show a loading indicator.
///
/// [`RequestOperations`](crate::RequestOperations) drives one of these while
/// sends and updates are in flight.
pub trait LoadingSink {
    fn set_loading(&self, loading: bool);
}

/// Response viewer state.
///
/// Responses are stored as `Rc<R>`; storing a fresh response always
/// notifies.
pub struct ResponseState<R = HttpResponse> {
    response: Signal<Option<Rc<R>>>,
    loading: Signal<bool>,
    error: Signal<Option<Rc<HookError>>>,
}

impl<R> Clone for ResponseState<R> {
    fn clone(&self) -> Self {
        Self {
            response: self.response.clone(),
            loading: self.loading.clone(),
            error: self.error.clone(),
        }
    }
}

impl<R: 'static> Default for ResponseState<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: 'static> ResponseState<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            response: Signal::new(None),
            loading: Signal::new(false),
            error: Signal::new(None),
        }
    }

    /// Start with `response` already shown.
    #[must_use]
    pub fn with_response(response: R) -> Self {
        let state = Self::new();
        state.response.set(Some(Rc::new(response)));
        state
    }

    pub fn response_signal(&self) -> &Signal<Option<Rc<R>>> {
        &self.response
    }

    pub fn loading_signal(&self) -> &Signal<bool> {
        &self.loading
    }

    pub fn error_signal(&self) -> &Signal<Option<Rc<HookError>>> {
        &self.error
    }

    #[must_use]
    pub fn response(&self) -> Option<Rc<R>> {
        self.response.value()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.value()
    }

    #[must_use]
    pub fn error(&self) -> Option<Rc<HookError>> {
        self.error.value()
    }

    /// Show `response` (or nothing), clearing `error` and `loading`.
    pub fn update(&self, response: Option<R>) {
        self.response.set(response.map(Rc::new));
        self.error.set(None);
        self.loading.set(false);
    }

    pub fn clear(&self) {
        self.update(None);
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.set(loading);
    }

    /// Record a failed request. The previous response stays visible.
    pub fn fail(&self, error: HookError) {
        self.error.set(Some(Rc::new(error)));
        self.loading.set(false);
    }
}

impl<R: 'static> LoadingSink for ResponseState<R> {
    fn set_loading(&self, loading: bool) {
        self.loading.set(loading);
    }
}
