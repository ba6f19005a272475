#![forbid(unsafe_code)]

//! Button state with an async click handler.

use std::future::Future;
use std::rc::Rc;

use apiary_runtime::reactive::Signal;

use crate::callback::{self, AsyncHandler};
use crate::error::Result;

/// Configuration for a [`Button`].
#[derive(Clone, Default)]
pub struct ButtonOptions {
    on_click: Option<AsyncHandler<(), ()>>,
    disabled: bool,
    loading: bool,
}

impl ButtonOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_click<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        self.on_click = Some(callback::handler(move |()| f()));
        self
    }

    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    #[must_use]
    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }
}

/// Headless button.
///
/// Clicks are ignored while the button is disabled or a previous click is
/// still running.
#[derive(Clone)]
pub struct Button {
    disabled: Signal<bool>,
    loading: Signal<bool>,
    options: Rc<ButtonOptions>,
}

impl Button {
    #[must_use]
    pub fn new(options: ButtonOptions) -> Self {
        Self {
            disabled: Signal::new(options.disabled),
            loading: Signal::new(options.loading),
            options: Rc::new(options),
        }
    }

    pub fn disabled_signal(&self) -> &Signal<bool> {
        &self.disabled
    }

    pub fn loading_signal(&self) -> &Signal<bool> {
        &self.loading
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.value()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.value()
    }

    /// Run the click handler, holding `loading` while it is in flight.
    ///
    /// `loading` is cleared when the handler finishes, fails, or the returned
    /// future is dropped before completion.
    pub async fn click(&self) -> Result<()> {
        if self.disabled.value() || self.loading.value() {
            return Ok(());
        }
        let Some(on_click) = self.options.on_click.clone() else {
            return Ok(());
        };

        self.loading.set(true);
        let _loading = ClearOnDrop(&self.loading);
        on_click(()).await
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.set(loading);
    }

    /// Restore the configured `disabled` and `loading` flags.
    pub fn reset(&self) {
        self.disabled.set(self.options.disabled);
        self.loading.set(self.options.loading);
    }
}

/// Clears a loading flag when dropped.
struct ClearOnDrop<'a>(&'a Signal<bool>);

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
