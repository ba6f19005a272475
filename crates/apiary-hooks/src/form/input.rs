#![forbid(unsafe_code)]

//! Text input state.

use std::rc::Rc;

use apiary_runtime::reactive::Signal;

use super::{FieldState, FormField};

type StrValidator = Rc<dyn Fn(&str) -> Vec<String>>;
type StrCallback = Rc<dyn Fn(&str)>;

/// Configuration for an [`Input`].
#[derive(Clone, Default)]
pub struct InputOptions {
    initial_value: String,
    validate: Option<StrValidator>,
    on_change: Option<StrCallback>,
    on_blur: Option<StrCallback>,
}

impl InputOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn initial_value(mut self, value: impl Into<String>) -> Self {
        self.initial_value = value.into();
        self
    }

    #[must_use]
    pub fn validate(mut self, validate: impl Fn(&str) -> Vec<String> + 'static) -> Self {
        self.validate = Some(Rc::new(validate));
        self
    }

    #[must_use]
    pub fn on_change(mut self, f: impl Fn(&str) + 'static) -> Self {
        self.on_change = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_blur(mut self, f: impl Fn(&str) + 'static) -> Self {
        self.on_blur = Some(Rc::new(f));
        self
    }
}

/// Headless text input.
#[derive(Clone)]
pub struct Input {
    value: Signal<String>,
    field: FieldState,
    options: Rc<InputOptions>,
}

impl Input {
    #[must_use]
    pub fn new(options: InputOptions) -> Self {
        Self {
            value: Signal::new(options.initial_value.clone()),
            field: FieldState::default(),
            options: Rc::new(options),
        }
    }

    pub fn value_signal(&self) -> &Signal<String> {
        &self.value
    }

    pub fn touched_signal(&self) -> &Signal<bool> {
        &self.field.touched
    }

    pub fn dirty_signal(&self) -> &Signal<bool> {
        &self.field.dirty
    }

    pub fn errors_signal(&self) -> &Signal<Vec<String>> {
        &self.field.errors
    }

    /// The user edited the text.
    ///
    /// Validates the new text when a validator is configured, then calls
    /// `on_change`.
    pub fn change(&self, value: &str) {
        self.value.set(value.to_owned());
        self.field.dirty.set(true);
        if let Some(validate) = &self.options.validate {
            self.field.errors.set(validate(value));
        }
        if let Some(on_change) = &self.options.on_change {
            on_change(value);
        }
    }

    /// The input lost focus.
    pub fn blur(&self) {
        self.field.touched.set(true);
        self.validate();
        if let Some(on_blur) = &self.options.on_blur {
            self.value.with(|value| on_blur(value.as_str()));
        }
    }

    /// The input gained focus.
    pub fn focus(&self) {
        self.field.touched.set(true);
    }

    /// Empty the input, marking it touched and dirty.
    pub fn clear(&self) {
        self.value.set(String::new());
        self.field.touched.set(true);
        self.field.dirty.set(true);
        self.validate();
    }
}

impl FormField for Input {
    type Value = String;

    fn value(&self) -> String {
        self.value.value()
    }

    fn touched(&self) -> bool {
        self.field.touched.value()
    }

    fn dirty(&self) -> bool {
        self.field.dirty.value()
    }

    fn errors(&self) -> Vec<String> {
        self.field.errors.value()
    }

    /// Without a validator this returns no errors and leaves the stored
    /// errors untouched.
    fn validate(&self) -> Vec<String> {
        let Some(validate) = &self.options.validate else {
            return Vec::new();
        };
        let errors = self.value.with(|value| validate(value.as_str()));
        self.field.errors.set(errors.clone());
        errors
    }

    fn set_value(&self, value: String) {
        self.update_value(move |_| value);
    }

    fn update_value(&self, f: impl FnOnce(&String) -> String) {
        self.value.update(f);
        self.field.dirty.set(true);
        self.validate();
    }

    fn set_touched(&self, touched: bool) {
        self.field.touched.set(touched);
        if touched {
            self.validate();
        }
    }

    fn reset(&self) {
        self.value.set(self.options.initial_value.clone());
        self.field.reset();
    }
}
