#![forbid(unsafe_code)]

//! Select (dropdown) state.
//!
//! The value is `Option<T>`: `None` means nothing is selected. Option lookup
//! uses [`StrictEq`], so identity-typed values (`Rc`) match only the same
//! allocation.

use std::rc::Rc;

use apiary_runtime::reactive::{Signal, StrictEq};

use super::{FieldState, FormField};

type OptionValidator<T> = Rc<dyn Fn(Option<&T>) -> Vec<String>>;
type OptionCallback<T> = Rc<dyn Fn(Option<&T>)>;

/// One entry of a [`Select`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption<T> {
    pub label: String,
    pub value: T,
    pub disabled: bool,
}

impl<T> SelectOption<T> {
    #[must_use]
    pub fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
            disabled: false,
        }
    }

    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Configuration for a [`Select`].
pub struct SelectOptions<T> {
    options: Vec<SelectOption<T>>,
    initial_value: Option<T>,
    placeholder: Option<String>,
    validate: Option<OptionValidator<T>>,
    on_change: Option<OptionCallback<T>>,
    on_blur: Option<OptionCallback<T>>,
}

impl<T> SelectOptions<T> {
    #[must_use]
    pub fn new(options: impl IntoIterator<Item = SelectOption<T>>) -> Self {
        Self {
            options: options.into_iter().collect(),
            initial_value: None,
            placeholder: None,
            validate: None,
            on_change: None,
            on_blur: None,
        }
    }

    #[must_use]
    pub fn initial_value(mut self, value: T) -> Self {
        self.initial_value = Some(value);
        self
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    #[must_use]
    pub fn validate(mut self, validate: impl Fn(Option<&T>) -> Vec<String> + 'static) -> Self {
        self.validate = Some(Rc::new(validate));
        self
    }

    #[must_use]
    pub fn on_change(mut self, f: impl Fn(Option<&T>) + 'static) -> Self {
        self.on_change = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_blur(mut self, f: impl Fn(Option<&T>) + 'static) -> Self {
        self.on_blur = Some(Rc::new(f));
        self
    }
}

/// Headless select field.
pub struct Select<T> {
    value: Signal<Option<T>>,
    field: FieldState,
    options: Rc<SelectOptions<T>>,
}

impl<T> Clone for Select<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            field: self.field.clone(),
            options: Rc::clone(&self.options),
        }
    }
}

impl<T: Clone + StrictEq + 'static> Select<T> {
    #[must_use]
    pub fn new(options: SelectOptions<T>) -> Self {
        Self {
            value: Signal::new(options.initial_value.clone()),
            field: FieldState::default(),
            options: Rc::new(options),
        }
    }

    pub fn value_signal(&self) -> &Signal<Option<T>> {
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

    pub fn options(&self) -> &[SelectOption<T>] {
        &self.options.options
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.options.placeholder.as_deref()
    }

    /// The option matching `value`, if any.
    pub fn option_by_value(&self, value: &T) -> Option<&SelectOption<T>> {
        self.options
            .options
            .iter()
            .find(|opt| opt.value.strict_eq(value))
    }

    /// The option matching the current value.
    pub fn selected_option(&self) -> Option<SelectOption<T>> {
        self.value
            .with(|value| value.as_ref().and_then(|v| self.option_by_value(v)).cloned())
    }

    /// The user picked `value`. Validates, then calls `on_change`.
    pub fn change(&self, value: Option<T>) {
        self.value.set(value);
        self.field.dirty.set(true);
        self.validate();
        if let Some(on_change) = &self.options.on_change {
            self.value.with(|value| on_change(value.as_ref()));
        }
    }

    /// The select lost focus.
    pub fn blur(&self) {
        self.field.touched.set(true);
        self.validate();
        if let Some(on_blur) = &self.options.on_blur {
            self.value.with(|value| on_blur(value.as_ref()));
        }
    }

    /// Deselect, marking the field touched and dirty.
    pub fn clear(&self) {
        self.value.set(None);
        self.field.touched.set(true);
        self.field.dirty.set(true);
        self.validate();
    }
}

impl<T: Clone + StrictEq + 'static> FormField for Select<T> {
    type Value = Option<T>;

    fn value(&self) -> Option<T> {
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

    fn validate(&self) -> Vec<String> {
        let errors = match &self.options.validate {
            Some(validate) => self.value.with(|value| validate(value.as_ref())),
            None => Vec::new(),
        };
        self.field.errors.set(errors.clone());
        errors
    }

    fn set_value(&self, value: Option<T>) {
        self.update_value(move |_| value);
    }

    fn update_value(&self, f: impl FnOnce(&Option<T>) -> Option<T>) {
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
