#![forbid(unsafe_code)]

//! Form fields: text input, select, and button state.

pub mod button;
pub mod input;
pub mod select;

pub use button::{Button, ButtonOptions};
pub use input::{Input, InputOptions};
pub use select::{Select, SelectOption, SelectOptions};

use apiary_runtime::reactive::Signal;

/// Common surface of editable form fields.
pub trait FormField {
    type Value;

    fn value(&self) -> Self::Value;
    fn touched(&self) -> bool;
    fn dirty(&self) -> bool;
    fn errors(&self) -> Vec<String>;

    /// Run the validator, store and return its errors.
    fn validate(&self) -> Vec<String>;
    fn set_value(&self, value: Self::Value);
    fn update_value(&self, f: impl FnOnce(&Self::Value) -> Self::Value);
    fn set_touched(&self, touched: bool);
    /// Restore the initial value and clear touched, dirty and errors.
    fn reset(&self);

    fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }
}

/// Interaction state shared by every field.
#[derive(Debug, Clone, Default)]
pub(crate) struct FieldState {
    pub(crate) touched: Signal<bool>,
    pub(crate) dirty: Signal<bool>,
    pub(crate) errors: Signal<Vec<String>>,
}

impl FieldState {
    pub(crate) fn reset(&self) {
        self.touched.set(false);
        self.dirty.set(false);
        self.errors.set(Vec::new());
    }
}
