#![forbid(unsafe_code)]

//! Equality used for no-op suppression in [`Signal::update`].
//!
//! Scalars and strings compare by value. Shared references compare by
//! identity: two `Rc`s with identical contents but different allocations are
//! different values, and replacing one with the other notifies subscribers.
//! Owned collections such as `Vec` never compare equal, since every
//! collection an updater produces is a fresh one. Wrap a collection in `Rc`
//! when identical updates should be suppressed.
//!
//! Structural equality is never used for composite values.
//!
//! [`Signal::update`]: super::Signal::update

use std::rc::Rc;
use std::sync::Arc;

/// Strict equality between two values of the same type.
pub trait StrictEq {
    /// Whether replacing `self` with `other` is a no-op.
    fn strict_eq(&self, other: &Self) -> bool;
}

/// Implement [`StrictEq`] through `PartialEq` for value-like types.
///
/// Use this for plain data such as tab identifiers or small `Copy` enums:
///
/// ```
/// use apiary_runtime::strict_eq_by_value;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Pane {
///     Body,
///     Headers,
/// }
///
/// strict_eq_by_value!(Pane);
/// ```
#[macro_export]
macro_rules! strict_eq_by_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::reactive::StrictEq for $ty {
                #[inline]
                fn strict_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )+
    };
}

crate::strict_eq_by_value!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
    &'static str,
);

impl<T: ?Sized> StrictEq for Rc<T> {
    #[inline]
    fn strict_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> StrictEq for Arc<T> {
    #[inline]
    fn strict_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: StrictEq> StrictEq for Option<T> {
    fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.strict_eq(b),
            _ => false,
        }
    }
}

impl<T> StrictEq for Vec<T> {
    #[inline]
    fn strict_eq(&self, _other: &Self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_compare_by_value() {
        assert!(5i32.strict_eq(&5));
        assert!(!5i32.strict_eq(&6));
        assert!(true.strict_eq(&true));
        assert!('x'.strict_eq(&'x'));
        assert!(String::from("a").strict_eq(&"a".to_string()));
        assert!("a".strict_eq(&"a"));
    }

    #[test]
    fn nan_is_never_equal() {
        assert!(!f64::NAN.strict_eq(&f64::NAN));
        assert!(0.0f64.strict_eq(&-0.0));
    }

    #[test]
    fn rc_compares_by_identity() {
        let a = Rc::new(vec![1, 2, 3]);
        let b = Rc::new(vec![1, 2, 3]);
        assert!(a.strict_eq(&Rc::clone(&a)));
        assert!(!a.strict_eq(&b));
    }

    #[test]
    fn arc_compares_by_identity() {
        let a: Arc<str> = Arc::from("body");
        let b: Arc<str> = Arc::from("body");
        assert!(a.strict_eq(&Arc::clone(&a)));
        assert!(!a.strict_eq(&b));
    }

    #[test]
    fn option_delegates_to_inner() {
        assert!(None::<i32>.strict_eq(&None));
        assert!(Some(1).strict_eq(&Some(1)));
        assert!(!Some(1).strict_eq(&None));

        let shared = Rc::new(1);
        assert!(Some(Rc::clone(&shared)).strict_eq(&Some(Rc::clone(&shared))));
        assert!(!Some(shared).strict_eq(&Some(Rc::new(1))));
    }

    #[test]
    fn vec_is_always_a_new_value() {
        let v: Vec<String> = Vec::new();
        assert!(!v.strict_eq(&Vec::new()));
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Pane {
        Body,
        Headers,
    }

    crate::strict_eq_by_value!(Pane);

    #[test]
    fn macro_derives_value_equality() {
        assert!(Pane::Body.strict_eq(&Pane::Body));
        assert!(!Pane::Body.strict_eq(&Pane::Headers));
    }
}
