#![forbid(unsafe_code)]

//! Derived values that recompute on demand.
//!
//! A [`Computed<T>`] owns a compute closure over one or more [`Signal`]s and
//! caches its last result. Each source gets a small subscriber that only
//! raises a shared dirty flag; nothing is recomputed until the value is read
//! through [`Computed::get`] or [`Computed::with`]. Views such as "show the
//! error list" (touched && has errors) are built this way.
//!
//! The flag subscribers hold a `Weak` to the flag. When the last handle goes
//! away they finish on the next source change, so a dropped `Computed` costs
//! its sources one extra resumption and is then gone.
//!
//! Reads are consistent: after any source update has returned, the next read
//! reflects it. A source that changes N times between two reads causes one
//! recomputation, not N. `version` counts recomputations.
//!
//! A panicking compute closure leaves the previous cache in place and the
//! flag raised, so the following read tries again. A `Computed` whose source
//! signal was dropped keeps serving its last result.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::ControlFlow;
use std::rc::{Rc, Weak};

use super::signal::{Signal, Subscriber, SubscriptionGuard};
use super::strict_eq::StrictEq;

/// State behind every clone of one [`Computed`].
struct ComputedInner<T> {
    compute: Box<dyn Fn() -> T>,
    /// None only before the first computation.
    cached: Option<T>,
    /// Bumped on each recomputation.
    version: u64,
    /// Guards for manually wired dependencies. Never read.
    _guards: Vec<SubscriptionGuard>,
}

/// Marks a computed dirty on every source change.
struct MarkDirty {
    dirty: Weak<Cell<bool>>,
}

impl<S> Subscriber<S> for MarkDirty {
    fn resume(&mut self, _value: &S) -> ControlFlow<()> {
        match self.dirty.upgrade() {
            Some(dirty) => {
                dirty.set(true);
                ControlFlow::Continue(())
            }
            None => ControlFlow::Break(()),
        }
    }
}

/// Memoized value derived from signals.
///
/// Clones are handles to one shared cache. The compute closure runs only on
/// a read that finds the dirty flag raised (or nothing cached yet).
pub struct Computed<T> {
    inner: Rc<RefCell<ComputedInner<T>>>,
    dirty: Rc<Cell<bool>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            dirty: Rc::clone(&self.dirty),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Computed")
            .field("cached", &inner.cached)
            .field("dirty", &self.dirty.get())
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Clone + 'static> Computed<T> {
    fn with_compute(compute: Box<dyn Fn() -> T>, guards: Vec<SubscriptionGuard>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ComputedInner {
                compute,
                cached: None,
                version: 0,
                _guards: guards,
            })),
            dirty: Rc::new(Cell::new(true)),
        }
    }

    fn track<S: Clone + StrictEq + 'static>(&self, source: &Signal<S>) {
        // The handle is dropped on purpose: MarkDirty detaches itself.
        let _ = source.sub(MarkDirty {
            dirty: Rc::downgrade(&self.dirty),
        });
    }

    /// Derive from one signal.
    pub fn from_signal<S: Clone + StrictEq + 'static>(
        source: &Signal<S>,
        map: impl Fn(&S) -> T + 'static,
    ) -> Self {
        let source_clone = source.clone();
        let computed = Self::with_compute(Box::new(move || source_clone.with(&map)), Vec::new());
        computed.track(source);
        computed
    }

    /// Derive from two signals. `map` sees both values by reference.
    pub fn from2<S1, S2>(
        s1: &Signal<S1>,
        s2: &Signal<S2>,
        map: impl Fn(&S1, &S2) -> T + 'static,
    ) -> Self
    where
        S1: Clone + StrictEq + 'static,
        S2: Clone + StrictEq + 'static,
    {
        let s1_clone = s1.clone();
        let s2_clone = s2.clone();
        let computed = Self::with_compute(
            Box::new(move || s1_clone.with(|v1| s2_clone.with(|v2| map(v1, v2)))),
            Vec::new(),
        );
        computed.track(s1);
        computed.track(s2);
        computed
    }

    /// Derive from three signals. Recomputes when any of them changes.
    pub fn from3<S1, S2, S3>(
        s1: &Signal<S1>,
        s2: &Signal<S2>,
        s3: &Signal<S3>,
        map: impl Fn(&S1, &S2, &S3) -> T + 'static,
    ) -> Self
    where
        S1: Clone + StrictEq + 'static,
        S2: Clone + StrictEq + 'static,
        S3: Clone + StrictEq + 'static,
    {
        let s1_clone = s1.clone();
        let s2_clone = s2.clone();
        let s3_clone = s3.clone();
        let computed = Self::with_compute(
            Box::new(move || {
                s1_clone.with(|v1| s2_clone.with(|v2| s3_clone.with(|v3| map(v1, v2, v3))))
            }),
            Vec::new(),
        );
        computed.track(s1);
        computed.track(s2);
        computed.track(s3);
        computed
    }

    /// Wrap an arbitrary closure.
    ///
    /// Nothing marks the result dirty automatically: the caller wires its own
    /// subscriptions (typically calling [`invalidate`](Self::invalidate)) and
    /// hands their guards over, to be released when the last clone drops.
    pub fn from_fn(compute: impl Fn() -> T + 'static, guards: Vec<SubscriptionGuard>) -> Self {
        Self::with_compute(Box::new(compute), guards)
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Borrow the current value, recomputing first when stale.
    ///
    /// # Panics
    ///
    /// If `f` reads this same `Computed` again.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        if self.dirty.get() || inner.cached.is_none() {
            inner.cached = Some((inner.compute)());
            inner.version += 1;
            self.dirty.set(false);
        }
        let ComputedInner {
            compute, cached, ..
        } = inner;
        f(cached.get_or_insert_with(|| compute()))
    }

    /// True when a source changed since the last read.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Mark the cache stale.
    pub fn invalidate(&self) {
        self.dirty.set(true);
    }

    /// Number of recomputations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_single_source() {
        let code = Signal::new(200);
        let ok = Computed::from_signal(&code, |c| (200..300).contains(c));

        assert!(ok.get());
        assert_eq!(ok.version(), 1);

        code.set(404);
        assert!(ok.is_dirty());
        assert!(!ok.get());
        assert_eq!(ok.version(), 2);
    }

    #[test]
    fn error_visibility_from_two_sources() {
        let touched = Signal::new(false);
        let errors = Signal::new(Vec::<String>::new());
        let show_errors = Computed::from2(&touched, &errors, |t, e| *t && !e.is_empty());

        assert!(!show_errors.get());

        errors.set(vec!["required".into()]);
        assert!(!show_errors.get());

        touched.set(true);
        assert!(show_errors.get());
    }

    #[test]
    fn request_line_from_three_sources() {
        let method = Signal::new("GET");
        let host = Signal::new("example.com".to_string());
        let path = Signal::new("/".to_string());
        let line = Computed::from3(&method, &host, &path, |m, h, p| format!("{m} {h}{p}"));

        assert_eq!(line.get(), "GET example.com/");

        method.set("DELETE");
        path.set("/users/7".into());
        assert_eq!(line.get(), "DELETE example.com/users/7");
        assert_eq!(line.version(), 2);
    }

    #[test]
    fn recomputes_once_per_read_after_changes() {
        let runs = Rc::new(Cell::new(0u32));
        let runs_clone = Rc::clone(&runs);
        let url = Signal::new("https://a".to_string());
        let len = Computed::from_signal(&url, move |u| {
            runs_clone.set(runs_clone.get() + 1);
            u.len()
        });
        assert_eq!(runs.get(), 0, "lazy until first read");

        assert_eq!(len.get(), 9);
        assert_eq!(len.with(|n| *n), 9);
        assert_eq!(runs.get(), 1);

        url.set("https://ab".into());
        url.set("https://abc".into());
        assert_eq!(len.get(), 11);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn suppressed_update_keeps_cache_clean() {
        let method = Signal::new("GET");
        let lower = Computed::from_signal(&method, |m| m.to_lowercase());
        let _ = lower.get();

        method.set("GET");
        assert!(!lower.is_dirty());
        assert_eq!(lower.version(), 1);
    }

    #[test]
    fn invalidate_marks_stale() {
        let source = Signal::new(5);
        let squared = Computed::from_signal(&source, |v| v * v);

        let _ = squared.get();
        squared.invalidate();
        assert!(squared.is_dirty());

        assert_eq!(squared.get(), 25);
        assert_eq!(squared.version(), 2);
    }

    #[test]
    fn with_borrows_without_cloning() {
        let headers = Signal::new(Rc::new(vec!["Accept", "Host"]));
        let joined = Computed::from_signal(&headers, |h| h.join(", "));
        assert_eq!(joined.with(String::len), 12);
    }

    #[test]
    fn clones_share_one_cache() {
        let source = Signal::new(1);
        let a = Computed::from_signal(&source, |v| v + 100);
        let b = a.clone();

        assert_eq!(a.get(), 101);
        source.set(2);
        assert!(b.is_dirty());
        assert_eq!(b.get(), 102);
        assert!(!a.is_dirty());
        assert_eq!(a.version(), 2);
    }

    #[test]
    fn dropped_computed_detaches_on_next_change() {
        let source = Signal::new(0);
        {
            let computed = Computed::from_signal(&source, |v| *v);
            let _ = computed.get();
            assert_eq!(source.subscriber_count(), 1);
        }
        assert_eq!(source.subscriber_count(), 1);
        source.set(1);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn outlives_its_source() {
        let derived;
        {
            let source = Signal::new(3);
            derived = Computed::from_signal(&source, |v| v + 1);
            let _ = derived.get();
        }
        assert_eq!(derived.get(), 4);
        assert!(!derived.is_dirty());
    }

    #[test]
    fn from_fn_keeps_guards_alive() {
        let source = Signal::new(5);
        let flag = Rc::new(Cell::new(false));
        let flag_clone = Rc::clone(&flag);
        let guard = source
            .sub_callback(move |_| flag_clone.set(true))
            .into_guard();

        let source_clone = source.clone();
        let computed = Computed::from_fn(move || source_clone.value() * 3, vec![guard]);
        assert_eq!(computed.get(), 15);
        assert_eq!(source.subscriber_count(), 1);

        // from_fn doesn't auto-dirty, so the caller must invalidate.
        source.set(10);
        assert_eq!(computed.get(), 15);
        computed.invalidate();
        assert_eq!(computed.get(), 30);

        drop(computed);
        assert_eq!(source.subscriber_count(), 0);
        assert!(flag.get());
    }

    #[test]
    fn debug_shows_cache_and_flag() {
        let source = Signal::new(7);
        let computed = Computed::from_signal(&source, |v| *v);
        let _ = computed.get();
        assert_eq!(
            format!("{computed:?}"),
            "Computed { cached: Some(7), dirty: false, version: 1 }"
        );
    }

    #[test]
    fn version_counts_reads_after_changes() {
        let source = Signal::new(0u64);
        let derived = Computed::from_signal(&source, |v| v * 3);

        for i in 1..=20 {
            source.set(i);
            if i % 2 == 0 {
                assert_eq!(derived.get(), i * 3);
            }
        }
        assert_eq!(derived.version(), 10);
    }
}
