#![forbid(unsafe_code)]

//! Tab selection state.
//!
//! Tracks the active tab both by id and by index. Navigation wraps around
//! and skips disabled tabs.

use std::fmt;
use std::rc::Rc;

use apiary_runtime::reactive::{Signal, StrictEq};

use crate::error::{HookError, Result};

/// A single tab entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TabConfig<K> {
    pub id: K,
    pub label: String,
    pub disabled: bool,
    pub icon: Option<String>,
}

impl<K> TabConfig<K> {
    /// Create an enabled tab.
    #[must_use]
    pub fn new(id: K, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            disabled: false,
            icon: None,
        }
    }

    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Configuration for [`Tabs`].
pub struct TabsOptions<K> {
    tabs: Vec<TabConfig<K>>,
    initial_tab: Option<K>,
    on_tab_change: Option<Rc<dyn Fn(&K)>>,
}

impl<K> TabsOptions<K> {
    #[must_use]
    pub fn new(tabs: impl IntoIterator<Item = TabConfig<K>>) -> Self {
        Self {
            tabs: tabs.into_iter().collect(),
            initial_tab: None,
            on_tab_change: None,
        }
    }

    #[must_use]
    pub fn initial_tab(mut self, id: K) -> Self {
        self.initial_tab = Some(id);
        self
    }

    #[must_use]
    pub fn on_tab_change(mut self, f: impl Fn(&K) + 'static) -> Self {
        self.on_tab_change = Some(Rc::new(f));
        self
    }
}

/// Headless tab bar.
pub struct Tabs<K> {
    tabs: Rc<[TabConfig<K>]>,
    active_tab: Signal<K>,
    active_index: Signal<usize>,
    on_tab_change: Option<Rc<dyn Fn(&K)>>,
}

impl<K> Clone for Tabs<K> {
    fn clone(&self) -> Self {
        Self {
            tabs: Rc::clone(&self.tabs),
            active_tab: self.active_tab.clone(),
            active_index: self.active_index.clone(),
            on_tab_change: self.on_tab_change.clone(),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Tabs<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tabs")
            .field("tabs", &self.tabs)
            .field("active_index", &self.active_index)
            .finish()
    }
}

impl<K: Clone + StrictEq + fmt::Debug + 'static> Tabs<K> {
    /// Build the tab bar.
    ///
    /// Without an initial tab, the first enabled tab is active.
    pub fn new(options: TabsOptions<K>) -> Result<Self> {
        let TabsOptions {
            tabs,
            initial_tab,
            on_tab_change,
        } = options;
        if tabs.is_empty() {
            return Err(HookError::NoTabs);
        }

        let index = match &initial_tab {
            Some(id) => tabs
                .iter()
                .position(|tab| tab.id.strict_eq(id))
                .ok_or_else(|| HookError::tab_not_found(id))?,
            None => tabs
                .iter()
                .position(|tab| !tab.disabled)
                .ok_or(HookError::NoEnabledTabs)?,
        };
        let initial = &tabs[index];
        if initial.disabled {
            return Err(HookError::tab_disabled(&initial.id));
        }

        Ok(Self {
            active_tab: Signal::new(initial.id.clone()),
            active_index: Signal::new(index),
            tabs: tabs.into(),
            on_tab_change,
        })
    }

    pub fn tabs(&self) -> &[TabConfig<K>] {
        &self.tabs
    }

    pub fn active_tab_signal(&self) -> &Signal<K> {
        &self.active_tab
    }

    pub fn active_index_signal(&self) -> &Signal<usize> {
        &self.active_index
    }

    #[must_use]
    pub fn active_tab(&self) -> K {
        self.active_tab.value()
    }

    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active_index.value()
    }

    /// Activate the tab with `id`.
    ///
    /// Activating the current tab does nothing, even if it has since been
    /// reported as disabled.
    pub fn set_active_tab(&self, id: &K) -> Result<()> {
        let index = self
            .tab_index(id)
            .ok_or_else(|| HookError::tab_not_found(id))?;
        if index == self.active_index.value() {
            return Ok(());
        }
        if self.tabs[index].disabled {
            return Err(HookError::tab_disabled(id));
        }
        self.activate(index, "select");
        Ok(())
    }

    /// Activate the tab at `index`.
    pub fn set_active_tab_by_index(&self, index: usize) -> Result<()> {
        let tab = self
            .tabs
            .get(index)
            .ok_or(HookError::TabIndexOutOfBounds { index })?;
        if tab.disabled {
            return Err(HookError::tab_disabled(&tab.id));
        }
        if index == self.active_index.value() {
            return Ok(());
        }
        self.activate(index, "select_index");
        Ok(())
    }

    /// Move to the next enabled tab, wrapping around.
    ///
    /// Returns whether the active tab changed.
    pub fn next_tab(&self) -> bool {
        let len = self.tabs.len();
        let active = self.active_index.value();
        let target = (1..=len)
            .map(|step| (active + step) % len)
            .find(|&idx| !self.tabs[idx].disabled);
        match target {
            Some(idx) if idx != active => {
                self.activate(idx, "next");
                true
            }
            _ => false,
        }
    }

    /// Move to the previous enabled tab, wrapping around.
    ///
    /// Returns whether the active tab changed.
    pub fn prev_tab(&self) -> bool {
        let len = self.tabs.len();
        let active = self.active_index.value();
        let target = (1..=len)
            .map(|step| (active + len - step) % len)
            .find(|&idx| !self.tabs[idx].disabled);
        match target {
            Some(idx) if idx != active => {
                self.activate(idx, "prev");
                true
            }
            _ => false,
        }
    }

    /// Unknown ids count as enabled.
    #[must_use]
    pub fn is_tab_disabled(&self, id: &K) -> bool {
        self.tab_by_id(id).is_some_and(|tab| tab.disabled)
    }

    #[must_use]
    pub fn tab_index(&self, id: &K) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.id.strict_eq(id))
    }

    #[must_use]
    pub fn tab_by_id(&self, id: &K) -> Option<&TabConfig<K>> {
        self.tabs.iter().find(|tab| tab.id.strict_eq(id))
    }

    fn activate(
        &self,
        index: usize,
        #[cfg_attr(not(feature = "tracing"), allow(unused_variables))] reason: &str,
    ) {
        #[cfg(feature = "tracing")]
        let from = self.active_index.value();
        let id = self.tabs[index].id.clone();
        self.active_index.set(index);
        self.active_tab.set(id.clone());
        #[cfg(feature = "tracing")]
        Self::log_switch(reason, from, index);
        if let Some(on_tab_change) = &self.on_tab_change {
            on_tab_change(&id);
        }
    }

    #[cfg(feature = "tracing")]
    fn log_switch(reason: &str, from: usize, to: usize) {
        tracing::debug!(message = "tabs.switch", reason, from, to);
    }
}
