#![forbid(unsafe_code)]

//! Apiary headless frontend facade crate.
//!
//! Re-exports the signal runtime and, with the default `hooks` feature, the
//! headless state hooks built on top of it.

pub use apiary_runtime::strict_eq_by_value;

pub mod prelude {
    #[cfg(feature = "hooks")]
    pub use apiary_hooks as hooks;
    pub use apiary_runtime as runtime;

    pub use apiary_runtime::{
        Computed, Signal, StrictEq, Subscriber, SubscriptionGuard, Unsubscribe,
    };

    #[cfg(feature = "hooks")]
    pub use apiary_hooks::{
        Button, ButtonOptions, FormField, HookError, HttpRequest, HttpResponse, Input,
        InputOptions, RequestOperations, RequestOperationsOptions, RequestState, ResponseState,
        Select, SelectOptions, Tabs, TabsOptions,
    };
}
