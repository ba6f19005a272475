#![forbid(unsafe_code)]

//! Headless state hooks for the Apiary frontend.
//!
//! Each hook is a cheap, cloneable handle over a few [`Signal`]s. Views read
//! state through getters or subscribe to the signals directly; actions
//! mutate the signals and notify synchronously.
//!
//! Operations that talk to the host (saving a request, sending it) are
//! `async` and take caller-supplied callbacks. Hooks never spawn; drive them
//! with any single-threaded executor.
//!
//! [`Signal`]: apiary_runtime::reactive::Signal

pub mod callback;
pub mod error;
pub mod form;
pub mod format;
pub mod operations;
pub mod request;
pub mod response;
pub mod tabs;

pub use callback::AsyncHandler;
pub use error::{HookError, Result};
pub use form::{
    Button, ButtonOptions, FormField, Input, InputOptions, Select, SelectOption, SelectOptions,
};
pub use format::{format_bodies, format_body};
pub use operations::{RequestOperations, RequestOperationsOptions};
pub use request::{HttpRequest, KeyValue, RequestOptions, RequestPatch, RequestState};
pub use response::{HttpResponse, LoadingSink, ResponseState};
pub use tabs::{TabConfig, Tabs, TabsOptions};
