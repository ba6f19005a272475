#![forbid(unsafe_code)]

//! Send/update bookkeeping for a request editor.
//!
//! Sends and updates are tracked on separate lanes, each with its own
//! in-flight counter, busy flag and last error. An optional [`LoadingSink`]
//! (usually the [`ResponseState`](crate::ResponseState)) shows loading while
//! either lane is busy.
//!
//! [`RequestOperations::reset`] bumps a reset token. Operations that started
//! under an older token still complete and return their result to the
//! caller, but they no longer touch any state.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use apiary_runtime::reactive::Signal;

use crate::callback::{self, AsyncHandler};
use crate::error::{HookError, Result};
use crate::response::LoadingSink;

/// Configuration for [`RequestOperations`].
pub struct RequestOperationsOptions<Req, Resp> {
    on_send: AsyncHandler<Req, Option<Resp>>,
    on_update: AsyncHandler<Req, ()>,
    sink: Option<Rc<dyn LoadingSink>>,
}

impl<Req: 'static, Resp: 'static> RequestOperationsOptions<Req, Resp> {
    /// `on_send` performs the request and yields the response, if any.
    #[must_use]
    pub fn new<F, Fut>(on_send: F) -> Self
    where
        F: Fn(Req) -> Fut + 'static,
        Fut: Future<Output = Result<Option<Resp>>> + 'static,
    {
        Self {
            on_send: callback::handler(on_send),
            on_update: callback::noop(),
            sink: None,
        }
    }

    /// Persist an edited request. Defaults to succeeding immediately.
    #[must_use]
    pub fn on_update<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Req) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        self.on_update = callback::handler(f);
        self
    }

    /// Mirror the combined busy state into `sink`.
    #[must_use]
    pub fn response(mut self, sink: impl LoadingSink + 'static) -> Self {
        self.sink = Some(Rc::new(sink));
        self
    }
}

struct Lane {
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    name: &'static str,
    active: Signal<bool>,
    error: Signal<Option<Rc<HookError>>>,
    in_flight: Cell<usize>,
}

impl Lane {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            active: Signal::new(false),
            error: Signal::new(None),
            in_flight: Cell::new(0),
        }
    }

    fn clear(&self) {
        self.in_flight.set(0);
        self.active.set(false);
        self.error.set(None);
    }
}

struct Shared<Req, Resp> {
    send: Lane,
    update: Lane,
    reset_token: Cell<u64>,
    options: RequestOperationsOptions<Req, Resp>,
}

impl<Req, Resp> Shared<Req, Resp> {
    fn set_sink_loading(&self, loading: bool) {
        if let Some(sink) = &self.options.sink {
            sink.set_loading(loading);
        }
    }

    fn begin<'a>(&'a self, lane: &'a Lane) -> Pending<'a, Req, Resp> {
        lane.in_flight.set(lane.in_flight.get() + 1);
        lane.active.set(true);
        self.set_sink_loading(true);
        lane.error.set(None);
        Pending {
            shared: self,
            lane,
            token: self.reset_token.get(),
            error: None,
        }
    }

    fn settle(&self, lane: &Lane, token: u64, error: Option<&HookError>) {
        if token != self.reset_token.get() {
            #[cfg(feature = "tracing")]
            tracing::debug!(message = "operations.stale", lane = lane.name, token);
            return;
        }
        if let Some(err) = error {
            lane.error.set(Some(Rc::new(err.clone())));
        }
        let remaining = lane.in_flight.get().saturating_sub(1);
        lane.in_flight.set(remaining);
        lane.active.set(remaining > 0);
        let total = self.send.in_flight.get() + self.update.in_flight.get();
        self.set_sink_loading(total > 0);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = "operations.settle",
            lane = lane.name,
            ok = error.is_none(),
            in_flight = remaining
        );
    }
}

/// One started operation. Settles its lane when dropped, so a future that
/// is abandoned mid-await still releases the busy flags.
struct Pending<'a, Req, Resp> {
    shared: &'a Shared<Req, Resp>,
    lane: &'a Lane,
    token: u64,
    error: Option<HookError>,
}

impl<Req, Resp> Pending<'_, Req, Resp> {
    /// Settle with the handler's outcome.
    fn finish(mut self, error: Option<&HookError>) {
        self.error = error.cloned();
    }
}

impl<Req, Resp> Drop for Pending<'_, Req, Resp> {
    fn drop(&mut self) {
        self.shared.settle(self.lane, self.token, self.error.as_ref());
    }
}

/// Send and update state for one request editor.
pub struct RequestOperations<Req, Resp> {
    shared: Rc<Shared<Req, Resp>>,
}

impl<Req, Resp> Clone for RequestOperations<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<Req: 'static, Resp: 'static> RequestOperations<Req, Resp> {
    #[must_use]
    pub fn new(options: RequestOperationsOptions<Req, Resp>) -> Self {
        Self {
            shared: Rc::new(Shared {
                send: Lane::new("send"),
                update: Lane::new("update"),
                reset_token: Cell::new(0),
                options,
            }),
        }
    }

    pub fn sending_signal(&self) -> &Signal<bool> {
        &self.shared.send.active
    }

    pub fn updating_signal(&self) -> &Signal<bool> {
        &self.shared.update.active
    }

    pub fn send_error_signal(&self) -> &Signal<Option<Rc<HookError>>> {
        &self.shared.send.error
    }

    pub fn update_error_signal(&self) -> &Signal<Option<Rc<HookError>>> {
        &self.shared.update.error
    }

    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.shared.send.active.value()
    }

    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.shared.update.active.value()
    }

    #[must_use]
    pub fn send_error(&self) -> Option<Rc<HookError>> {
        self.shared.send.error.value()
    }

    #[must_use]
    pub fn update_error(&self) -> Option<Rc<HookError>> {
        self.shared.update.error.value()
    }

    /// Send `request` through `on_send`.
    pub async fn send(&self, request: Req) -> Result<Option<Resp>> {
        let shared = &self.shared;
        let pending = shared.begin(&shared.send);
        let result = (shared.options.on_send)(request).await;
        pending.finish(result.as_ref().err());
        result
    }

    /// Persist `request` through `on_update`.
    pub async fn update(&self, request: Req) -> Result<()> {
        let shared = &self.shared;
        let pending = shared.begin(&shared.update);
        let result = (shared.options.on_update)(request).await;
        pending.finish(result.as_ref().err());
        result
    }

    /// Forget every in-flight operation and clear both lanes.
    pub fn reset(&self) {
        let shared = &self.shared;
        shared.reset_token.set(shared.reset_token.get() + 1);
        shared.send.clear();
        shared.update.clear();
        shared.set_sink_loading(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{HttpRequest, KeyValue};
    use crate::response::{HttpResponse, ResponseState};
    use futures::channel::oneshot;
    use futures::FutureExt;
    use futures::executor::{LocalPool, block_on};
    use futures::task::LocalSpawnExt;
    use std::cell::RefCell;

    type Ops = RequestOperations<HttpRequest, HttpResponse>;

    fn request() -> HttpRequest {
        HttpRequest::new("GET", "https://api.example.com/users")
    }

    fn pong(req: HttpRequest) -> HttpResponse {
        HttpResponse {
            code: 200,
            body: req.url,
            headers: vec![KeyValue::new("X-Test", "1")],
        }
    }

    /// Handler whose calls block until the matching sender fires.
    /// `Ok(true)` completes the call, `Ok(false)` fails it.
    #[derive(Clone, Default)]
    struct Gates {
        senders: Rc<RefCell<Vec<oneshot::Sender<bool>>>>,
    }

    impl Gates {
        fn push(&self) -> oneshot::Receiver<bool> {
            let (tx, rx) = oneshot::channel();
            self.senders.borrow_mut().push(tx);
            rx
        }

        fn release(&self, ok: bool) {
            let tx = self.senders.borrow_mut().remove(0);
            tx.send(ok).expect("gate receiver alive");
        }
    }

    fn gated_send(gates: &Gates) -> RequestOperationsOptions<HttpRequest, HttpResponse> {
        let gates = gates.clone();
        RequestOperationsOptions::new(move |req: HttpRequest| {
            let rx = gates.push();
            async move {
                match rx.await {
                    Ok(true) => Ok(Some(pong(req))),
                    _ => Err(HookError::operation("Network error")),
                }
            }
        })
    }

    fn gated_update(
        options: RequestOperationsOptions<HttpRequest, HttpResponse>,
        gates: &Gates,
    ) -> RequestOperationsOptions<HttpRequest, HttpResponse> {
        let gates = gates.clone();
        options.on_update(move |_| {
            let rx = gates.push();
            async move {
                match rx.await {
                    Ok(true) => Ok(()),
                    _ => Err(HookError::operation("Update failed")),
                }
            }
        })
    }

    fn spawn_send(pool: &LocalPool, ops: &Ops) {
        let ops = ops.clone();
        pool.spawner()
            .spawn_local(async move {
                let _ = ops.send(request()).await;
            })
            .expect("spawn");
    }

    fn spawn_update(pool: &LocalPool, ops: &Ops) {
        let ops = ops.clone();
        pool.spawner()
            .spawn_local(async move {
                let _ = ops.update(request()).await;
            })
            .expect("spawn");
    }

    #[test]
    fn send_returns_response() {
        let ops = Ops::new(RequestOperationsOptions::new(|req: HttpRequest| async move {
            Ok(Some(pong(req)))
        }));
        let resp = block_on(ops.send(request())).expect("send");
        assert_eq!(
            resp.map(|r| r.body),
            Some("https://api.example.com/users".to_string())
        );
        assert!(!ops.is_sending());
        assert!(ops.send_error().is_none());
    }

    #[test]
    fn send_may_yield_no_response() {
        let ops = Ops::new(RequestOperationsOptions::new(|_| async { Ok(None) }));
        assert_eq!(block_on(ops.send(request())), Ok(None));
    }

    #[test]
    fn send_failure_is_recorded_and_returned() {
        let ops = Ops::new(RequestOperationsOptions::new(|_| async {
            Err(HookError::operation("Network error"))
        }));
        let err = block_on(ops.send(request())).expect_err("fails");
        assert_eq!(err.to_string(), "Network error");
        assert_eq!(ops.send_error().as_deref(), Some(&err));
        assert!(ops.update_error().is_none());
        assert!(!ops.is_sending());
    }

    #[test]
    fn update_defaults_to_success() {
        let ops = Ops::new(RequestOperationsOptions::new(|_| async { Ok(None) }));
        block_on(ops.update(request())).expect("update");
        assert!(!ops.is_updating());
        assert!(ops.update_error().is_none());
    }

    #[test]
    fn update_failure_stays_on_its_lane() {
        let ops = Ops::new(
            RequestOperationsOptions::new(|_| async { Ok(None) })
                .on_update(|_| async { Err(HookError::operation("Update failed")) }),
        );
        assert!(block_on(ops.update(request())).is_err());
        assert_eq!(
            ops.update_error().map(|e| e.to_string()),
            Some("Update failed".into())
        );
        assert!(ops.send_error().is_none());
    }

    #[test]
    fn new_operation_clears_previous_error() {
        let fail = Rc::new(Cell::new(true));
        let fail_clone = Rc::clone(&fail);
        let ops = Ops::new(RequestOperationsOptions::new(move |_| {
            let fail = fail_clone.get();
            async move {
                if fail {
                    Err(HookError::operation("Network error"))
                } else {
                    Ok(None)
                }
            }
        }));
        assert!(block_on(ops.send(request())).is_err());
        fail.set(false);
        block_on(ops.send(request())).expect("send");
        assert!(ops.send_error().is_none());
    }

    #[test]
    fn sink_tracks_both_lanes() {
        let sends = Gates::default();
        let updates = Gates::default();
        let response = ResponseState::<HttpResponse>::new();
        let ops = Ops::new(gated_update(gated_send(&sends), &updates).response(response.clone()));
        let mut pool = LocalPool::new();

        spawn_send(&pool, &ops);
        spawn_update(&pool, &ops);
        pool.run_until_stalled();
        assert!(ops.is_sending());
        assert!(ops.is_updating());
        assert!(response.is_loading());

        // Send settles first; the update keeps the sink busy.
        sends.release(true);
        pool.run_until_stalled();
        assert!(!ops.is_sending());
        assert!(ops.is_updating());
        assert!(response.is_loading());

        updates.release(true);
        pool.run_until_stalled();
        assert!(!ops.is_updating());
        assert!(!response.is_loading());
    }

    #[test]
    fn overlapping_sends_hold_sending_until_last() {
        let gates = Gates::default();
        let ops = Ops::new(gated_send(&gates));
        let mut pool = LocalPool::new();

        spawn_send(&pool, &ops);
        spawn_send(&pool, &ops);
        pool.run_until_stalled();

        gates.release(false);
        pool.run_until_stalled();
        assert!(ops.is_sending());
        assert!(ops.send_error().is_some());

        gates.release(true);
        pool.run_until_stalled();
        assert!(!ops.is_sending());
        // The failure is kept until a new operation begins.
        assert!(ops.send_error().is_some());
    }

    #[test]
    fn reset_detaches_in_flight_operations() {
        let gates = Gates::default();
        let response = ResponseState::<HttpResponse>::new();
        let ops = Ops::new(gated_send(&gates).response(response.clone()));
        let mut pool = LocalPool::new();

        spawn_send(&pool, &ops);
        pool.run_until_stalled();
        assert!(ops.is_sending());

        ops.reset();
        assert!(!ops.is_sending());
        assert!(!response.is_loading());

        // A send started after the reset is tracked normally.
        spawn_send(&pool, &ops);
        pool.run_until_stalled();
        assert!(ops.is_sending());

        // The stale send fails: no error recorded, counter untouched.
        gates.release(false);
        pool.run_until_stalled();
        assert!(ops.send_error().is_none());
        assert!(ops.is_sending());
        assert!(response.is_loading());

        gates.release(true);
        pool.run_until_stalled();
        assert!(!ops.is_sending());
        assert!(!response.is_loading());
    }

    #[test]
    fn stale_operation_still_returns_its_result() {
        let gates = Gates::default();
        let ops = Ops::new(gated_send(&gates));
        let mut pool = LocalPool::new();
        let result = Rc::new(RefCell::new(None));

        let task_ops = ops.clone();
        let task_result = Rc::clone(&result);
        pool.spawner()
            .spawn_local(async move {
                *task_result.borrow_mut() = Some(task_ops.send(request()).await);
            })
            .expect("spawn");
        pool.run_until_stalled();

        ops.reset();
        gates.release(false);
        pool.run_until_stalled();
        assert_eq!(
            *result.borrow(),
            Some(Err(HookError::operation("Network error")))
        );
        assert!(ops.send_error().is_none());
    }

    fn hanging() -> Ops {
        Ops::new(
            RequestOperationsOptions::new(|_| std::future::pending())
                .on_update(|_| std::future::pending()),
        )
    }

    #[test]
    fn dropped_send_settles_lane_and_sink() {
        let response = ResponseState::<HttpResponse>::new();
        let ops = Ops::new(
            RequestOperationsOptions::new(|_| std::future::pending()).response(response.clone()),
        );

        let mut send = Box::pin(ops.send(request()));
        assert!(send.as_mut().now_or_never().is_none());
        assert!(ops.is_sending());
        assert!(response.is_loading());

        drop(send);
        assert!(!ops.is_sending());
        assert!(!response.is_loading());
        assert!(ops.send_error().is_none());
    }

    #[test]
    fn dropped_update_settles_lane() {
        let ops = hanging();
        let mut update = Box::pin(ops.update(request()));
        assert!(update.as_mut().now_or_never().is_none());
        assert!(ops.is_updating());

        drop(update);
        assert!(!ops.is_updating());
        assert!(ops.update_error().is_none());
    }

    #[test]
    fn dropping_stale_operation_leaves_new_one_busy() {
        let ops = hanging();
        let mut stale = Box::pin(ops.send(request()));
        assert!(stale.as_mut().now_or_never().is_none());

        ops.reset();
        let mut fresh = Box::pin(ops.send(request()));
        assert!(fresh.as_mut().now_or_never().is_none());

        drop(stale);
        assert!(ops.is_sending());
        drop(fresh);
        assert!(!ops.is_sending());
    }

    #[test]
    fn reset_clears_errors() {
        let ops = Ops::new(
            RequestOperationsOptions::new(|_| async { Err("send".into()) })
                .on_update(|_| async { Err("update".into()) }),
        );
        let _ = block_on(ops.send(request()));
        let _ = block_on(ops.update(request()));
        ops.reset();
        assert!(ops.send_error().is_none());
        assert!(ops.update_error().is_none());
    }
}
