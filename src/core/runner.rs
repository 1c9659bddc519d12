//! # Run one worker from start to self-removal.
//!
//! [`run_worker`] is the body of the tokio task spawned by `Controller::create`.
//!
//! ## Flow
//! ```text
//! execute(kind)  ── Fixed:    select { cancelled → Stop, lifetime → Timeout }
//!                ── Periodic: loop { check cancel; Heartbeat(n); select { cancelled, lifetime, sleep(interval) } }
//!                ── Custom:   select { body → Normal/Stop/Failed, lifetime → cancel body, await it → Timeout }
//!        │
//!        ▼   (panics caught and reported as Failed)
//! handle.complete(state) ─► publish WorkerExited
//!        ▼
//! registry.remove(handle) ─► publish WorkerRemoved (only if still ours)
//!        ▼
//! handle.mark_finished()   (wakes stop / stop_all waiters)
//! ```
//!
//! ## Rules
//! - Cancellation is observed only at suspension points; a body that never
//!   yields is never interrupted
//! - Every exit path records exactly one terminal state and removes at most once
//! - Cancellation wins ties (`biased` select)

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    core::registry::WorkerRegistry,
    error::WorkError,
    events::{Bus, Event, EventKind},
    subscribers::panic_message,
    workers::{CompletionState, WorkRef, WorkerHandle, WorkerKind},
};

/// Executes the worker behind `handle` and cleans up after it.
pub(crate) async fn run_worker(handle: Arc<WorkerHandle>, registry: Arc<WorkerRegistry>, bus: Bus) {
    let outcome = std::panic::AssertUnwindSafe(execute(&handle, &bus))
        .catch_unwind()
        .await;
    let (state, failure) = match outcome {
        Ok(done) => done,
        Err(panic) => (
            CompletionState::Failed,
            Some(format!("panicked: {}", panic_message(panic.as_ref()))),
        ),
    };

    handle.complete(state);
    let mut exited = Event::new(EventKind::WorkerExited)
        .with_worker(handle.name())
        .with_state(state);
    if let Some(reason) = failure {
        exited = exited.with_reason(reason);
    }
    bus.publish(exited);

    if registry.remove(&handle).await {
        bus.publish(
            Event::new(EventKind::WorkerRemoved)
                .with_worker(handle.name())
                .with_reason("self"),
        );
    }
    handle.mark_finished();
}

async fn execute(handle: &WorkerHandle, bus: &Bus) -> (CompletionState, Option<String>) {
    let token = handle.cancel_token();
    // A lifetime past the end of the clock means no deadline.
    let deadline = handle
        .spec()
        .lifetime()
        .and_then(|l| Instant::now().checked_add(l));

    match handle.spec().kind() {
        WorkerKind::Fixed => (run_fixed(token, deadline).await, None),
        WorkerKind::Periodic { interval } => (
            run_periodic(handle.name(), token, *interval, deadline, bus).await,
            None,
        ),
        WorkerKind::Custom(work) => run_custom(work, token, deadline).await,
    }
}

/// Resolves at `deadline`, or never.
async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

async fn run_fixed(token: &CancellationToken, deadline: Option<Instant>) -> CompletionState {
    tokio::select! {
        biased;
        _ = token.cancelled() => CompletionState::CompletedByStop,
        _ = expiry(deadline) => CompletionState::CompletedByTimeout,
    }
}

async fn run_periodic(
    name: &str,
    token: &CancellationToken,
    interval: Duration,
    deadline: Option<Instant>,
    bus: &Bus,
) -> CompletionState {
    let mut iteration: u64 = 0;
    loop {
        if token.is_cancelled() {
            return CompletionState::CompletedByStop;
        }
        iteration += 1;
        bus.publish(
            Event::new(EventKind::Heartbeat)
                .with_worker(name)
                .with_iteration(iteration),
        );

        tokio::select! {
            biased;
            _ = token.cancelled() => return CompletionState::CompletedByStop,
            _ = expiry(deadline) => return CompletionState::CompletedByTimeout,
            _ = time::sleep(interval) => {}
        }
    }
}

async fn run_custom(
    work: &WorkRef,
    token: &CancellationToken,
    deadline: Option<Instant>,
) -> (CompletionState, Option<String>) {
    // Separate token so lifetime expiry does not look like a stop request.
    let ctx = token.child_token();
    let body = work.run(ctx.clone());
    tokio::pin!(body);

    tokio::select! {
        res = &mut body => classify(res, token.is_cancelled()),
        _ = expiry(deadline) => {
            ctx.cancel();
            let _ = body.await;
            (CompletionState::CompletedByTimeout, None)
        }
    }
}

fn classify(res: Result<(), WorkError>, stop_requested: bool) -> (CompletionState, Option<String>) {
    match res {
        Ok(()) if stop_requested => (CompletionState::CompletedByStop, None),
        Ok(()) => (CompletionState::CompletedNormally, None),
        Err(WorkError::Canceled) => (CompletionState::CompletedByStop, None),
        Err(e) => (CompletionState::Failed, Some(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workers::{WorkFn, WorkerSpec};

    async fn spawn(spec: WorkerSpec) -> (Arc<WorkerHandle>, Arc<WorkerRegistry>, Bus) {
        let registry = Arc::new(WorkerRegistry::new());
        let bus = Bus::new(64);
        let handle = Arc::new(WorkerHandle::new(spec));
        registry.insert_if_absent(handle.clone()).await.unwrap();
        tokio::spawn(run_worker(handle.clone(), registry.clone(), bus.clone()));
        (handle, registry, bus)
    }

    #[tokio::test]
    async fn fixed_worker_expires_and_removes_itself() {
        let (h, reg, _bus) = spawn(WorkerSpec::fixed("f", Duration::from_millis(20))).await;
        assert!(h.wait_finished(Duration::from_secs(1)).await);
        assert_eq!(h.state(), CompletionState::CompletedByTimeout);
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn fixed_worker_wakes_early_on_stop() {
        let (h, reg, _bus) = spawn(WorkerSpec::fixed("f", Duration::from_secs(60))).await;
        h.request_stop();
        assert!(h.wait_finished(Duration::from_secs(1)).await);
        assert_eq!(h.state(), CompletionState::CompletedByStop);
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn periodic_worker_heartbeats_with_increasing_counter() {
        let registry = Arc::new(WorkerRegistry::new());
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let h = Arc::new(WorkerHandle::new(WorkerSpec::periodic(
            "p",
            true,
            Duration::from_millis(5),
        )));
        registry.insert_if_absent(h.clone()).await.unwrap();
        tokio::spawn(run_worker(h.clone(), registry.clone(), bus.clone()));

        let mut seen = Vec::new();
        while seen.len() < 3 {
            let ev = rx.recv().await.unwrap();
            if ev.kind == EventKind::Heartbeat {
                seen.push(ev.iteration.unwrap());
            }
        }
        assert_eq!(seen, vec![1, 2, 3]);

        h.request_stop();
        assert!(h.wait_finished(Duration::from_secs(1)).await);
        assert_eq!(h.state(), CompletionState::CompletedByStop);
    }

    #[tokio::test]
    async fn periodic_worker_with_lifetime_expires() {
        let spec = WorkerSpec::periodic("p", true, Duration::from_millis(5))
            .with_lifetime(Some(Duration::from_millis(30)));
        let (h, _reg, _bus) = spawn(spec).await;
        assert!(h.wait_finished(Duration::from_secs(1)).await);
        assert_eq!(h.state(), CompletionState::CompletedByTimeout);
    }

    #[tokio::test]
    async fn unrepresentable_lifetime_runs_until_stopped() {
        let spec: WorkerSpec = match "create,w,18446744073709551615".parse::<crate::command::Command>() {
            Ok(crate::command::Command::Create {
                name,
                lifetime: Some(lifetime),
            }) => WorkerSpec::fixed(name, lifetime),
            other => panic!("unexpected parse: {other:?}"),
        };
        let (h, reg, _bus) = spawn(spec).await;

        assert!(!h.wait_finished(Duration::from_millis(100)).await);
        assert_eq!(h.state(), CompletionState::Running);
        assert_eq!(reg.len().await, 1);

        h.request_stop();
        assert!(h.wait_finished(Duration::from_secs(1)).await);
        assert_eq!(h.state(), CompletionState::CompletedByStop);
    }

    #[tokio::test]
    async fn custom_body_outcomes_map_to_states() {
        let ok = WorkFn::arc(|_ctx: CancellationToken| async { Ok::<_, WorkError>(()) });
        let (h, _, _) = spawn(WorkerSpec::custom("ok", ok)).await;
        assert!(h.wait_finished(Duration::from_secs(1)).await);
        assert_eq!(h.state(), CompletionState::CompletedNormally);

        let bad = WorkFn::arc(|_ctx: CancellationToken| async { Err::<(), _>(WorkError::fail("nope")) });
        let (h, _, _) = spawn(WorkerSpec::custom("bad", bad)).await;
        assert!(h.wait_finished(Duration::from_secs(1)).await);
        assert_eq!(h.state(), CompletionState::Failed);
    }

    #[tokio::test]
    async fn custom_body_panic_still_removes_entry() {
        let boom = WorkFn::arc(|_ctx: CancellationToken| async {
            if true {
                panic!("body exploded");
            }
            Ok::<_, WorkError>(())
        });
        let (h, reg, _) = spawn(WorkerSpec::custom("boom", boom)).await;
        assert!(h.wait_finished(Duration::from_secs(1)).await);
        assert_eq!(h.state(), CompletionState::Failed);
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn custom_body_sees_cancellation_on_expiry() {
        let body = WorkFn::arc(|ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Ok::<_, WorkError>(())
        });
        let spec = WorkerSpec::custom("c", body).with_lifetime(Some(Duration::from_millis(20)));
        let (h, _, _) = spawn(spec).await;
        assert!(h.wait_finished(Duration::from_secs(1)).await);
        assert_eq!(h.state(), CompletionState::CompletedByTimeout);
        assert!(!h.is_stopping());
    }
}
