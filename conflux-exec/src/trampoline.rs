// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A per-thread immediate-execution run loop that bounds stack depth by
//! batching nested submissions instead of recursing.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use conflux_runtime::Executor;

type Runnable = Box<dyn FnOnce() + Send>;

thread_local! {
    static STACK: RefCell<Option<VecDeque<Runnable>>> = const { RefCell::new(None) };
}

/// Run `runnable` through the current thread's trampoline.
///
/// If this thread is not already draining a trampoline loop, `runnable`
/// runs synchronously and the loop then drains anything `runnable` (or a
/// runnable it enqueues) submits in turn, FIFO, until the stack is empty —
/// all on this call stack frame, never recursing. If this thread *is*
/// already inside a loop (this call is nested), `runnable` is pushed onto
/// that loop's stack and returns immediately; the active loop will reach it.
///
/// If a runnable panics while draining, the remainder of the stack is
/// handed to `executor` as a fresh trampoline loop on whatever thread picks
/// it up, and the panic is reported rather than propagated — mirroring a
/// non-fatal-exception fork. `executor` is only ever touched on that fork
/// path; the common case never allocates a future.
pub fn execute<E>(executor: &E, runnable: Runnable)
where
    E: Executor + Clone + 'static,
{
    let already_running = STACK.with(|stack| stack.borrow().is_some());
    if already_running {
        STACK.with(|stack| {
            stack
                .borrow_mut()
                .as_mut()
                .expect("checked above")
                .push_back(runnable);
        });
        return;
    }

    STACK.with(|stack| *stack.borrow_mut() = Some(VecDeque::new()));
    run_loop(executor, runnable);
}

fn run_loop<E>(executor: &E, first: Runnable)
where
    E: Executor + Clone + 'static,
{
    if run_one(first).is_err() {
        fork_remainder(executor);
        return;
    }

    loop {
        let next = STACK.with(|stack| stack.borrow_mut().as_mut().and_then(VecDeque::pop_front));
        match next {
            Some(runnable) => {
                if run_one(runnable).is_err() {
                    fork_remainder(executor);
                    return;
                }
            }
            None => break,
        }
    }

    STACK.with(|stack| *stack.borrow_mut() = None);
}

fn run_one(runnable: Runnable) -> Result<(), ()> {
    panic::catch_unwind(AssertUnwindSafe(runnable)).map_err(|payload| {
        let message: &str = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        crate::warn!(
            "trampoline runnable panicked, forking remainder: {}",
            message
        );
    })
}

fn fork_remainder<E>(executor: &E)
where
    E: Executor + Clone + 'static,
{
    let remainder = STACK.with(|stack| stack.borrow_mut().take());
    let Some(mut remainder) = remainder else {
        return;
    };
    if remainder.is_empty() {
        return;
    }

    let executor_clone = executor.clone();
    let submit_result = executor_clone.submit(Box::pin(async move {
        STACK.with(|stack| *stack.borrow_mut() = Some(VecDeque::new()));
        if let Some(first) = remainder.pop_front() {
            STACK.with(|stack| *stack.borrow_mut().as_mut().expect("set above") = remainder);
            run_loop(&executor_clone, first);
        }
    }));

    if let Err(error) = submit_result {
        crate::warn!("failed to fork trampoline remainder to executor: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_runtime::TokioExecutor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn nested_submissions_run_fifo_without_recursing() {
        let executor = TokioExecutor::current();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        fn submit_chain(
            executor: TokioExecutor,
            order: Arc<parking_lot::Mutex<Vec<usize>>>,
            depth: usize,
            max_depth: usize,
        ) {
            let call_site_executor = executor;
            execute(
                &call_site_executor,
                Box::new(move || {
                    order.lock().push(depth);
                    if depth < max_depth {
                        submit_chain(executor, order.clone(), depth + 1, max_depth);
                    }
                }),
            );
        }

        submit_chain(executor, order.clone(), 0, 10_000);
        let recorded = order.lock();
        assert_eq!(recorded.len(), 10_001);
        assert_eq!(*recorded, (0..=10_000).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn panicking_runnable_forks_the_remainder_to_the_executor() {
        let executor = TokioExecutor::current();
        let outer_executor = executor;
        let inner_executor = executor;
        let ran_after_panic = Arc::new(AtomicUsize::new(0));
        let ran_after_panic_clone = ran_after_panic.clone();

        execute(
            &outer_executor,
            Box::new(move || {
                execute(
                    &inner_executor,
                    Box::new(move || {
                        ran_after_panic_clone.fetch_add(1, Ordering::SeqCst);
                    }),
                );
                panic!("trampoline runnable failing intentionally");
            }),
        );

        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(ran_after_panic.load(Ordering::SeqCst), 1);
    }
}
