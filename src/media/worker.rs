// SPDX-License-Identifier: MPL-2.0
//! Background execution of resolution-scaled pixel jobs.
//!
//! Jobs run on tokio's blocking pool. Every submitted job produces exactly one
//! delivery: its own result, or [`Error::BackgroundTask`] when the job panicked
//! or the runtime dropped it before it ran. Results never touch caller state
//! directly; the interactive thread applies them when it picks them up.

use crate::error::{Error, Result};
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

/// Handle to the runtime that executes pixel jobs.
#[derive(Debug, Clone)]
pub struct PixelWorker {
    handle: Handle,
}

impl PixelWorker {
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Binds to the runtime the caller is running on.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|err| Error::BackgroundTask(err.to_string()))
    }

    /// Starts `job` and returns a handle for polling its result.
    pub fn submit<T, F>(&self, job: F) -> PendingResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.handle.spawn_blocking(move || {
            // A panic drops `tx`; the receiver reports it as a failure.
            let _ = tx.send(job());
        });
        PendingResult {
            rx,
            delivered: false,
        }
    }

    /// Runs `job` in the background and waits for its result.
    pub async fn run<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        self.submit(job).wait().await
    }

    /// Runs `job` and hands its result to `callback` on the worker thread.
    pub fn submit_with_callback<T, F, C>(&self, job: F, callback: C)
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
        C: FnOnce(Result<T>) + Send + 'static,
    {
        let completion = Completion::new(callback);
        self.handle.spawn_blocking(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(job))
                .unwrap_or_else(|_| Err(Error::BackgroundTask("job panicked".to_string())));
            completion.deliver(result);
        });
    }
}

/// Result of a submitted job, polled from the interactive thread.
#[derive(Debug)]
pub struct PendingResult<T> {
    rx: oneshot::Receiver<Result<T>>,
    delivered: bool,
}

impl<T> PendingResult<T> {
    /// Returns the result once available. Yields `Some` at most once.
    pub fn try_take(&mut self) -> Option<Result<T>> {
        if self.delivered {
            return None;
        }
        let result = match self.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(lost_job()),
        };
        self.delivered = true;
        Some(result)
    }

    /// Whether [`PendingResult::try_take`] already returned the result.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.delivered
    }

    /// Waits for the result.
    pub async fn wait(self) -> Result<T> {
        if self.delivered {
            return Err(Error::BackgroundTask("result already taken".to_string()));
        }
        self.rx.await.unwrap_or_else(|_| Err(lost_job()))
    }
}

fn lost_job() -> Error {
    log::warn!("background job ended without producing a result");
    Error::BackgroundTask("job panicked or was cancelled".to_string())
}

/// Calls the callback exactly once, with an error if dropped undelivered.
struct Completion<T, C: FnOnce(Result<T>)> {
    callback: Option<C>,
    _result: PhantomData<fn(T)>,
}

impl<T, C: FnOnce(Result<T>)> Completion<T, C> {
    fn new(callback: C) -> Self {
        Self {
            callback: Some(callback),
            _result: PhantomData,
        }
    }

    fn deliver(mut self, result: Result<T>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl<T, C: FnOnce(Result<T>)> Drop for Completion<T, C> {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback(Err(lost_job()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn run_returns_job_result() {
        let worker = PixelWorker::current().expect("runtime");
        let value = worker.run(|| Ok(21 * 2)).await.expect("job");
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn job_errors_are_passed_through() {
        let worker = PixelWorker::current().expect("runtime");
        let result: Result<()> = worker.run(|| Err(Error::EmptyIntersection)).await;
        assert!(matches!(result, Err(Error::EmptyIntersection)));
    }

    #[tokio::test]
    async fn panicking_job_reports_background_failure() {
        let worker = PixelWorker::current().expect("runtime");
        let result = worker.run(|| -> Result<u8> { panic!("boom") }).await;
        assert!(matches!(result, Err(Error::BackgroundTask(_))));
    }

    #[tokio::test]
    async fn try_take_yields_once() {
        let worker = PixelWorker::current().expect("runtime");
        let mut pending = worker.submit(|| Ok("done"));
        let mut taken = None;
        for _ in 0..200 {
            if let Some(result) = pending.try_take() {
                taken = Some(result);
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(taken.expect("delivered").expect("ok"), "done");
        assert!(pending.is_delivered());
        assert!(pending.try_take().is_none());
    }

    #[tokio::test]
    async fn callback_fires_exactly_once() {
        let worker = PixelWorker::current().expect("runtime");
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel();
        let counter = Arc::clone(&calls);
        worker.submit_with_callback(
            || Ok(7u32),
            move |result| {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = tx.send(result);
            },
        );
        let result = rx.await.expect("callback");
        assert_eq!(result.expect("ok"), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn callback_receives_panic_as_failure() {
        let worker = PixelWorker::current().expect("runtime");
        let (tx, rx) = oneshot::channel();
        worker.submit_with_callback(
            || -> Result<u32> { panic!("boom") },
            move |result| {
                let _ = tx.send(result);
            },
        );
        assert!(matches!(rx.await.expect("callback"), Err(Error::BackgroundTask(_))));
    }

    #[test]
    fn dropped_completion_reports_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let completion = Completion::new(move |result: Result<u8>| {
            assert!(result.is_err());
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(completion);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
