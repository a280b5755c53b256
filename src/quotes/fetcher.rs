//! Serialized, rate limited access to the upstream price provider.
//!
//! Every request goes through a FIFO queue drained by a single worker task.
//! The worker performs one upstream call, settles the caller, then sleeps for
//! the configured delay before taking the next request, so no two calls are
//! ever in flight and consecutive calls are at least `request_delay` apart.
//! The worker exits when it finds the queue empty and is restarted by the
//! next enqueue.
//!
//! Requests cannot be cancelled. Dropping the future returned by
//! [`RateLimitedFetcher::enqueue`] only discards the result; the upstream call
//! still happens and a successful price is still cached.

use crate::core::price::{PriceError, PriceProvider, validate_price};
use crate::core::ticker::Ticker;
use crate::quotes::cache::PriceCache;
use chrono::Utc;
use futures::FutureExt;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct FetcherOptions {
    /// Minimum spacing between two upstream calls.
    pub request_delay: Duration,
    /// Upper bound for a single upstream call.
    pub timeout: Duration,
    /// Maximum number of waiting requests; `None` is unbounded.
    pub max_queue_depth: Option<usize>,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(5100),
            timeout: Duration::from_secs(30),
            max_queue_depth: None,
        }
    }
}

struct PendingRequest {
    ticker: Ticker,
    respond_to: oneshot::Sender<Result<f64, PriceError>>,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<PendingRequest>,
    // Guarded together with `pending` so a worker can't exit while an enqueue
    // believes it is still running.
    running: bool,
}

struct Shared {
    provider: Arc<dyn PriceProvider>,
    cache: Arc<PriceCache>,
    options: FetcherOptions,
    state: Mutex<QueueState>,
    worker_runs: AtomicUsize,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Price queue mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    async fn fetch(&self, ticker: &Ticker) -> Result<f64, PriceError> {
        let call = AssertUnwindSafe(self.provider.fetch_price(ticker)).catch_unwind();
        let price = match tokio::time::timeout(self.options.timeout, call).await {
            Ok(Ok(result)) => result?,
            Ok(Err(_)) => {
                warn!("Price provider panicked while fetching {}", ticker);
                return Err(PriceError::WorkerGone(ticker.to_string()));
            }
            Err(_) => {
                return Err(PriceError::Timeout {
                    ticker: ticker.to_string(),
                    timeout: self.options.timeout,
                });
            }
        };
        let price = validate_price(ticker, price)?;
        self.cache.put(ticker, price, Utc::now());
        Ok(price)
    }
}

/// Owns the request queue and its worker. Cloning shares the same queue.
#[derive(Clone)]
pub struct RateLimitedFetcher {
    shared: Arc<Shared>,
}

impl RateLimitedFetcher {
    pub fn new(
        provider: Arc<dyn PriceProvider>,
        cache: Arc<PriceCache>,
        options: FetcherOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                provider,
                cache,
                options,
                state: Mutex::new(QueueState::default()),
                worker_runs: AtomicUsize::new(0),
            }),
        }
    }

    /// Queues an upstream lookup for `ticker`.
    ///
    /// The request joins the queue when this is called, not when the returned
    /// future is first polled, so call order is service order. Must be called
    /// from within a tokio runtime.
    pub fn enqueue(
        &self,
        ticker: Ticker,
    ) -> impl Future<Output = Result<f64, PriceError>> + Send + 'static {
        let label = ticker.to_string();
        let queued = self.push(ticker);
        async move {
            match queued {
                Ok(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(PriceError::WorkerGone(label))),
                Err(e) => Err(e),
            }
        }
    }

    /// Number of requests waiting for the worker (excluding the one in flight).
    pub fn pending_len(&self) -> usize {
        self.shared.lock_state().pending.len()
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock_state().running
    }

    /// How many times a drain loop has been started.
    pub fn worker_runs(&self) -> usize {
        self.shared.worker_runs.load(Ordering::SeqCst)
    }

    fn push(
        &self,
        ticker: Ticker,
    ) -> Result<oneshot::Receiver<Result<f64, PriceError>>, PriceError> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.shared.lock_state();

        if let Some(max) = self.shared.options.max_queue_depth {
            if state.pending.len() >= max {
                warn!("Price queue full, rejecting {}", ticker);
                return Err(PriceError::QueueFull(state.pending.len()));
            }
        }

        let start_worker = !state.running;
        let handle = if start_worker {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => Some(handle),
                Err(_) => return Err(PriceError::WorkerGone(ticker.to_string())),
            }
        } else {
            None
        };

        debug!(
            "Queued price request for {} ({} ahead)",
            ticker,
            state.pending.len()
        );
        state.pending.push_back(PendingRequest {
            ticker,
            respond_to: tx,
        });

        if let Some(handle) = handle {
            state.running = true;
            self.shared.worker_runs.fetch_add(1, Ordering::SeqCst);
            handle.spawn(drain(Arc::clone(&self.shared)));
        }
        Ok(rx)
    }
}

async fn drain(shared: Arc<Shared>) {
    debug!("Price worker started");
    loop {
        let request = {
            let mut state = shared.lock_state();
            match state.pending.pop_front() {
                Some(request) => request,
                None => {
                    state.running = false;
                    break;
                }
            }
        };

        debug!("Fetching price for {}", request.ticker);
        let result = shared.fetch(&request.ticker).await;
        if let Err(e) = &result {
            debug!("Price request for {} failed: {}", request.ticker, e);
        }
        if request.respond_to.send(result).is_err() {
            debug!("Caller for {} went away, result discarded", request.ticker);
        }

        tokio::time::sleep(shared.options.request_delay).await;
    }
    debug!("Price worker idle");
}
