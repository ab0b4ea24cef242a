//! Settle-once promises with chained resolution.
//!
//! A [`Promise`] starts pending and settles exactly once, either fulfilled
//! with a value or rejected with a reason. Handlers can be attached before or
//! after settlement; each one yields a derived promise that settles with the
//! handler's result. Handlers attached to an already settled promise run
//! immediately on the calling thread, otherwise they run synchronously on
//! whichever thread settles the promise, in registration order.
//!
//! ```
//! use iou::promise::{Handler, Promise};
//!
//! let p: Promise<i32, String> = Promise::new();
//! let doubled = p.on_fulfilled(Handler::map(|v| v * 2));
//!
//! p.fulfill(21).unwrap();
//! assert_eq!(doubled.wait(), Ok(42));
//! ```

mod handler;
mod state;

pub use handler::{Callback, Handler, Resolution};
pub use state::State;

use crate::error::Error;
use handler::{Derived, Reaction};
use parking_lot::{Condvar, Mutex, MutexGuard};
use state::{Inner, Phase};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

static PROMISE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique promise identifier, used for default names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PromiseId(u64);

impl PromiseId {
    fn next() -> Self {
        PromiseId(PROMISE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PromiseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Shared<T, E> {
    id: PromiseId,
    name: String,
    inner: Mutex<Inner<T, E>>,
    settled: Condvar,
}

/// A settle-once container for a value of type `T` or a rejection reason of
/// type `E`. Cloning yields another handle to the same promise.
pub struct Promise<T, E = Error> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Pending promise with a generated name (`#1`, `#2`, ...).
    pub fn new() -> Self {
        Self::with_phase(None, Phase::Pending)
    }

    pub fn named<S: Into<String>>(name: S) -> Self {
        Self::with_phase(Some(name.into()), Phase::Pending)
    }

    /// Promise that is already fulfilled with `value`.
    pub fn fulfilled(value: T) -> Self {
        Self::with_phase(None, Phase::Settled(Ok(value)))
    }

    /// Promise that is already rejected with `reason`.
    pub fn rejected(reason: E) -> Self {
        Self::with_phase(None, Phase::Settled(Err(reason)))
    }

    fn with_phase(name: Option<String>, phase: Phase<T, E>) -> Self {
        let id = PromiseId::next();
        let name = name.unwrap_or_else(|| id.to_string());
        trace!("created promise {}", name);

        Self {
            shared: Arc::new(Shared {
                id,
                name,
                inner: Mutex::new(Inner::new(phase)),
                settled: Condvar::new(),
            }),
        }
    }

    /// Fulfils the promise, running fulfilment and settled handlers, then
    /// chained promises.
    ///
    /// Fails with [`Error::AlreadySettled`] if the promise was settled before.
    ///
    /// # Panics
    ///
    /// Re-raises the first panic of a handler, once every other handler has
    /// run and the promise is settled.
    pub fn fulfill(&self, value: T) -> Result<(), Error> {
        self.settle(Ok(value))
    }

    /// Rejects the promise, running rejection and settled handlers, then
    /// chained promises, then rejecting the derived promises of handlers that
    /// only listened for fulfilment.
    ///
    /// Fails with [`Error::AlreadySettled`] if the promise was settled before.
    pub fn reject(&self, reason: E) -> Result<(), Error> {
        self.settle(Err(reason))
    }

    pub(crate) fn settle(&self, outcome: Result<T, E>) -> Result<(), Error> {
        let fulfilled = outcome.is_ok();
        {
            let mut inner = self.lock();
            if !matches!(inner.phase, Phase::Pending) {
                return Err(Error::AlreadySettled(self.shared.name.clone()));
            }
            inner.phase = Phase::Settling(outcome.clone());
        }
        trace!(
            "settling {} as {}",
            self.shared.name,
            if fulfilled { "fulfilled" } else { "rejected" }
        );

        // Panics are caught per step; the first is re-raised once settled.
        let mut first_panic = None;
        let orphaned = loop {
            let step = {
                let mut inner = self.lock();
                match inner.next_step(fulfilled) {
                    Some(step) => step,
                    None => break inner.finish(),
                }
            };
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| step.run(&outcome))) {
                error!("a handler of {} panicked during settlement", self.shared.name);
                first_panic.get_or_insert(payload);
            }
        };
        drop(orphaned);

        self.shared.settled.notify_all();
        debug!("{} settled", self.shared.name);

        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
        Ok(())
    }

    /// Settlement of promises the caller doesn't own; failures are logged.
    pub(crate) fn settle_or_log(&self, outcome: Result<T, E>) {
        if let Err(err) = self.settle(outcome) {
            warn!("dropping outcome for {}: {}", self.shared.name, err);
        }
    }

    /// Registers a handler for fulfilment and returns its derived promise.
    ///
    /// If this promise is rejected the derived promise is rejected with the
    /// same reason and the handler never runs.
    pub fn on_fulfilled<U>(&self, handler: Handler<T, U, E>) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
    {
        let out = Promise::new();
        let reaction: Box<dyn Reaction<T, E>> = Box::new(Derived::new(handler, out.clone()));

        let settled = {
            let mut inner = self.lock();
            match inner.phase.settled().cloned() {
                Some(outcome) => outcome,
                None => {
                    inner.on_fulfilled.push_back(reaction);
                    return out;
                }
            }
        };

        match settled {
            Ok(value) => reaction.react(value),
            Err(reason) => reaction.abandon(reason),
        }
        out
    }

    /// Registers a handler for rejection and returns its derived promise.
    ///
    /// If this promise is fulfilled the handler never runs and the derived
    /// promise stays pending.
    pub fn on_rejected<U>(&self, handler: Handler<E, U, E>) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
    {
        let out = Promise::new();
        let reaction: Box<dyn Reaction<E, E>> = Box::new(Derived::new(handler, out.clone()));

        let settled = {
            let mut inner = self.lock();
            match (inner.phase.settled().cloned(), inner.phase.leaning()) {
                (Some(outcome), _) => outcome,
                (None, Some(true)) => return out,
                (None, _) => {
                    inner.on_rejected.push_back(reaction);
                    return out;
                }
            }
        };

        if let Err(reason) = settled {
            reaction.react(reason);
        }
        out
    }

    /// Registers a handler receiving either outcome and returns its derived
    /// promise.
    pub fn on_settled<U>(&self, handler: Handler<Result<T, E>, U, E>) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
    {
        let out = Promise::new();
        let reaction: Box<dyn Reaction<Result<T, E>, E>> =
            Box::new(Derived::new(handler, out.clone()));

        let settled = {
            let mut inner = self.lock();
            match inner.phase.settled().cloned() {
                Some(outcome) => outcome,
                None => {
                    inner.on_settled.push_back(reaction);
                    return out;
                }
            }
        };

        reaction.react(settled);
        out
    }

    /// Registers a fulfilment and a rejection handler in one call.
    pub fn add_handlers<U, V>(
        &self,
        on_fulfilled: Handler<T, U, E>,
        on_rejected: Handler<E, V, E>,
    ) -> (Promise<U, E>, Promise<V, E>)
    where
        U: Clone + Send + 'static,
        V: Clone + Send + 'static,
    {
        let fulfilled = self.on_fulfilled(on_fulfilled);
        let rejected = self.on_rejected(on_rejected);
        (fulfilled, rejected)
    }

    /// Makes `target` settle exactly as this promise does.
    ///
    /// Runs immediately when this promise is already settled. Chaining a
    /// promise to itself fails with [`Error::SelfReference`].
    pub fn chain(&self, target: &Promise<T, E>) -> Result<(), Error> {
        if self.ptr_eq(target) {
            return Err(Error::SelfReference(self.shared.name.clone()));
        }

        let settled = {
            let mut inner = self.lock();
            match inner.phase.settled().cloned() {
                Some(outcome) => outcome,
                None => {
                    trace!("chaining {} to {}", target.name(), self.shared.name);
                    inner.chained.push_back(target.clone());
                    return Ok(());
                }
            }
        };

        target.settle_or_log(settled);
        Ok(())
    }

    /// Blocks until settled and returns the outcome.
    ///
    /// Must not be called from a handler of this same promise: those run
    /// before the promise counts as settled.
    pub fn wait(&self) -> Result<T, E> {
        let mut inner = self.lock();
        loop {
            if let Some(outcome) = inner.phase.settled() {
                return outcome.clone();
            }
            self.shared.settled.wait(&mut inner);
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, E>> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.lock();
        loop {
            if let Some(outcome) = inner.phase.settled() {
                return Some(outcome.clone());
            }
            if self
                .shared
                .settled
                .wait_until(&mut inner, deadline)
                .timed_out()
            {
                return inner.phase.settled().cloned();
            }
        }
    }
}

impl<T, E> Promise<T, E> {
    fn lock(&self) -> MutexGuard<'_, Inner<T, E>> {
        self.shared.inner.lock()
    }

    pub fn id(&self) -> PromiseId {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn state(&self) -> State {
        self.lock().phase.state()
    }

    pub fn is_settled(&self) -> bool {
        self.state() != State::Pending
    }

    /// `None` while pending, otherwise whether the promise was fulfilled.
    pub fn is_fulfilled(&self) -> Option<bool> {
        match self.state() {
            State::Pending => None,
            State::Fulfilled => Some(true),
            State::Rejected => Some(false),
        }
    }

    /// True when both handles refer to the same promise.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<T, E> Default for Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .finish()
    }
}
