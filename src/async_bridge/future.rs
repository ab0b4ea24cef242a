use crate::promise::{Handler, Promise};
use futures::task::AtomicWaker;
use parking_lot::Mutex;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

struct Slot<T, E> {
    outcome: Mutex<Option<Result<T, E>>>,
    waker: AtomicWaker,
}

/// Future resolving to a promise's outcome.
pub struct PromiseFuture<T, E> {
    promise: Promise<T, E>,
    slot: Arc<Slot<T, E>>,
    registered: bool,
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub fn to_future(&self) -> PromiseFuture<T, E> {
        PromiseFuture {
            promise: self.clone(),
            slot: Arc::new(Slot {
                outcome: Mutex::new(None),
                waker: AtomicWaker::new(),
            }),
            registered: false,
        }
    }
}

impl<T, E> IntoFuture for Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Output = Result<T, E>;
    type IntoFuture = PromiseFuture<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.to_future()
    }
}

impl<T, E> Future for PromiseFuture<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.slot.waker.register(cx.waker());

        if !this.registered {
            this.registered = true;
            let slot = Arc::clone(&this.slot);
            // Runs inline if the promise is already settled.
            this.promise.on_settled(Handler::map(move |outcome: Result<T, E>| {
                *slot.outcome.lock() = Some(outcome);
                slot.waker.wake();
            }));
        }

        match this.slot.outcome.lock().take() {
            Some(outcome) => Poll::Ready(outcome),
            None => Poll::Pending,
        }
    }
}

impl<T, E> fmt::Debug for PromiseFuture<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseFuture")
            .field("promise", &self.promise)
            .field("registered", &self.registered)
            .finish()
    }
}
