//! Continuation handlers and the resolution procedure.

use super::Promise;
use std::fmt;
use tracing::warn;

/// Boxed callable form of a [`Handler`].
pub type Callback<A, U, E> = Box<dyn FnOnce(A) -> Result<Resolution<U, E>, E> + Send>;

/// What a callable handler produced: a plain value, or another promise whose
/// eventual outcome the derived promise should adopt.
pub enum Resolution<T, E> {
    Value(T),
    Promise(Promise<T, E>),
}

impl<T, E> From<Promise<T, E>> for Resolution<T, E> {
    fn from(promise: Promise<T, E>) -> Self {
        Resolution::Promise(promise)
    }
}

impl<T: fmt::Debug, E> fmt::Debug for Resolution<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Resolution::Promise(promise) => f.debug_tuple("Promise").field(promise).finish(),
        }
    }
}

/// A continuation registered on a promise.
///
/// The kind is fixed at registration time: `Call` runs a callback with the
/// delivered input, `Constant` ignores the input and fulfils the derived
/// promise with a fixed value. Promise-to-promise forwarding goes through
/// [`Promise::chain`].
pub enum Handler<A, U, E> {
    Call(Callback<A, U, E>),
    Constant(U),
}

impl<A, U, E> Handler<A, U, E>
where
    A: 'static,
    U: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Infallible transformation of the input.
    pub fn map<F>(f: F) -> Self
    where
        F: FnOnce(A) -> U + Send + 'static,
    {
        Handler::Call(Box::new(move |input| Ok(Resolution::Value(f(input)))))
    }

    /// Transformation that may fail; `Err` rejects the derived promise.
    pub fn try_map<F>(f: F) -> Self
    where
        F: FnOnce(A) -> Result<U, E> + Send + 'static,
    {
        Handler::Call(Box::new(move |input| f(input).map(Resolution::Value)))
    }

    /// Full form: may hand back another promise to adopt.
    pub fn then<F>(f: F) -> Self
    where
        F: FnOnce(A) -> Result<Resolution<U, E>, E> + Send + 'static,
    {
        Handler::Call(Box::new(f))
    }

    pub fn constant(value: U) -> Self {
        Handler::Constant(value)
    }
}

impl<A, U: fmt::Debug, E> fmt::Debug for Handler<A, U, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Call(_) => f.write_str("Handler::Call(..)"),
            Handler::Constant(value) => f.debug_tuple("Handler::Constant").field(value).finish(),
        }
    }
}

/// A queued (handler, derived promise) pair with its types erased to the input.
pub(crate) trait Reaction<A, E>: Send {
    fn react(self: Box<Self>, input: A);

    /// Source rejected before this fulfilment handler could run.
    fn abandon(self: Box<Self>, reason: E);
}

pub(crate) struct Derived<A, U, E> {
    handler: Handler<A, U, E>,
    out: Promise<U, E>,
}

impl<A, U, E> Derived<A, U, E> {
    pub(crate) fn new(handler: Handler<A, U, E>, out: Promise<U, E>) -> Self {
        Self { handler, out }
    }
}

impl<A, U, E> Reaction<A, E> for Derived<A, U, E>
where
    A: 'static,
    U: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn react(self: Box<Self>, input: A) {
        let Derived { handler, out } = *self;
        resolve(&out, handler, input);
    }

    fn abandon(self: Box<Self>, reason: E) {
        self.out.settle_or_log(Err(reason));
    }
}

/// Settles `out` from `handler(input)`. Used for both immediate and deferred
/// execution so the two paths cannot diverge.
pub(crate) fn resolve<A, U, E>(out: &Promise<U, E>, handler: Handler<A, U, E>, input: A)
where
    U: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    match handler {
        Handler::Constant(value) => out.settle_or_log(Ok(value)),
        Handler::Call(callback) => match callback(input) {
            Ok(Resolution::Value(value)) => out.settle_or_log(Ok(value)),
            Ok(Resolution::Promise(next)) => {
                if let Err(err) = next.chain(out) {
                    // a promise adopting itself can never settle
                    warn!("handler result for {} not adopted: {}", out.name(), err);
                }
            }
            Err(reason) => out.settle_or_log(Err(reason)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_ignores_input() {
        let out: Promise<&'static str, String> = Promise::new();
        resolve(&out, Handler::constant("fixed"), 10);
        assert_eq!(out.wait(), Ok("fixed"));
    }

    #[test]
    fn test_try_map_error_rejects() {
        let out: Promise<i32, String> = Promise::new();
        resolve(
            &out,
            Handler::try_map(|_: i32| Err("boom".to_string())),
            1,
        );
        assert_eq!(out.wait(), Err("boom".to_string()));
    }

    #[test]
    fn test_returned_promise_is_adopted() {
        let out: Promise<i32, String> = Promise::new();
        let inner: Promise<i32, String> = Promise::new();
        let returned = inner.clone();

        resolve(
            &out,
            Handler::then(move |_: ()| Ok(Resolution::Promise(returned))),
            (),
        );
        assert!(!out.is_settled());

        inner.fulfill(9).unwrap();
        assert_eq!(out.wait(), Ok(9));
    }

    #[test]
    fn test_adopting_itself_stays_pending() {
        let out: Promise<i32, String> = Promise::new();
        let same = out.clone();
        resolve(
            &out,
            Handler::then(move |_: ()| Ok(Resolution::Promise(same))),
            (),
        );
        assert!(!out.is_settled());
    }

    #[test]
    fn test_handler_debug() {
        let call: Handler<i32, i32, String> = Handler::map(|x| x);
        assert_eq!(format!("{:?}", call), "Handler::Call(..)");
        let constant: Handler<i32, i32, String> = Handler::constant(3);
        assert_eq!(format!("{:?}", constant), "Handler::Constant(3)");
    }
}
