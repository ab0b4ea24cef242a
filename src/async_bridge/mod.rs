//! Awaiting promises from async code.
//!
//! [`Promise::to_future`] registers an on-settled handler that stores the
//! outcome and wakes the polling task, so awaiting never blocks a thread.
//!
//! ```
//! use iou::promise::Promise;
//!
//! let p: Promise<u8, String> = Promise::new();
//! let fut = p.to_future();
//! p.fulfill(7).unwrap();
//! assert_eq!(futures::executor::block_on(fut), Ok(7));
//! ```

mod future;

pub use future::PromiseFuture;
