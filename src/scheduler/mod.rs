//! Priority scheduling for the reactor.
//!
//! Tasks are kept in one FIFO queue per [`Priority`] level. Every scheduling
//! decision walks the levels in [`DrainOrder`] afresh, so a high-priority task
//! submitted while lower levels are being drained still runs next.

pub mod priority;

pub use priority::{DrainOrder, Priority, PriorityQueue};
