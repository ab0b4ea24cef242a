//! Settlement state kept behind a promise's lock.

use super::handler::Reaction;
use super::Promise;
use std::collections::VecDeque;

/// Observable state of a promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Pending,
    Fulfilled,
    Rejected,
}

/// `Settling` holds the outcome while registries are still being drained;
/// registrations arriving in that window are queued and drained too.
pub(crate) enum Phase<T, E> {
    Pending,
    Settling(Result<T, E>),
    Settled(Result<T, E>),
}

impl<T, E> Phase<T, E> {
    pub(crate) fn state(&self) -> State {
        match self {
            Phase::Settled(Ok(_)) => State::Fulfilled,
            Phase::Settled(Err(_)) => State::Rejected,
            Phase::Pending | Phase::Settling(_) => State::Pending,
        }
    }

    pub(crate) fn settled(&self) -> Option<&Result<T, E>> {
        match self {
            Phase::Settled(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// `Some(true)` once the outcome is known to be a fulfilment, even mid-settlement.
    pub(crate) fn leaning(&self) -> Option<bool> {
        match self {
            Phase::Pending => None,
            Phase::Settling(outcome) | Phase::Settled(outcome) => Some(outcome.is_ok()),
        }
    }
}

pub(crate) type FulfilledReaction<T, E> = Box<dyn Reaction<T, E>>;
pub(crate) type RejectedReaction<E> = Box<dyn Reaction<E, E>>;
pub(crate) type SettledReaction<T, E> = Box<dyn Reaction<Result<T, E>, E>>;

pub(crate) struct Inner<T, E> {
    pub(crate) phase: Phase<T, E>,
    pub(crate) on_fulfilled: VecDeque<FulfilledReaction<T, E>>,
    pub(crate) on_rejected: VecDeque<RejectedReaction<E>>,
    pub(crate) on_settled: VecDeque<SettledReaction<T, E>>,
    pub(crate) chained: VecDeque<Promise<T, E>>,
}

impl<T, E> Inner<T, E> {
    pub(crate) fn new(phase: Phase<T, E>) -> Self {
        Self {
            phase,
            on_fulfilled: VecDeque::new(),
            on_rejected: VecDeque::new(),
            on_settled: VecDeque::new(),
            chained: VecDeque::new(),
        }
    }

    /// Pops the next piece of settlement work. Entries are removed one at a
    /// time so that anything registered while a step runs is still seen.
    pub(crate) fn next_step(&mut self, fulfilled: bool) -> Option<Step<T, E>> {
        if fulfilled {
            if let Some(reaction) = self.on_fulfilled.pop_front() {
                return Some(Step::Fulfilled(reaction));
            }
            if let Some(reaction) = self.on_settled.pop_front() {
                return Some(Step::Settled(reaction));
            }
            self.chained.pop_front().map(Step::Chained)
        } else {
            if let Some(reaction) = self.on_rejected.pop_front() {
                return Some(Step::Rejected(reaction));
            }
            if let Some(reaction) = self.on_settled.pop_front() {
                return Some(Step::Settled(reaction));
            }
            if let Some(target) = self.chained.pop_front() {
                return Some(Step::Chained(target));
            }
            self.on_fulfilled.pop_front().map(Step::Abandon)
        }
    }

    /// Moves `Settling` to `Settled` and hands back reactions that can never
    /// run, so the caller drops them outside the lock.
    pub(crate) fn finish(&mut self) -> VecDeque<RejectedReaction<E>> {
        let phase = std::mem::replace(&mut self.phase, Phase::Pending);
        self.phase = match phase {
            Phase::Settling(outcome) => Phase::Settled(outcome),
            other => other,
        };
        std::mem::take(&mut self.on_rejected)
    }
}

pub(crate) enum Step<T, E> {
    Fulfilled(FulfilledReaction<T, E>),
    Rejected(RejectedReaction<E>),
    Settled(SettledReaction<T, E>),
    Chained(Promise<T, E>),
    Abandon(FulfilledReaction<T, E>),
}

impl<T, E> Step<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub(crate) fn run(self, outcome: &Result<T, E>) {
        match (self, outcome) {
            (Step::Fulfilled(reaction), Ok(value)) => reaction.react(value.clone()),
            (Step::Rejected(reaction), Err(reason)) => reaction.react(reason.clone()),
            (Step::Settled(reaction), outcome) => reaction.react(outcome.clone()),
            (Step::Chained(target), outcome) => target.settle_or_log(outcome.clone()),
            (Step::Abandon(reaction), Err(reason)) => reaction.abandon(reason.clone()),
            (Step::Fulfilled(_), Err(_))
            | (Step::Rejected(_), Ok(_))
            | (Step::Abandon(_), Ok(_)) => {
                unreachable!("next_step only yields steps matching the outcome")
            }
        }
    }
}
