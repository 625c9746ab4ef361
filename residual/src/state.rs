//! Contains the [`MatcherState`], a matcher that consumes input one element at a time.
//! It is useful when the input is a stream, or when matching should stop as soon as
//! the outcome is decided.

use crate::{Class, Expression, MatchError, Matcher, MatcherConfig, MemoCache, Predicate};
use std::borrow::Borrow;
use std::sync::Arc;

/// Something that consumes input elements and can tell whether what it consumed so far
/// is accepted.
pub trait SequenceMatcher {
    /// The type of the elements consumed.
    type Alphabet;

    /// Consumes the specified element.
    ///
    /// If no continuation can match any more, the matcher becomes [failed](SequenceMatcher::is_failed).
    fn step(&mut self, inp: &Self::Alphabet) -> Result<(), MatchError>;

    /// Consumes every element of `inp`, in order.
    fn step_many<I>(&mut self, inp: I) -> Result<(), MatchError>
    where
        I: IntoIterator,
        I::Item: Borrow<Self::Alphabet>,
    {
        for i in inp {
            self.step(i.borrow())?;
        }
        Ok(())
    }

    /// Returns true if the input consumed so far, followed by `iter`, is accepted.
    ///
    /// Stops consuming as soon as the matcher has failed.
    fn accepts<I>(&mut self, iter: I) -> Result<bool, MatchError>
    where
        I: IntoIterator,
        I::Item: Borrow<Self::Alphabet>,
    {
        for i in iter {
            if self.is_failed() {
                return Ok(false);
            }
            self.step(i.borrow())?;
        }

        Ok(self.is_accepting())
    }

    /// Whether the input consumed so far is accepted.
    fn is_accepting(&self) -> bool;

    /// Whether no continuation of the input consumed so far can be accepted.
    ///
    /// Only detected when the residual is exactly [`Kind::Fail`](crate::Kind::Fail),
    /// so a false result does not guarantee that some continuation matches.
    fn is_failed(&self) -> bool;
}

/// The state of a match in progress: the residual expression after the input consumed so far.
pub struct MatcherState<T> {
    pub(crate) current: Expression<T>,
    pub(crate) predicates: Arc<[Predicate<T>]>,
    pub(crate) cache: Option<Arc<MemoCache<T>>>,
    pub(crate) config: MatcherConfig,
    pub(crate) steps: usize,
}

impl<T> Clone for MatcherState<T> {
    fn clone(&self) -> Self {
        Self {
            current: self.current.clone(),
            predicates: self.predicates.clone(),
            cache: self.cache.clone(),
            config: self.config,
            steps: self.steps,
        }
    }
}

impl<T> MatcherState<T> {
    /// A state at the start of `expression`, deriving through a fresh [`MemoCache`]
    /// owned by this state and its successors. No limits apply.
    pub fn new(expression: Expression<T>) -> Self {
        Matcher::with_cache(expression, Arc::new(MemoCache::new())).state()
    }

    /// The state after consuming `value`.
    ///
    /// Fails with [`MatchError::Overflow`] when the new residual is larger than
    /// [`MatcherConfig::max_state_size`] allows.
    pub fn advance(&self, value: &T) -> Result<Self, MatchError> {
        let next = match &self.cache {
            Some(cache) => cache.derive(&self.current, &Class::of(&self.predicates, value)),
            None => self.current.derive(value),
        };

        if let Some(limit) = self.config.max_state_size {
            if next.size() > limit {
                log::warn!(
                    "residual grew to {} nodes after {} elements (limit {limit})",
                    next.size(),
                    self.steps + 1
                );
                return Err(MatchError::Overflow {
                    size: next.size(),
                    limit,
                });
            }
        }

        log::trace!("step {}: {next}", self.steps + 1);

        Ok(Self {
            current: next,
            predicates: self.predicates.clone(),
            cache: self.cache.clone(),
            config: self.config,
            steps: self.steps + 1,
        })
    }

    /// Whether the input consumed so far is accepted.
    pub fn is_accepting(&self) -> bool {
        self.current.is_nullable()
    }

    /// Whether the residual is [`Kind::Fail`](crate::Kind::Fail), so nothing can match any more.
    pub fn is_failed(&self) -> bool {
        self.current.is_fail()
    }

    /// The residual expression.
    pub fn expression(&self) -> &Expression<T> {
        &self.current
    }

    /// Number of elements consumed.
    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl<T> SequenceMatcher for MatcherState<T> {
    type Alphabet = T;

    fn step(&mut self, inp: &T) -> Result<(), MatchError> {
        *self = self.advance(inp)?;
        Ok(())
    }

    fn is_accepting(&self) -> bool {
        MatcherState::is_accepting(self)
    }

    fn is_failed(&self) -> bool {
        MatcherState::is_failed(self)
    }
}
