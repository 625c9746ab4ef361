use crate::{Expression, MatchError, MatcherConfig, MatcherState, MemoCache, SequenceMatcher};
use std::borrow::Borrow;
use std::sync::Arc;

/// An expression prepared for matching many sequences.
///
/// Without a cache, every match derives the expression afresh. With a [`MemoCache`],
/// the expression is interned once and derivatives are shared between all matches,
/// from any thread, that use the same cache.
///
/// ```rust
/// use residual::*;
/// use std::sync::Arc;
///
/// let a = literal(Predicate::equal_to('a'));
/// let cache = Arc::new(MemoCache::new());
/// let matcher = Matcher::with_cache(concat(star(any()), a), cache.clone());
///
/// assert!(matcher.matches("xxxxa".chars()).unwrap());
/// assert!(!matcher.matches("xxxxb".chars()).unwrap());
/// assert!(cache.stats().hits > 0);
/// ```
pub struct Matcher<T> {
    root: Expression<T>,
    predicates: Arc<[crate::Predicate<T>]>,
    cache: Option<Arc<MemoCache<T>>>,
    config: MatcherConfig,
}

impl<T> Clone for Matcher<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            predicates: self.predicates.clone(),
            cache: self.cache.clone(),
            config: self.config,
        }
    }
}

impl<T> Matcher<T> {
    /// A matcher deriving `expression` without any cache.
    pub fn new(expression: Expression<T>) -> Self {
        Self {
            root: expression,
            predicates: Arc::new([]),
            cache: None,
            config: MatcherConfig::default(),
        }
    }

    /// A matcher deriving `expression` through `cache`.
    pub fn with_cache(expression: Expression<T>, cache: Arc<MemoCache<T>>) -> Self {
        let root = cache.intern(&expression);
        let predicates = root.predicates().into();
        log::debug!("interned matcher root {root} ({} nodes)", root.size());

        Self {
            root,
            predicates,
            cache: Some(cache),
            config: MatcherConfig::default(),
        }
    }

    /// Replaces the limits of this matcher.
    pub fn with_config(mut self, config: MatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// The expression this matcher starts from. When a cache is used, this is the
    /// interned (and possibly simplified) form.
    pub fn expression(&self) -> &Expression<T> {
        &self.root
    }

    /// The cache derivatives go through, if any.
    pub fn cache(&self) -> Option<&Arc<MemoCache<T>>> {
        self.cache.as_ref()
    }

    /// The limits of this matcher.
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// A fresh state at the start of the expression.
    pub fn state(&self) -> MatcherState<T> {
        MatcherState {
            current: self.root.clone(),
            predicates: self.predicates.clone(),
            cache: self.cache.clone(),
            config: self.config,
            steps: 0,
        }
    }

    /// Returns true if the expression matches the whole `sequence`.
    ///
    /// Only fails when a configured limit is exceeded.
    pub fn matches<I>(&self, sequence: I) -> Result<bool, MatchError>
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
    {
        self.state().accepts(sequence)
    }
}
