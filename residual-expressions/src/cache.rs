//! Hash-consing and derivative memoization.
//!
//! A [`MemoCache`] owns two tables:
//! * an intern table mapping every expression shape to one canonical node, so that
//!   equal sub-expressions are physically shared and compare in constant time;
//! * a derivative table mapping `(canonical expression, element class)` to the
//!   derivative computed earlier.
//!
//! Both tables are safe to share between threads. Expressions never change, so
//! entries never go stale; when two threads compute the same entry concurrently
//! the last insert wins, which is harmless since both computed the same value.

use crate::expression::{Derivation, Expression, Kind};
use crate::predicate::{Class, Predicate};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Settings of a [`MemoCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of canonical nodes kept. When reached, the intern table is flushed.
    pub intern_capacity: Option<usize>,
    /// Maximum number of memoized derivatives kept. When reached, the table is flushed.
    pub derivative_capacity: Option<usize>,
    /// Apply identity rewrites (such as `0 r => 0` and `r | r => r`) when building nodes.
    pub simplify: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            intern_capacity: None,
            derivative_capacity: None,
            simplify: true,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_intern_capacity(mut self, capacity: usize) -> Self {
        self.intern_capacity = Some(capacity);
        self
    }

    pub fn with_derivative_capacity(mut self, capacity: usize) -> Self {
        self.derivative_capacity = Some(capacity);
        self
    }

    pub fn with_simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }
}

/// Counters describing the work a [`MemoCache`] saved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub interned: usize,
    pub derivatives: usize,
    pub evictions: u64,
}

type DerivativeKey<T> = (Expression<T>, Class);

/// Intern table and derivative cache, shared by every matcher it is given to.
pub struct MemoCache<T> {
    config: CacheConfig,
    nodes: DashMap<Expression<T>, Expression<T>>,
    derivatives: DashMap<DerivativeKey<T>, Expression<T>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<T> Default for MemoCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

enum Rewrite<T> {
    Done(Expression<T>),
    Keep(Kind<T>),
}

impl<T> MemoCache<T> {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            nodes: DashMap::new(),
            derivatives: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            interned: self.nodes.len(),
            derivatives: self.derivatives.len(),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Drops every interned node and memoized derivative.
    pub fn clear(&self) {
        self.nodes.clear();
        self.derivatives.clear();
    }

    /// Returns the canonical instance of `expr`, interning every sub-expression
    /// bottom-up. Shared sub-trees of `expr` are visited once.
    pub fn intern(&self, expr: &Expression<T>) -> Expression<T> {
        let mut done = HashMap::new();
        self.intern_rec(expr, &mut done)
    }

    fn intern_rec(
        &self,
        expr: &Expression<T>,
        done: &mut HashMap<usize, Expression<T>>,
    ) -> Expression<T> {
        if let Some(canonical) = done.get(&expr.address()) {
            return canonical.clone();
        }

        let kind = match expr.kind() {
            Kind::Fail => Kind::Fail,
            Kind::Accept => Kind::Accept,
            Kind::Literal(p) => Kind::Literal(p.clone()),
            Kind::Any => Kind::Any,
            Kind::Concat(l, r) => Kind::Concat(self.intern_rec(l, done), self.intern_rec(r, done)),
            Kind::Alternate(l, r) => {
                Kind::Alternate(self.intern_rec(l, done), self.intern_rec(r, done))
            }
            Kind::Star(i) => Kind::Star(self.intern_rec(i, done)),
            Kind::Intersect(l, r) => {
                Kind::Intersect(self.intern_rec(l, done), self.intern_rec(r, done))
            }
            Kind::Difference(l, r) => {
                Kind::Difference(self.intern_rec(l, done), self.intern_rec(r, done))
            }
            Kind::Complement(i) => Kind::Complement(self.intern_rec(i, done)),
        };

        let canonical = self.make(kind);
        done.insert(expr.address(), canonical.clone());
        canonical
    }

    /// Builds a canonical node. Children are expected to be canonical already.
    pub(crate) fn make(&self, kind: Kind<T>) -> Expression<T> {
        let kind = if self.config.simplify {
            match self.rewrite(kind) {
                Rewrite::Done(expr) => return expr,
                Rewrite::Keep(kind) => kind,
            }
        } else {
            kind
        };

        self.canonical(Expression::from_kind(kind))
    }

    fn canonical(&self, expr: Expression<T>) -> Expression<T> {
        if let Some(existing) = self.nodes.get(&expr).map(|e| e.value().clone()) {
            return existing;
        }

        if let Some(capacity) = self.config.intern_capacity {
            if self.nodes.len() >= capacity {
                log::debug!("intern table reached {capacity} nodes, flushing");
                self.nodes.clear();
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.nodes.entry(expr.clone()).or_insert(expr).value().clone()
    }

    fn fail(&self) -> Expression<T> {
        self.canonical(Expression::fail())
    }

    fn rewrite(&self, kind: Kind<T>) -> Rewrite<T> {
        match kind {
            Kind::Concat(l, r) => {
                // 0 a => 0
                // a 0 => 0
                if l.is_fail() || r.is_fail() {
                    Rewrite::Done(self.fail())
                // e a => a
                } else if l.is_accept() {
                    Rewrite::Done(r)
                // a e => a
                } else if r.is_accept() {
                    Rewrite::Done(l)
                } else {
                    Rewrite::Keep(Kind::Concat(l, r))
                }
            }
            Kind::Alternate(l, r) => {
                // 0 | a => a
                if l.is_fail() {
                    Rewrite::Done(r)
                // a | 0 => a
                // a | a => a
                } else if r.is_fail() || l == r {
                    Rewrite::Done(l)
                } else {
                    Rewrite::Keep(Kind::Alternate(l, r))
                }
            }
            Kind::Star(i) => {
                // a** => a*
                if matches!(i.kind(), Kind::Star(_)) {
                    Rewrite::Done(i)
                // 0* => e
                // e* => e
                } else if i.is_fail() || i.is_accept() {
                    Rewrite::Done(self.make(Kind::Accept))
                } else {
                    Rewrite::Keep(Kind::Star(i))
                }
            }
            Kind::Intersect(l, r) => {
                // 0 & a => 0
                // a & 0 => 0
                if l.is_fail() || r.is_fail() {
                    Rewrite::Done(self.fail())
                // a & a => a
                } else if l == r {
                    Rewrite::Done(l)
                } else {
                    Rewrite::Keep(Kind::Intersect(l, r))
                }
            }
            Kind::Difference(l, r) => {
                // 0 - a => 0
                // a - a => 0
                if l.is_fail() || l == r {
                    Rewrite::Done(self.fail())
                // a - 0 => a
                } else if r.is_fail() {
                    Rewrite::Done(l)
                } else {
                    Rewrite::Keep(Kind::Difference(l, r))
                }
            }
            Kind::Complement(i) => {
                // ~~a => a
                if let Kind::Complement(inner) = i.kind() {
                    return Rewrite::Done(inner.clone());
                }
                Rewrite::Keep(Kind::Complement(i))
            }
            kind => Rewrite::Keep(kind),
        }
    }

    /// Memoized derivative of `expr` for any element of `class`.
    ///
    /// `expr` should come from [`intern`](MemoCache::intern) or an earlier call to
    /// this method; other expressions are still handled correctly, only with
    /// fewer cache hits.
    pub fn derive(&self, expr: &Expression<T>, class: &Class) -> Expression<T> {
        Memoized { cache: self, class }.derive(expr)
    }

    /// Memoized derivative for a concrete element. `predicates` must include
    /// every predicate of `expr`, usually taken from [`Expression::predicates`]
    /// of the expression the match started from.
    pub fn derive_value(
        &self,
        expr: &Expression<T>,
        predicates: &[Predicate<T>],
        value: &T,
    ) -> Expression<T> {
        self.derive(expr, &Class::of(predicates, value))
    }

    fn remember(&self, key: DerivativeKey<T>, derivative: Expression<T>) {
        if let Some(capacity) = self.config.derivative_capacity {
            if self.derivatives.len() >= capacity {
                log::debug!("derivative cache reached {capacity} entries, flushing");
                self.derivatives.clear();
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.derivatives.insert(key, derivative);
    }
}

struct Memoized<'a, T> {
    cache: &'a MemoCache<T>,
    class: &'a Class,
}

impl<T> Derivation<T> for Memoized<'_, T> {
    fn holds(&self, predicate: &Predicate<T>) -> bool {
        self.class.contains(predicate.id())
    }

    fn derive(&self, expr: &Expression<T>) -> Expression<T> {
        let key = (expr.clone(), self.class.clone());
        if let Some(hit) = self.cache.derivatives.get(&key).map(|e| e.value().clone()) {
            self.cache.hits.fetch_add(1, Ordering::Relaxed);
            return hit;
        }
        self.cache.misses.fetch_add(1, Ordering::Relaxed);

        let derivative = expr.derive_step(self);
        self.cache.remember(key, derivative.clone());
        derivative
    }

    fn make(&self, kind: Kind<T>) -> Expression<T> {
        self.cache.make(kind)
    }
}
