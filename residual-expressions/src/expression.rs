use crate::cache::MemoCache;
use crate::predicate::{Predicate, PredicateId};
use std::borrow::Borrow;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::mem;
use std::ops::{BitAnd, BitOr, Not, Sub};
use std::sync::Arc;

/// The cases of an [`Expression`].
pub enum Kind<T> {
    /// Matches nothing.
    Fail,
    /// Matches only the empty sequence.
    Accept,
    /// Matches one element satisfying the predicate.
    Literal(Predicate<T>),
    /// Matches any one element.
    Any,
    Concat(Expression<T>, Expression<T>),
    Alternate(Expression<T>, Expression<T>),
    Star(Expression<T>),
    Intersect(Expression<T>, Expression<T>),
    Difference(Expression<T>, Expression<T>),
    Complement(Expression<T>),
}

impl<T> Kind<T> {
    fn structural_hash(&self) -> u64 {
        let mut h = DefaultHasher::new();
        mem::discriminant(self).hash(&mut h);
        match self {
            Kind::Fail | Kind::Accept | Kind::Any => {}
            Kind::Literal(p) => p.id().hash(&mut h),
            Kind::Star(i) | Kind::Complement(i) => h.write_u64(i.0.hash),
            Kind::Concat(l, r)
            | Kind::Alternate(l, r)
            | Kind::Intersect(l, r)
            | Kind::Difference(l, r) => {
                h.write_u64(l.0.hash);
                h.write_u64(r.0.hash);
            }
        }
        h.finish()
    }
}

impl<T> Clone for Kind<T> {
    fn clone(&self) -> Self {
        match self {
            Kind::Fail => Kind::Fail,
            Kind::Accept => Kind::Accept,
            Kind::Literal(p) => Kind::Literal(p.clone()),
            Kind::Any => Kind::Any,
            Kind::Concat(l, r) => Kind::Concat(l.clone(), r.clone()),
            Kind::Alternate(l, r) => Kind::Alternate(l.clone(), r.clone()),
            Kind::Star(i) => Kind::Star(i.clone()),
            Kind::Intersect(l, r) => Kind::Intersect(l.clone(), r.clone()),
            Kind::Difference(l, r) => Kind::Difference(l.clone(), r.clone()),
            Kind::Complement(i) => Kind::Complement(i.clone()),
        }
    }
}

impl<T> PartialEq for Kind<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Kind::Fail, Kind::Fail) | (Kind::Accept, Kind::Accept) | (Kind::Any, Kind::Any) => {
                true
            }
            (Kind::Literal(a), Kind::Literal(b)) => a == b,
            (Kind::Star(a), Kind::Star(b)) | (Kind::Complement(a), Kind::Complement(b)) => a == b,
            (Kind::Concat(l1, r1), Kind::Concat(l2, r2))
            | (Kind::Alternate(l1, r1), Kind::Alternate(l2, r2))
            | (Kind::Intersect(l1, r1), Kind::Intersect(l2, r2))
            | (Kind::Difference(l1, r1), Kind::Difference(l2, r2)) => l1 == l2 && r1 == r2,
            _ => false,
        }
    }
}

impl<T> Eq for Kind<T> {}

struct Node<T> {
    kind: Kind<T>,
    hash: u64,
    nullable: bool,
    size: usize,
}

impl<T> Node<T> {
    fn detach(&mut self, stack: &mut Vec<Expression<T>>) {
        match mem::replace(&mut self.kind, Kind::Fail) {
            Kind::Star(i) | Kind::Complement(i) => stack.push(i),
            Kind::Concat(l, r)
            | Kind::Alternate(l, r)
            | Kind::Intersect(l, r)
            | Kind::Difference(l, r) => {
                stack.push(l);
                stack.push(r);
            }
            Kind::Fail | Kind::Accept | Kind::Literal(_) | Kind::Any => {}
        }
    }
}

// Releases deep chains with a work stack instead of one native frame per level.
impl<T> Drop for Node<T> {
    fn drop(&mut self) {
        if matches!(
            self.kind,
            Kind::Fail | Kind::Accept | Kind::Literal(_) | Kind::Any
        ) {
            return;
        }

        let mut stack = Vec::new();
        self.detach(&mut stack);
        while let Some(expr) = stack.pop() {
            if let Some(mut node) = Arc::into_inner(expr.0) {
                node.detach(&mut stack);
            }
        }
    }
}

/// An immutable expression over the alphabet `T`.
///
/// Cloning is cheap: children are shared, never copied. Equality is structural
/// (with literals compared by [`PredicateId`]), and short-circuits on physically
/// shared nodes, so expressions that went through a [`MemoCache`](crate::MemoCache)
/// compare in constant time. The hash is computed once at construction.
pub struct Expression<T>(Arc<Node<T>>);

impl<T> Clone for Expression<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> PartialEq for Expression<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.hash == other.0.hash && self.0.kind == other.0.kind)
    }
}

impl<T> Eq for Expression<T> {}

impl<T> Hash for Expression<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash)
    }
}

/// How a derivative step observes predicates and builds its result.
///
/// The plain step tests predicates directly and allocates fresh nodes; the
/// memoized step in [`MemoCache`](crate::MemoCache) looks results up by
/// [`Class`](crate::Class) and builds interned nodes.
pub(crate) trait Derivation<T> {
    fn holds(&self, predicate: &Predicate<T>) -> bool;
    fn derive(&self, expr: &Expression<T>) -> Expression<T>;
    fn make(&self, kind: Kind<T>) -> Expression<T>;
}

struct ByValue<'a, T>(&'a T);

impl<T> Derivation<T> for ByValue<'_, T> {
    fn holds(&self, predicate: &Predicate<T>) -> bool {
        predicate.test(self.0)
    }

    fn derive(&self, expr: &Expression<T>) -> Expression<T> {
        expr.derive_step(self)
    }

    fn make(&self, kind: Kind<T>) -> Expression<T> {
        Expression::from_kind(kind)
    }
}

impl<T> Expression<T> {
    pub fn from_kind(kind: Kind<T>) -> Self {
        let (nullable, size) = match &kind {
            Kind::Fail => (false, 1),
            Kind::Accept => (true, 1),
            Kind::Literal(_) | Kind::Any => (false, 1),
            Kind::Concat(l, r) => (l.is_nullable() && r.is_nullable(), binary_size(l, r)),
            Kind::Alternate(l, r) => (l.is_nullable() || r.is_nullable(), binary_size(l, r)),
            Kind::Star(i) => (true, i.size().saturating_add(1)),
            Kind::Intersect(l, r) => (l.is_nullable() && r.is_nullable(), binary_size(l, r)),
            Kind::Difference(l, r) => (l.is_nullable() && !r.is_nullable(), binary_size(l, r)),
            Kind::Complement(i) => (!i.is_nullable(), i.size().saturating_add(1)),
        };
        let hash = kind.structural_hash();

        Self(Arc::new(Node {
            kind,
            hash,
            nullable,
            size,
        }))
    }

    pub fn fail() -> Self {
        Self::from_kind(Kind::Fail)
    }

    pub fn accept() -> Self {
        Self::from_kind(Kind::Accept)
    }

    pub fn literal(predicate: Predicate<T>) -> Self {
        Self::from_kind(Kind::Literal(predicate))
    }

    pub fn any() -> Self {
        Self::from_kind(Kind::Any)
    }

    pub fn concat(self, right: Self) -> Self {
        Self::from_kind(Kind::Concat(self, right))
    }

    pub fn alternate(self, right: Self) -> Self {
        Self::from_kind(Kind::Alternate(self, right))
    }

    pub fn star(self) -> Self {
        Self::from_kind(Kind::Star(self))
    }

    pub fn intersect(self, right: Self) -> Self {
        Self::from_kind(Kind::Intersect(self, right))
    }

    pub fn difference(self, right: Self) -> Self {
        Self::from_kind(Kind::Difference(self, right))
    }

    pub fn complement(self) -> Self {
        Self::from_kind(Kind::Complement(self))
    }

    /// One or more repetitions: `a a*`.
    pub fn plus(self) -> Self {
        self.clone().concat(self.star())
    }

    /// Zero or one occurrence: `e | a`.
    pub fn optional(self) -> Self {
        Self::accept().alternate(self)
    }

    pub fn kind(&self) -> &Kind<T> {
        &self.0.kind
    }

    /// Whether this expression matches the empty sequence.
    ///
    /// Computed once per node when it is built.
    pub fn is_nullable(&self) -> bool {
        self.0.nullable
    }

    pub fn is_fail(&self) -> bool {
        matches!(self.0.kind, Kind::Fail)
    }

    pub fn is_accept(&self) -> bool {
        matches!(self.0.kind, Kind::Accept)
    }

    /// Number of nodes of this expression counted as a tree (shared nodes are
    /// counted once per occurrence). Saturates at `usize::MAX`.
    pub fn size(&self) -> usize {
        self.0.size
    }

    /// True when both handles point at the same node.
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub fn children(&self) -> impl Iterator<Item = &Expression<T>> {
        let (l, r) = match &self.0.kind {
            Kind::Fail | Kind::Accept | Kind::Literal(_) | Kind::Any => (None, None),
            Kind::Star(i) | Kind::Complement(i) => (Some(i), None),
            Kind::Concat(l, r)
            | Kind::Alternate(l, r)
            | Kind::Intersect(l, r)
            | Kind::Difference(l, r) => (Some(l), Some(r)),
        };
        l.into_iter().chain(r)
    }

    /// Applies an element to this expression. The result matches `rest`
    /// exactly when this expression matches `value` followed by `rest`.
    ///
    /// This is the plain derivative: it follows the rules node by node and
    /// never rewrites or shares the result. See [`MemoCache::derive`](crate::MemoCache::derive)
    /// for the memoized version.
    pub fn derive(&self, value: &T) -> Expression<T> {
        ByValue(value).derive(self)
    }

    pub(crate) fn derive_step(&self, d: &impl Derivation<T>) -> Expression<T> {
        match &self.0.kind {
            // a: 0 => 0
            Kind::Fail => self.clone(),
            // a: e => 0
            Kind::Accept => d.make(Kind::Fail),
            // a: a => e
            // a: b => 0
            Kind::Literal(p) => {
                if d.holds(p) {
                    d.make(Kind::Accept)
                } else {
                    d.make(Kind::Fail)
                }
            }
            // a: _ => e
            Kind::Any => d.make(Kind::Accept),
            // a: (ab | ac) => b | c
            Kind::Alternate(l, r) => d.make(Kind::Alternate(d.derive(l), d.derive(r))),
            // a: ab => b
            Kind::Concat(l, r) => {
                let head = d.make(Kind::Concat(d.derive(l), r.clone()));

                if l.is_nullable() {
                    d.make(Kind::Alternate(head, d.derive(r)))
                } else {
                    head
                }
            }
            // a: (ab)* => b(ab)*
            Kind::Star(i) => d.make(Kind::Concat(d.derive(i), self.clone())),
            // a: (ab & ac) => b & c
            Kind::Intersect(l, r) => d.make(Kind::Intersect(d.derive(l), d.derive(r))),
            // a: (ab - ac) => b - c
            Kind::Difference(l, r) => d.make(Kind::Difference(d.derive(l), d.derive(r))),
            // a: ~(ab) => ~(b)
            Kind::Complement(i) => d.make(Kind::Complement(d.derive(i))),
        }
    }

    /// Returns true if this expression matches the whole sequence.
    ///
    /// Derives through a [`MemoCache`] private to this call, so the residual of
    /// expressions like `_* a` stays the same size however long the input is.
    /// Stops early once the residual expression is [`Kind::Fail`].
    pub fn matches<I>(&self, sequence: I) -> bool
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
    {
        let cache = MemoCache::new();
        let predicates = self.predicates();

        let mut current = cache.intern(self);
        for value in sequence {
            if current.is_fail() {
                return false;
            }
            current = cache.derive_value(&current, &predicates, value.borrow());
        }

        current.is_nullable()
    }

    /// All distinct predicates used by literals in this expression, ordered by id.
    pub fn predicates(&self) -> Vec<Predicate<T>> {
        let mut visited = HashSet::new();
        let mut found = HashMap::new();
        self.search_predicates(&mut visited, &mut found);

        let mut predicates: Vec<_> = found.into_values().collect();
        predicates.sort_by_key(Predicate::id);
        predicates
    }

    fn search_predicates(
        &self,
        visited: &mut HashSet<usize>,
        found: &mut HashMap<PredicateId, Predicate<T>>,
    ) {
        if !visited.insert(self.address()) {
            return;
        }

        if let Kind::Literal(p) = &self.0.kind {
            found.entry(p.id()).or_insert_with(|| p.clone());
        }
        for child in self.children() {
            child.search_predicates(visited, found);
        }
    }

    fn precedence(&self) -> u8 {
        match &self.0.kind {
            Kind::Alternate(..) => 0,
            Kind::Intersect(..) | Kind::Difference(..) => 1,
            Kind::Concat(..) => 2,
            Kind::Complement(_) => 3,
            Kind::Star(_) => 4,
            Kind::Fail | Kind::Accept | Kind::Literal(_) | Kind::Any => 5,
        }
    }

    fn fmt_at(&self, f: &mut Formatter<'_>, context: u8) -> std::fmt::Result {
        let own = self.precedence();
        if own < context {
            write!(f, "(")?;
        }

        match &self.0.kind {
            Kind::Fail => write!(f, "0")?,
            Kind::Accept => write!(f, "e")?,
            Kind::Any => write!(f, "_")?,
            Kind::Literal(p) => write!(f, "{p}")?,
            Kind::Star(i) => {
                i.fmt_at(f, 5)?;
                write!(f, "*")?;
            }
            Kind::Complement(i) => {
                write!(f, "~")?;
                i.fmt_at(f, 4)?;
            }
            Kind::Concat(l, r) => {
                l.fmt_at(f, 2)?;
                write!(f, " ")?;
                r.fmt_at(f, 3)?;
            }
            Kind::Alternate(l, r) => {
                l.fmt_at(f, 0)?;
                write!(f, " | ")?;
                r.fmt_at(f, 1)?;
            }
            Kind::Intersect(l, r) => {
                l.fmt_at(f, 1)?;
                write!(f, " & ")?;
                r.fmt_at(f, 2)?;
            }
            Kind::Difference(l, r) => {
                l.fmt_at(f, 1)?;
                write!(f, " - ")?;
                r.fmt_at(f, 2)?;
            }
        }

        if own < context {
            write!(f, ")")?;
        }
        Ok(())
    }
}

fn binary_size<T>(l: &Expression<T>, r: &Expression<T>) -> usize {
    l.size().saturating_add(r.size()).saturating_add(1)
}

impl<T> Display for Expression<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.fmt_at(f, 0)
    }
}

impl<T> Debug for Expression<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Expression({self})")
    }
}

impl<T> BitOr for Expression<T> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.alternate(rhs)
    }
}

impl<T> BitAnd for Expression<T> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersect(rhs)
    }
}

impl<T> Sub for Expression<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.difference(rhs)
    }
}

impl<T> Not for Expression<T> {
    type Output = Self;

    fn not(self) -> Self {
        self.complement()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lit(c: char) -> Expression<char> {
        Expression::literal(Predicate::equal_to(c))
    }

    #[test]
    fn nullable() {
        let a = lit('a');
        let b = lit('b');

        assert!(!Expression::<char>::fail().is_nullable());
        assert!(Expression::<char>::accept().is_nullable());
        assert!(!a.is_nullable());
        assert!(!Expression::<char>::any().is_nullable());

        assert!(Expression::accept().alternate(a.clone()).is_nullable());
        assert!(a.clone().alternate(Expression::accept()).is_nullable());
        assert!(!a.clone().alternate(b.clone()).is_nullable());

        assert!(!Expression::accept().intersect(a.clone()).is_nullable());
        assert!(a.clone().star().intersect(Expression::accept()).is_nullable());

        assert!(!a.clone().concat(Expression::accept()).is_nullable());
        assert!(!Expression::accept().concat(b.clone()).is_nullable());
        assert!(a.clone().star().concat(b.clone().star()).is_nullable());

        assert!(a.clone().star().is_nullable());
        assert!(!a.clone().plus().is_nullable());
        assert!(a.clone().optional().is_nullable());

        assert!(a.clone().star().difference(b.clone()).is_nullable());
        assert!(!a.clone().star().difference(b.clone().star()).is_nullable());

        assert!(a.clone().complement().is_nullable());
        assert!(!a.star().complement().is_nullable());
    }

    #[test]
    fn absorbing() {
        for c in ['a', 'z', '0'] {
            assert!(Expression::<char>::fail().derive(&c).is_fail());
            assert!(Expression::<char>::accept().derive(&c).is_fail());
        }
    }

    #[test]
    fn derive_literal_and_any() {
        let a = lit('a');
        assert!(a.derive(&'a').is_accept());
        assert!(a.derive(&'b').is_fail());
        assert!(Expression::<char>::any().derive(&'q').is_accept());
    }

    #[test]
    fn derive_star_reuses_node() {
        let star = lit('a').star();
        let derived = star.derive(&'a');
        match derived.kind() {
            Kind::Concat(head, tail) => {
                assert!(head.is_accept());
                assert!(tail.same(&star));
            }
            _ => panic!("expected a concatenation, got {derived}"),
        }
    }

    #[test]
    fn derive_concat_unions_when_nullable() {
        let a = lit('a');
        let b = lit('b');
        let expr = a.clone().star().concat(b.clone());
        let derived = expr.derive(&'b');
        assert!(matches!(derived.kind(), Kind::Alternate(..)));
        assert!(derived.is_nullable());

        let expr = a.concat(b);
        assert!(matches!(expr.derive(&'a').kind(), Kind::Concat(..)));
    }

    #[test]
    fn matches_sequences() {
        let a = lit('a');
        let b = lit('b');
        let expr = a.clone().concat(b.star());

        assert!(expr.matches("a".chars()));
        assert!(expr.matches("ab".chars()));
        assert!(expr.matches("abbbbb".chars()));
        assert!(!expr.matches("ba".chars()));
        assert!(!expr.matches("".chars()));

        let star = a.star();
        for s in ["", "a", "aa", "aaa"] {
            assert!(star.matches(s.chars()), "{s}");
        }
        assert!(!star.matches("ab".chars()));
    }

    #[test]
    fn structural_equality() {
        let a = lit('a');
        let other_a = lit('a');

        assert_eq!(a.clone().star(), a.clone().star());
        assert_ne!(a.clone().star(), other_a.star());
        assert_ne!(a.clone().concat(a.clone()), a.clone().alternate(a.clone()));
        assert_eq!(
            Expression::<char>::accept().alternate(Expression::fail()),
            Expression::accept().alternate(Expression::fail())
        );
    }

    #[test]
    fn predicates_are_collected_once() {
        let a = lit('a');
        let b = lit('b');
        let expr = a.clone().concat(b.clone()).alternate(a.clone().star());
        let ids: Vec<_> = expr.predicates().iter().map(Predicate::id).collect();
        let mut expected = vec![
            a.predicates()[0].id(),
            b.predicates()[0].id(),
        ];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn size_counts_tree_nodes() {
        let a = lit('a');
        assert_eq!(a.size(), 1);
        assert_eq!(a.clone().star().size(), 2);
        assert_eq!(a.clone().concat(a.clone()).size(), 3);
    }

    #[test]
    fn display() {
        let a = Expression::literal(Predicate::named("A", |_: &char| true));
        let b = Expression::literal(Predicate::named("B", |_: &char| true));
        let c = Expression::literal(Predicate::named("C", |_: &char| true));

        assert_eq!(a.clone().concat(b.clone().star()).to_string(), "A B*");
        assert_eq!((!a.clone() | b.clone().star()).to_string(), "~A | B*");
        assert_eq!(
            a.clone().concat(b.clone()).star().to_string(),
            "(A B)*"
        );
        assert_eq!(
            (a.clone() | (b.clone() | c.clone())).to_string(),
            "A | (B | C)"
        );
        assert_eq!(
            ((a.clone() | b.clone()) & c.clone()).to_string(),
            "(A | B) & C"
        );
        assert_eq!((a - b).to_string(), "A - B");
        assert_eq!(
            Expression::<char>::any().star().concat(Expression::fail()).to_string(),
            "_* 0"
        );
        assert_eq!(c.optional().to_string(), "e | C");
    }

    #[test]
    fn drop_deep_chain() {
        let a = lit('a');
        let mut chain = Expression::accept();
        for _ in 0..200_000 {
            chain = a.clone().concat(chain);
        }
        assert_eq!(chain.size(), 400_001);

        let shared = chain.clone().star();
        drop(chain);
        assert!(shared.is_nullable());
        drop(shared);
    }

    #[test]
    fn matches_long_input() {
        let expr = Expression::any().star().concat(lit('a'));

        let mut input = "x".repeat(30_000);
        input.push('a');
        assert!(expr.matches(input.chars()));

        input.push('x');
        assert!(!expr.matches(input.chars()));
    }
}
