use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_PREDICATE: AtomicU64 = AtomicU64::new(0);

/// Identity token of a [`Predicate`].
///
/// Every predicate gets a fresh id when it is created, and clones share it.
/// Two literals are structurally equal only when their ids are equal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PredicateId(u64);

impl Display for PredicateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A test over single elements of the alphabet `T`, used by literal expressions.
///
/// Predicates are compared by identity, never by behaviour: two closures that
/// accept exactly the same elements are still different predicates unless one
/// is a clone of the other.
pub struct Predicate<T> {
    id: PredicateId,
    name: Option<Arc<str>>,
    test: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> Predicate<T> {
    pub fn new(test: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self {
            id: PredicateId(NEXT_PREDICATE.fetch_add(1, Ordering::Relaxed)),
            name: None,
            test: Arc::new(test),
        }
    }

    /// Like [`Predicate::new`], but with a name used when printing expressions.
    pub fn named(
        name: impl Into<Arc<str>>,
        test: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(test)
        }
    }

    /// A predicate holding for elements equal to `value`.
    pub fn equal_to(value: T) -> Self
    where
        T: PartialEq + Debug + Send + Sync + 'static,
    {
        let name = format!("{value:?}");
        Self::named(name, move |x| *x == value)
    }

    pub fn id(&self) -> PredicateId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn test(&self, value: &T) -> bool {
        (self.test)(value)
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            test: self.test.clone(),
        }
    }
}

impl<T> PartialEq for Predicate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Predicate<T> {}

impl<T> Hash for Predicate<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl<T> Debug for Predicate<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predicate")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl<T> Display for Predicate<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}", self.id),
        }
    }
}

/// The set of predicates (out of some fixed list) that one input element satisfies.
///
/// Derivatives only observe predicate outcomes, so two elements with the same
/// class have the same derivative for every expression over those predicates.
/// This makes the class usable as a cache key without requiring anything of `T`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Class(Arc<[PredicateId]>);

impl Class {
    pub fn of<T>(predicates: &[Predicate<T>], value: &T) -> Self {
        let mut holding: Vec<_> = predicates
            .iter()
            .filter(|p| p.test(value))
            .map(Predicate::id)
            .collect();
        holding.sort_unstable();
        holding.dedup();
        Self(holding.into())
    }

    pub fn contains(&self, id: PredicateId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
