/// Limits applied while a [`Matcher`](crate::Matcher) or
/// [`MatcherState`](crate::MatcherState) consumes input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatcherConfig {
    /// Largest residual expression, in tree nodes (see [`Expression::size`](crate::Expression::size)),
    /// that a state may reach. Exceeding it fails the step with
    /// [`MatchError::Overflow`](crate::MatchError::Overflow). `None` means unlimited.
    pub max_state_size: Option<usize>,
}

impl MatcherConfig {
    /// The default configuration: no limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the size of residual expressions.
    pub fn with_max_state_size(mut self, limit: usize) -> Self {
        self.max_state_size = Some(limit);
        self
    }
}
