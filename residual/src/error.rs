use thiserror::Error;

/// Errors raised while consuming input.
///
/// Not matching is not an error: it is reported as `Ok(false)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// The residual expression grew past [`MatcherConfig::max_state_size`](crate::MatcherConfig::max_state_size).
    #[error("matcher overflow: residual expression has {size} nodes, limit is {limit}")]
    Overflow {
        /// Size of the residual that was rejected.
        size: usize,
        /// The configured limit.
        limit: usize,
    },
}
