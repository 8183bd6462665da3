/// Engine-level error taxonomy shared across crates.
///
/// Per-region failures inside a recompute run are caught and recorded in
/// the run summary; only `InvalidConfig` is fatal to an entire run, since
/// a malformed weight set would silently produce wrong scores for every
/// region.
///
/// # Examples
///
/// ```rust
/// use floodwatch_common::error::EngineError;
///
/// let err = EngineError::UnknownRegion {
///     region_id: "CR-404".to_string(),
/// };
/// assert!(err.to_string().contains("CR-404"));
/// assert!(!err.is_retryable());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The referenced region does not exist in reference data.
    #[error("unknown region: {region_id}")]
    UnknownRegion { region_id: String },

    /// An observation carried an out-of-range or negative value.
    #[error("invalid metric: {reason}")]
    InvalidMetric { reason: String },

    /// Configuration failed validation (weights not summing to 1,
    /// malformed rule, inverted cut points).
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Transient storage failure; retried with backoff before being
    /// surfaced as a region failure.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Another recompute run already holds the single-flight claim for
    /// this region. Retryable.
    #[error("recompute already in progress for region {region_id}")]
    ConcurrentRecomputeInProgress { region_id: String },

    /// A looked-up record does not exist.
    #[error("{entity} not found (id={id})")]
    NotFound { entity: &'static str, id: String },
}

impl EngineError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::StoreUnavailable(_)
                | EngineError::ConcurrentRecomputeInProgress { .. }
        )
    }
}

/// Convenience `Result` alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
