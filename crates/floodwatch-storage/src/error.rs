/// Errors that can occur within the storage layer.
///
/// Validation failures (unknown region, out-of-range metric) are typed so
/// the HTTP layer can map them to client errors instead of a blanket 500.
///
/// # Examples
///
/// ```rust
/// use floodwatch_storage::error::StorageError;
///
/// let err = StorageError::NotFound {
///     entity: "alert",
///     id: "alert-99".to_string(),
/// };
/// assert!(err.to_string().contains("alert"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A required record was not found in the database.
    #[error("Storage: {entity} not found (id={id})")]
    NotFound { entity: &'static str, id: String },

    /// A write referenced a region that does not exist in reference data.
    #[error("Storage: unknown region: {region_id}")]
    UnknownRegion { region_id: String },

    /// An observation carried an out-of-range or negative value.
    #[error("Storage: invalid metric: {reason}")]
    InvalidMetric { reason: String },

    /// An alert lifecycle transition that the state machine forbids
    /// (e.g. acknowledging a resolved alert).
    #[error("Storage: illegal alert transition from '{from}' to '{to}'")]
    IllegalTransition { from: String, to: String },

    /// A stored text column holds a value the domain enums cannot parse.
    #[error("Storage: invalid value in column '{column}': {value}")]
    InvalidColumn { column: &'static str, value: String },

    /// An underlying database error.
    #[error("Storage: database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    /// JSON serialization or deserialization failure (e.g. triggered_by,
    /// conditions_json columns).
    #[error("Storage: JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StorageError> for floodwatch_common::error::EngineError {
    fn from(err: StorageError) -> Self {
        use floodwatch_common::error::EngineError;
        match err {
            StorageError::UnknownRegion { region_id } => EngineError::UnknownRegion { region_id },
            StorageError::InvalidMetric { reason } => EngineError::InvalidMetric { reason },
            StorageError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            // Database and decoding failures surface as retryable store trouble
            other => EngineError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
