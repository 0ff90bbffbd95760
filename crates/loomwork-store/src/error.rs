/// Errors surfaced by the execution state store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A uniqueness or other integrity constraint was violated.
  #[error("constraint violation: {0}")]
  Constraint(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Migrations failed to apply.
  #[error("migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  /// Stored JSON failed to (de)serialize.
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// A workflow validation error surfaced while loading a persisted graph.
  #[error("workflow error: {0}")]
  Workflow(#[from] loomwork_model::WorkflowError),
}
