use diesel_async::pooled_connection::PoolError;
use shared::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("tire {tire_id} is not available for reservation")]
    NotAvailable { tire_id: i32 },

    #[error("storage error: {0}")]
    Storage(String),
}

impl InventoryError {
    pub fn tire_not_found(id: i32) -> Self {
        InventoryError::NotFound { entity: "tire", id }
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            InventoryError::Validation(_) => "validation",
            InventoryError::NotFound { .. } => "not_found",
            InventoryError::NotAvailable { .. } => "not_available",
            InventoryError::Storage(_) => "storage",
        }
    }
}

impl From<diesel::result::Error> for InventoryError {
    fn from(err: diesel::result::Error) -> Self {
        InventoryError::Storage(err.to_string())
    }
}

impl From<diesel::ConnectionError> for InventoryError {
    fn from(err: diesel::ConnectionError) -> Self {
        InventoryError::Storage(format!("connection failed: {}", err))
    }
}

impl From<PoolError> for InventoryError {
    fn from(err: PoolError) -> Self {
        InventoryError::Storage(format!("connection pool: {}", err))
    }
}

impl From<bb8::RunError<PoolError>> for InventoryError {
    fn from(err: bb8::RunError<PoolError>) -> Self {
        match err {
            bb8::RunError::User(e) => e.into(),
            bb8::RunError::TimedOut => InventoryError::Storage("timed out waiting for a database connection".to_string()),
        }
    }
}

pub type InventoryResult<T> = Result<T, InventoryError>;
