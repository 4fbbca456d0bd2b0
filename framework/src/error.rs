//! Data-layer error types
//!
//! Provides a unified error type for configuration, engine and session
//! operations. Driver failures are carried as their rendered message so the
//! error stays `Clone` and can be logged or handed across task boundaries.

use thiserror::Error;

/// Data-layer error type
///
/// Nothing here is raised while reading configuration: missing credentials
/// only show up once the engine actually talks to the server, as a
/// [`FrameworkError::Database`].
///
/// # Automatic Error Conversion
///
/// `FrameworkError` implements `From<sea_orm::DbErr>`, so SeaORM calls can be
/// propagated with `?`:
///
/// ```rust,ignore
/// use datalayer::FrameworkError;
/// use sea_orm::ActiveModelTrait;
///
/// pub async fn create_todo(session: &mut Session) -> Result<todos::Model, FrameworkError> {
///     let todo = new_todo.insert(session.connection().await?).await?;
///     Ok(todo)
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum FrameworkError {
    /// Error reported by the database driver or the ORM
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration could not be turned into something usable
    #[error("Configuration error: {message}")]
    Config {
        /// The error message
        message: String,
    },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl FrameworkError {
    /// Create a Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for errors that came back from the driver
    pub fn is_database(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

// Implement From<DbErr> for automatic error conversion with ?
impl From<sea_orm::DbErr> for FrameworkError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Database(e.to_string())
    }
}
