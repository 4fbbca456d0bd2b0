//! Async data layer
//!
//! Reads database credentials from the environment, and builds a pooled
//! SeaORM engine, a session factory and a declarative base for entities.
//!
//! ```rust,ignore
//! let data = datalayer::DataLayer::from_env().await?;
//! let mut session = data.session();
//! ```

pub mod config;
pub mod database;
pub mod error;

pub use config::{env, env_optional, load_dotenv, Environment};
pub use database::{
    Base, DataLayer, DatabaseConfig, DatabaseConfigBuilder, Engine, ModelRegistration, Session,
    SessionFactory, SessionSettings,
};
pub use error::FrameworkError;

// Re-export sea_orm types that users commonly need
pub use sea_orm;

#[doc(hidden)]
pub use inventory;
