//! Data layer
//!
//! Builds the database engine, session factory and declarative base from
//! [`DatabaseConfig`] and bundles them in a [`DataLayer`] that the
//! application owns and hands to request handlers.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use datalayer::{config, DataLayer};
//!
//! // 1. Load .env files (once, at startup)
//! config::load_dotenv(std::path::Path::new("."));
//!
//! // 2. Build the data layer
//! let data = DataLayer::from_env().await?;
//!
//! // 3. Use a session per unit of work
//! let mut session = data.session();
//! let todos = todos::Entity::find().all(session.connection().await?).await?;
//! session.commit().await?;
//! ```
//!
//! # Configuration
//!
//! ```env
//! DATABASE=orders
//! DB_USER=svc
//! DB_PWD=secret
//! ```
//!
//! Host and port are fixed at `localhost:5432`.

pub mod base;
pub mod config;
pub mod engine;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use base::{Base, ModelRegistration};
pub use config::{DatabaseConfig, DatabaseConfigBuilder};
pub use engine::Engine;
pub use session::{Session, SessionFactory, SessionSettings};

use crate::error::FrameworkError;

/// Engine, session factory and declarative base, owned together
///
/// Cheap to clone; clones share the engine's pool. Build one at startup and
/// pass it (or a reference) to the code that needs database access.
#[derive(Debug, Clone)]
pub struct DataLayer {
    config: DatabaseConfig,
    engine: Engine,
    sessions: SessionFactory,
    base: Base,
}

impl DataLayer {
    /// Read `DATABASE`, `DB_USER`, `DB_PWD` and build everything
    ///
    /// The base holds every entity attached with `declare_model!`.
    pub async fn from_env() -> Result<Self, FrameworkError> {
        Self::new(DatabaseConfig::from_env()).await
    }

    /// Build from an explicit config
    pub async fn new(config: DatabaseConfig) -> Result<Self, FrameworkError> {
        let engine = Engine::connect(&config).await?;
        Ok(Self::with_engine(config, engine, Base::discover()))
    }

    /// Assemble from parts, e.g. an engine on another backend in tests
    pub fn with_engine(config: DatabaseConfig, engine: Engine, base: Base) -> Self {
        let sessions = SessionFactory::new(engine.clone());
        Self {
            config,
            engine,
            sessions,
            base,
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// The connection descriptor the engine was built from
    pub fn connection_url(&self) -> String {
        self.config.connection_url()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn sessions(&self) -> &SessionFactory {
        &self.sessions
    }

    pub fn base(&self) -> &Base {
        &self.base
    }

    /// Open a new session
    pub fn session(&self) -> Session {
        self.sessions.session()
    }

    /// Create every table attached to the base
    pub async fn create_all(&self) -> Result<(), FrameworkError> {
        self.base.create_all(&self.engine).await
    }

    /// Drop every table attached to the base
    pub async fn drop_all(&self) -> Result<(), FrameworkError> {
        self.base.drop_all(&self.engine).await
    }

    /// Release this handle's share of the engine
    pub async fn dispose(self) -> Result<(), FrameworkError> {
        drop(self.sessions);
        self.engine.dispose().await
    }
}
