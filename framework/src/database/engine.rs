//! Database engine

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection,
    DatabaseTransaction, TransactionTrait,
};
use std::sync::Arc;
use url::Url;

use crate::database::config::{driver_url, DatabaseConfig};
use crate::error::FrameworkError;

/// Pooled connection manager
///
/// Wraps SeaORM's `DatabaseConnection`. Cloning is cheap and every clone
/// shares the same pool, so the engine is created once at startup and handed
/// to whatever needs it.
///
/// The pool is created lazily: constructing an engine performs no network
/// I/O, and unreachable hosts or bad credentials are reported by the first
/// query (or by [`Engine::ping`]).
///
/// # Example
///
/// ```rust,ignore
/// let engine = Engine::connect(&DatabaseConfig::from_env()).await?;
///
/// // Use with SeaORM queries
/// let todos = todos::Entity::find().all(engine.connection()).await?;
/// ```
#[derive(Clone)]
pub struct Engine {
    inner: Arc<DatabaseConnection>,
    echo: bool,
}

impl Engine {
    /// Create an engine from config
    ///
    /// Statement logging follows `config.echo`. Credentials are
    /// percent-encoded for the driver, so any user, password or database
    /// name builds an engine; wrong ones fail at first use.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, FrameworkError> {
        tracing::info!(
            url = %config.redacted_url(),
            echo = config.echo,
            "creating database engine"
        );
        let missing = config.missing_vars();
        if !missing.is_empty() {
            tracing::warn!(?missing, "database credentials not set, connections will fail");
        }

        let url = config.driver_url()?;
        Self::open(&url, config.redacted_url(), config.echo, config.max_connections).await
    }

    /// Create an engine from a raw URL
    ///
    /// Accepts anything SeaORM understands (`postgres://`, `sqlite::memory:`,
    /// ...) as well as `dialect+driver://` descriptors.
    pub async fn connect_url(url: &str, echo: bool) -> Result<Self, FrameworkError> {
        Self::connect_url_with(url, echo, None).await
    }

    /// Like [`Engine::connect_url`], with an explicit pool size
    pub async fn connect_url_with(
        url: &str,
        echo: bool,
        max_connections: Option<u32>,
    ) -> Result<Self, FrameworkError> {
        Self::open(&driver_url(url), redact_url(url), echo, max_connections).await
    }

    /// `display_url` is the only form of the URL that may end up in errors
    async fn open(
        url: &str,
        display_url: String,
        echo: bool,
        max_connections: Option<u32>,
    ) -> Result<Self, FrameworkError> {
        let mut opt = ConnectOptions::new(url);
        opt.sqlx_logging(echo).connect_lazy(true);
        if let Some(max) = max_connections {
            opt.max_connections(max);
        }

        let conn = Database::connect(opt)
            .await
            .map_err(|e| {
                FrameworkError::database(format!(
                    "cannot create engine for {}: {}",
                    display_url,
                    redact_error(&e.to_string(), url, &display_url)
                ))
            })?;

        Ok(Self {
            inner: Arc::new(conn),
            echo,
        })
    }

    /// Get a reference to the underlying SeaORM connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.inner
    }

    /// Whether statements are logged
    pub fn echo(&self) -> bool {
        self.echo
    }

    /// Backend the engine talks to
    pub fn backend(&self) -> DatabaseBackend {
        self.inner.get_database_backend()
    }

    /// Check out a connection and run a round trip
    pub async fn ping(&self) -> Result<(), FrameworkError> {
        self.inner.ping().await?;
        Ok(())
    }

    /// Begin a transaction directly on the pool
    pub(crate) async fn begin(&self) -> Result<DatabaseTransaction, FrameworkError> {
        Ok(self.inner.begin().await?)
    }

    /// Close the pool
    ///
    /// Only the last handle actually closes it; earlier calls just release
    /// this handle and return `Ok`.
    pub async fn dispose(self) -> Result<(), FrameworkError> {
        match Arc::try_unwrap(self.inner) {
            Ok(conn) => {
                conn.close().await?;
                tracing::info!("database engine disposed");
            }
            Err(_) => tracing::debug!("engine handle released, pool still shared"),
        }
        Ok(())
    }
}

/// Mask the password of a URL; unparsable URLs are masked entirely
fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.into()
        }
        Ok(parsed) => parsed.into(),
        Err(_) => match url.split_once("://") {
            Some((scheme, _)) => format!("{}://***", scheme),
            None => "***".to_string(),
        },
    }
}

/// Replace the URL, and its password if one can be found, in a driver message
fn redact_error(message: &str, url: &str, display_url: &str) -> String {
    let message = message.replace(url, display_url);
    let password = Url::parse(url)
        .ok()
        .and_then(|u| u.password().map(str::to_string))
        .filter(|p| !p.is_empty());
    match password {
        Some(password) => message.replace(&password, "***"),
        None => message,
    }
}

impl AsRef<DatabaseConnection> for Engine {
    fn as_ref(&self) -> &DatabaseConnection {
        &self.inner
    }
}

impl std::ops::Deref for Engine {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("backend", &self.backend())
            .field("echo", &self.echo)
            .finish()
    }
}
