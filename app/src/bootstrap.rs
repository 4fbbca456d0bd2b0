//! Application bootstrap
//!
//! Sets up logging, loads `.env` files and builds the data layer. The
//! resulting [`DataLayer`] is owned by the caller and passed to whatever
//! needs database access.

use datalayer::{config, DataLayer, Environment, FrameworkError};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is not set; `sqlx` carries the statement echo
const DEFAULT_FILTER: &str = "dbctl=info,datalayer=info,sqlx=info";

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load `.env` files from `project_root` and build the data layer
pub async fn register(project_root: &Path) -> Result<(Environment, DataLayer), FrameworkError> {
    let env = config::load_dotenv(project_root);
    let data = DataLayer::from_env().await?;

    tracing::info!(
        environment = %env,
        url = %data.config().redacted_url(),
        models = ?data.base().tables(),
        "data layer ready"
    );

    Ok((env, data))
}
