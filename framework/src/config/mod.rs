//! Environment handling
//!
//! Loads `.env` files with environment-based precedence and provides typed
//! lookups. Configuration structs (see [`crate::DatabaseConfig`]) are built
//! from here once at startup and then passed around explicitly.
//!
//! # Example
//!
//! ```rust,no_run
//! use datalayer::config;
//!
//! let env = config::load_dotenv(std::path::Path::new("."));
//! println!("Running in {} environment", env);
//! ```

pub mod env;

pub use env::{env, env_optional, load_dotenv, Environment};
