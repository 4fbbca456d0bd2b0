use std::path::{Path, PathBuf};

/// Deployment environment, selected through `APP_ENV`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Local,
    Development,
    Staging,
    Production,
    Testing,
    Custom(String),
}

impl Environment {
    /// Detect environment from APP_ENV or default to Local
    pub fn detect() -> Self {
        Self::parse(std::env::var("APP_ENV").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("production") => Self::Production,
            Some("staging") => Self::Staging,
            Some("development") => Self::Development,
            Some("testing") => Self::Testing,
            Some("local") | Some("") | None => Self::Local,
            Some(other) => Self::Custom(other.to_string()),
        }
    }

    /// Name used in `.env.{name}` file suffixes
    pub fn as_str(&self) -> &str {
        match self {
            Self::Local => "local",
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
            Self::Testing => "testing",
            Self::Custom(name) => name.as_str(),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Local or development
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Local | Self::Development)
    }

    /// Candidate `.env` files, most specific first
    ///
    /// dotenvy never overwrites a variable that is already set, so loading in
    /// this order gives later (less specific) files the lowest priority and
    /// the real process environment the highest.
    pub fn dotenv_files(&self, project_root: &Path) -> Vec<PathBuf> {
        let suffix = self.as_str();
        let mut files = vec![
            project_root.join(format!(".env.{}.local", suffix)),
            project_root.join(format!(".env.{}", suffix)),
        ];
        // For Local the second entry already is .env.local
        if *self != Self::Local {
            files.push(project_root.join(".env.local"));
        }
        files.push(project_root.join(".env"));
        files
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load `.env` files for the detected environment
///
/// Missing files are skipped silently. Variables already present in the
/// process environment are never overridden.
pub fn load_dotenv(project_root: &Path) -> Environment {
    let env = Environment::detect();

    for path in env.dotenv_files(project_root) {
        match dotenvy::from_path(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "loaded env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to load env file"),
        }
    }

    env
}

/// Get an environment variable with a default value
///
/// # Example
/// ```
/// use datalayer::config::env;
///
/// let level: u8 = env("DB_LOG_LEVEL", 2);
/// ```
pub fn env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_optional(key).unwrap_or(default)
}

/// Get an optional environment variable, `None` if unset or unparsable
pub fn env_optional<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
