//! Repository factory for dependency injection.
//!
//! Builds the `Arc<dyn FullRepository>` handed to the HTTP state, choosing
//! the backend from a `repository.toml` file or from environment variables.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::RepositoryConfig;
#[cfg(feature = "local-repo")]
use super::repositories::LocalRepository;
#[cfg(feature = "sqlite-repo")]
use super::repositories::{SqliteConfig, SqliteRepository};
use super::repository::{FullRepository, RepositoryError, RepositoryResult};

/// Storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// SQLite file via Diesel
    Sqlite,
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("sqlite", "local").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Backend used when nothing is configured.
    pub fn default_for_build() -> Self {
        if cfg!(feature = "sqlite-repo") {
            Self::Sqlite
        } else {
            Self::Local
        }
    }

    /// Read `REPOSITORY_TYPE`, falling back to [`RepositoryType::default_for_build`].
    ///
    /// # Errors
    /// Returns an error if the variable is set to an unknown value.
    pub fn from_env() -> Result<Self, String> {
        match std::env::var("REPOSITORY_TYPE") {
            Ok(val) if !val.trim().is_empty() => val.parse(),
            _ => Ok(Self::default_for_build()),
        }
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```ignore
/// use math_service::db::{RepositoryFactory, RepositoryType, SqliteConfig};
///
/// let config = SqliteConfig::with_url("data/calculations.db");
/// let repo = RepositoryFactory::create(RepositoryType::Sqlite, Some(&config)).await?;
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    ///
    /// # Arguments
    /// * `repo_type` - Type of repository to create
    /// * `sqlite_config` - SQLite settings; defaults apply when `None`
    pub async fn create(
        repo_type: RepositoryType,
        #[cfg(feature = "sqlite-repo")] sqlite_config: Option<&SqliteConfig>,
        #[cfg(not(feature = "sqlite-repo"))] sqlite_config: Option<&()>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Sqlite => {
                #[cfg(feature = "sqlite-repo")]
                {
                    let config = sqlite_config.cloned().unwrap_or_default();
                    let repo = Self::create_sqlite(config).await?;
                    Ok(repo as Arc<dyn FullRepository>)
                }
                #[cfg(not(feature = "sqlite-repo"))]
                {
                    let _ = sqlite_config;
                    Err(RepositoryError::configuration(
                        "SQLite repository feature not enabled",
                    ))
                }
            }
            RepositoryType::Local => Self::create_local(),
        }
    }

    /// Open a SQLite repository off the async runtime.
    #[cfg(feature = "sqlite-repo")]
    pub async fn create_sqlite(config: SqliteConfig) -> RepositoryResult<Arc<SqliteRepository>> {
        let repo = tokio::task::spawn_blocking(move || SqliteRepository::new(config))
            .await
            .map_err(|e| RepositoryError::internal(format!("Task join error: {}", e)))??;
        Ok(Arc::new(repo))
    }

    /// Create an in-memory local repository.
    pub fn create_local() -> RepositoryResult<Arc<dyn FullRepository>> {
        #[cfg(feature = "local-repo")]
        {
            Ok(Arc::new(LocalRepository::new()))
        }
        #[cfg(not(feature = "local-repo"))]
        {
            Err(RepositoryError::configuration(
                "Local repository feature not enabled",
            ))
        }
    }

    /// Create repository from environment configuration.
    ///
    /// Reads `REPOSITORY_TYPE` and, for SQLite, the `DATABASE_URL` and
    /// `SQLITE_*` variables.
    pub async fn from_env() -> RepositoryResult<Arc<dyn FullRepository>> {
        RepositoryBuilder::new().from_env()?.build().await
    }

    /// Create repository from a TOML configuration file.
    pub async fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        RepositoryBuilder::new()
            .from_config_file(config_path)?
            .build()
            .await
    }

    /// Create repository from `repository.toml` in a standard location,
    /// or from the environment when no file exists.
    pub async fn from_default_config() -> RepositoryResult<Arc<dyn FullRepository>> {
        match RepositoryConfig::find_default_location() {
            Some(path) => {
                log::info!("Loading repository configuration from {}", path.display());
                Self::from_config_file(path).await
            }
            None => Self::from_env().await,
        }
    }
}

/// Builder for configuring repository creation.
///
/// # Example
/// ```ignore
/// use math_service::db::{RepositoryBuilder, RepositoryType};
///
/// let repo = RepositoryBuilder::new()
///     .repository_type(RepositoryType::Local)
///     .build()
///     .await?;
/// ```
pub struct RepositoryBuilder {
    repo_type: RepositoryType,
    #[cfg(feature = "sqlite-repo")]
    sqlite_config: Option<SqliteConfig>,
}

impl RepositoryBuilder {
    /// Create a new builder targeting the default backend.
    pub fn new() -> Self {
        Self {
            repo_type: RepositoryType::default_for_build(),
            #[cfg(feature = "sqlite-repo")]
            sqlite_config: None,
        }
    }

    /// Set the repository type.
    pub fn repository_type(mut self, repo_type: RepositoryType) -> Self {
        self.repo_type = repo_type;
        self
    }

    /// Set the SQLite configuration.
    #[cfg(feature = "sqlite-repo")]
    pub fn sqlite_config(mut self, config: SqliteConfig) -> Self {
        self.sqlite_config = Some(config);
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env(mut self) -> RepositoryResult<Self> {
        self.repo_type = RepositoryType::from_env().map_err(RepositoryError::configuration)?;

        #[cfg(feature = "sqlite-repo")]
        if self.repo_type == RepositoryType::Sqlite {
            self.sqlite_config =
                Some(SqliteConfig::from_env().map_err(RepositoryError::configuration)?);
        }

        Ok(self)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(Self)` - Builder with loaded configuration
    /// * `Err(RepositoryError)` - If file cannot be read or parsed
    pub fn from_config_file<P: AsRef<Path>>(mut self, config_path: P) -> RepositoryResult<Self> {
        let repo_config = RepositoryConfig::from_file(config_path)?;
        self.repo_type = repo_config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;

        #[cfg(feature = "sqlite-repo")]
        {
            self.sqlite_config = repo_config.to_sqlite_config()?;
        }

        Ok(self)
    }

    /// Build the repository instance.
    pub async fn build(self) -> RepositoryResult<Arc<dyn FullRepository>> {
        #[cfg(feature = "sqlite-repo")]
        let sqlite_config = self.sqlite_config.as_ref();
        #[cfg(not(feature = "sqlite-repo"))]
        let sqlite_config = None;

        log::debug!("Building {:?} repository", self.repo_type);
        RepositoryFactory::create(self.repo_type, sqlite_config).await
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_type_from_str() {
        assert_eq!(
            RepositoryType::from_str("local").unwrap(),
            RepositoryType::Local
        );
        assert_eq!(
            RepositoryType::from_str("SQLite").unwrap(),
            RepositoryType::Sqlite
        );
        assert!(RepositoryType::from_str("postgres").is_err());
    }

    #[cfg(feature = "local-repo")]
    #[tokio::test]
    async fn test_builder_local_repository() {
        let repo = RepositoryBuilder::new()
            .repository_type(RepositoryType::Local)
            .build()
            .await
            .unwrap();

        assert!(repo.health_check().await.unwrap());
        assert_eq!(repo.count_calculations().await.unwrap(), 0);
    }

    #[cfg(feature = "sqlite-repo")]
    #[tokio::test]
    async fn test_create_sqlite_in_memory() {
        let config = SqliteConfig::with_url(":memory:");
        let repo = RepositoryFactory::create(RepositoryType::Sqlite, Some(&config))
            .await
            .unwrap();
        assert!(repo.health_check().await.unwrap());
    }
}
