//! Calculation storage.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  Request pipeline / HTTP handlers                    │
//! └───────────────────┬──────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────┐
//! │  Service Layer (services.rs)                         │
//! │  - logging policy for storage calls                  │
//! └───────────────────┬──────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────┐
//! │  Repository Traits (repository/)                     │
//! └───────────────────┬──────────────────────────────────┘
//!                     │
//!          ┌──────────┴──────────┐
//!          ▼                     ▼
//!   SqliteRepository      LocalRepository
//!   (Diesel + r2d2)       (in-memory)
//! ```
//!
//! The binary builds one repository through [`RepositoryFactory`] and passes
//! the resulting `Arc<dyn FullRepository>` down explicitly.

#[cfg(not(any(feature = "sqlite-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
#[cfg(feature = "local-repo")]
pub use repositories::LocalRepository;
#[cfg(feature = "sqlite-repo")]
pub use repositories::{SqliteConfig, SqliteRepository};
pub use repository::{
    CalculationRepository, ErrorContext, FullRepository, RepositoryError, RepositoryResult,
    StatisticsRepository,
};
