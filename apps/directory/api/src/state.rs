//! Application state management.
//!
//! The state is built once in `main` and handed by reference to the route
//! builders, which construct one `UserService` per router over the shared
//! repository.

use domain_users::{InMemoryUserRepository, PgUserRepository};

/// The user repository selected by `USER_STORE`.
///
/// Both variants are cheap to clone and share their underlying storage.
#[derive(Clone)]
pub enum UserBackend {
    Memory(InMemoryUserRepository),
    Postgres(PgUserRepository),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    pub users: UserBackend,
    /// PostgreSQL pool, absent with the in-memory store
    pub db: Option<database::postgres::DatabaseConnection>,
}
