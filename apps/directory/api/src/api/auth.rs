use axum::Router;
use domain_users::{auth_handlers, UserService};

use crate::state::{AppState, UserBackend};

/// Registration and login over the same repository as `/users`
pub fn router(state: &AppState) -> Router {
    match &state.users {
        UserBackend::Memory(repository) => {
            auth_handlers::router(UserService::new(repository.clone()))
        }
        UserBackend::Postgres(repository) => {
            auth_handlers::router(UserService::new(repository.clone()))
        }
    }
}
