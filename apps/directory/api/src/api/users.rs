use axum::Router;
use domain_users::{handlers, UserService};

use crate::state::{AppState, UserBackend};

pub fn router(state: &AppState) -> Router {
    match &state.users {
        UserBackend::Memory(repository) => handlers::router(UserService::new(repository.clone())),
        UserBackend::Postgres(repository) => handlers::router(UserService::new(repository.clone())),
    }
}
