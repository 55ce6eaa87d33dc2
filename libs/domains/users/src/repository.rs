use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, User, UserFilter};
use crate::validation::normalize_email;

/// Persistence for users.
///
/// Email lookups and uniqueness are case-insensitive. Implementations must reject
/// a second user with the same email even when the service's own check raced.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user, returning it with its newly assigned id
    async fn create(&self, user: NewUser) -> UserResult<User>;

    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>>;

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// Users matching `filter`, ordered by id
    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>>;

    /// Replace the stored record with the same id
    async fn update(&self, user: User) -> UserResult<User>;

    /// Delete by id, returning the number of rows removed
    async fn delete(&self, id: i64) -> UserResult<u64>;

    /// Whether any user other than `exclude_id` holds `email`
    async fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> UserResult<bool>;
}

#[derive(Debug, Default)]
struct Store {
    users: BTreeMap<i64, User>,
    last_id: i64,
}

impl Store {
    fn email_taken(&self, email: &str, exclude_id: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != exclude_id && same_email(&u.email, email))
    }
}

fn same_email(a: &str, b: &str) -> bool {
    normalize_email(a) == normalize_email(b)
}

/// Process-local store for development and tests.
///
/// Ids start at 1 and are never reused, even after deletion.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> UserResult<User> {
        let mut store = self.store.write().await;

        if store.email_taken(&user.email, None) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        store.last_id += 1;
        let user = user.into_user(store.last_id);
        store.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store
            .users
            .values()
            .find(|u| same_email(&u.email, email))
            .cloned())
    }

    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        let store = self.store.read().await;
        Ok(store
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect())
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let mut store = self.store.write().await;

        if !store.users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id));
        }
        if store.email_taken(&user.email, Some(user.id)) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: i64) -> UserResult<u64> {
        let mut store = self.store.write().await;
        Ok(u64::from(store.users.remove(&id).is_some()))
    }

    async fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> UserResult<bool> {
        let store = self.store.read().await;
        Ok(store.email_taken(email, exclude_id))
    }
}
