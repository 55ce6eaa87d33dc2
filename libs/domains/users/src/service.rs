use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{
    CreateUser, NewUser, RegisterRequest, Role, UpdateUser, User, UserFilter, UserResponse,
};
use crate::password::{hash_password, verify_dummy, verify_password};
use crate::repository::UserRepository;
use crate::validation::{check_password_strength, normalize_email};

/// Service layer for the user lifecycle
#[derive(Clone)]
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a user with a hashed password.
    ///
    /// Checks run in order: field rules, password strength, email availability.
    pub async fn create_user(&self, input: CreateUser) -> UserResult<UserResponse> {
        input.validate()?;
        ensure_strong(&input.password)?;

        if self.repository.email_exists(&input.email, None).await? {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let password_hash = hash_password(&input.password)?;
        let now = Utc::now();

        let created = self
            .repository
            .create(NewUser {
                first_name: input.first_name,
                last_name: input.last_name,
                email: input.email,
                password_hash,
                roles: Role::parse_set(&input.roles),
                date_of_birth: input.date_of_birth,
                phone_number: input.phone_number,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(user_id = created.id, "User created");
        Ok(created.into())
    }

    /// Self-service sign-up, always with the default role
    pub async fn register(&self, input: RegisterRequest) -> UserResult<UserResponse> {
        self.create_user(input.into()).await
    }

    /// All users in id order
    pub async fn list_users(&self) -> UserResult<Vec<UserResponse>> {
        self.list(UserFilter::default()).await
    }

    pub async fn list_users_by_status(&self, is_active: bool) -> UserResult<Vec<UserResponse>> {
        self.list(UserFilter::active(is_active)).await
    }

    pub async fn list(&self, filter: UserFilter) -> UserResult<Vec<UserResponse>> {
        let users = self.repository.list(filter).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn get_user(&self, id: i64) -> UserResult<UserResponse> {
        Ok(self.fetch(id).await?.into())
    }

    /// Case-insensitive lookup; `None` when no user holds the email
    pub async fn find_by_email(&self, email: &str) -> UserResult<Option<UserResponse>> {
        let user = self.repository.get_by_email(email).await?;
        Ok(user.map(UserResponse::from))
    }

    /// Lookup returning the full record, password hash included.
    ///
    /// Only for credential checks; never expose the result over HTTP.
    pub async fn find_by_email_for_auth(&self, email: &str) -> UserResult<Option<User>> {
        self.repository.get_by_email(email).await
    }

    /// Apply a partial update; a new password is re-hashed.
    pub async fn update_user(&self, id: i64, mut input: UpdateUser) -> UserResult<UserResponse> {
        input.validate()?;

        let mut user = self.fetch(id).await?;

        let new_password_hash = match input.password.take() {
            Some(password) => {
                ensure_strong(&password)?;
                Some(hash_password(&password)?)
            }
            None => None,
        };

        if let Some(new_email) = &input.email {
            let changed = normalize_email(new_email) != normalize_email(&user.email);
            if changed && self.repository.email_exists(new_email, Some(id)).await? {
                return Err(UserError::DuplicateEmail(new_email.clone()));
            }
        }

        user.apply_update(input);
        if let Some(password_hash) = new_password_hash {
            user.password_hash = password_hash;
        }
        user.touch();

        let updated = self.repository.update(user).await?;
        info!(user_id = id, "User updated");
        Ok(updated.into())
    }

    pub async fn delete_user(&self, id: i64) -> UserResult<()> {
        if self.repository.delete(id).await? == 0 {
            return Err(UserError::NotFound(id));
        }

        info!(user_id = id, "User deleted");
        Ok(())
    }

    pub async fn activate_user(&self, id: i64) -> UserResult<UserResponse> {
        self.set_active(id, true).await
    }

    pub async fn deactivate_user(&self, id: i64) -> UserResult<UserResponse> {
        self.set_active(id, false).await
    }

    /// Check an email/password pair.
    ///
    /// Unknown emails and wrong passwords fail identically.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> UserResult<UserResponse> {
        let Some(user) = self.find_by_email_for_auth(email).await? else {
            verify_dummy(password);
            warn!("Login attempt for unknown email");
            return Err(UserError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = user.id, "Login attempt with wrong password");
            return Err(UserError::InvalidCredentials);
        }

        if !user.is_active {
            warn!(user_id = user.id, "Login attempt on inactive account");
            return Err(UserError::AccountInactive);
        }

        Ok(user.into())
    }

    async fn fetch(&self, id: i64) -> UserResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn set_active(&self, id: i64, is_active: bool) -> UserResult<UserResponse> {
        let mut user = self.fetch(id).await?;
        user.is_active = is_active;
        user.touch();

        let updated = self.repository.update(user).await?;
        info!(user_id = id, is_active, "User status changed");
        Ok(updated.into())
    }
}

fn ensure_strong(password: &str) -> UserResult<()> {
    check_password_strength(password).map_err(UserError::WeakPassword)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;
    use crate::validation::PasswordRequirement;
    use mockall::predicate::eq;

    const STRONG_PASSWORD: &str = "SecurePass123!";

    fn create_input(email: &str, password: &str) -> CreateUser {
        CreateUser {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            roles: vec![],
            date_of_birth: None,
            phone_number: None,
        }
    }

    fn stored_user(id: i64, email: &str, password: &str) -> User {
        let now = Utc::now();
        User {
            id,
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            roles: vec![Role::User],
            date_of_birth: None,
            phone_number: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_user_hashes_password_and_defaults_roles() {
        let mut mock = MockUserRepository::new();
        mock.expect_email_exists()
            .withf(|email, exclude| email == "john@example.com" && exclude.is_none())
            .times(1)
            .returning(|_, _| Ok(false));
        mock.expect_create()
            .withf(|user| {
                user.password_hash.starts_with("$argon2")
                    && user.roles == vec![Role::User]
                    && user.is_active
                    && user.created_at == user.updated_at
            })
            .times(1)
            .returning(|user| Ok(user.into_user(1)));

        let service = UserService::new(mock);
        let created = service
            .create_user(create_input("john@example.com", STRONG_PASSWORD))
            .await
            .unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.roles, vec![Role::User]);
    }

    #[tokio::test]
    async fn test_create_user_rejects_weak_password_before_touching_store() {
        let mock = MockUserRepository::new();
        let service = UserService::new(mock);

        let err = service
            .create_user(create_input("john@example.com", "weak"))
            .await
            .unwrap_err();

        match err {
            UserError::WeakPassword(unmet) => {
                assert!(unmet.contains(&PasswordRequirement::MinLength));
                assert!(unmet.contains(&PasswordRequirement::Uppercase));
                assert!(unmet.contains(&PasswordRequirement::Digit));
                assert!(unmet.contains(&PasswordRequirement::Symbol));
                assert!(!unmet.contains(&PasswordRequirement::Lowercase));
            }
            other => panic!("expected WeakPassword, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_user_field_rules_come_first() {
        let service = UserService::new(MockUserRepository::new());

        let mut input = create_input("not-an-email", "weak");
        input.first_name = "J".to_string();

        let err = service.create_user(input).await.unwrap_err();
        let UserError::Validation(errors) = err else {
            panic!("expected Validation, got {err:?}");
        };
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("first_name"));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let mut mock = MockUserRepository::new();
        mock.expect_email_exists().returning(|_, _| Ok(true));
        mock.expect_create().never();

        let service = UserService::new(mock);
        let err = service
            .create_user(create_input("john@example.com", STRONG_PASSWORD))
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::DuplicateEmail(email) if email == "john@example.com"));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_id()
            .with(eq(42))
            .returning(|_| Ok(None));

        let service = UserService::new(mock);
        let err = service.get_user(42).await.unwrap_err();
        assert!(matches!(err, UserError::NotFound(42)));
    }

    #[tokio::test]
    async fn test_update_user_same_email_different_case_skips_uniqueness_check() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_id()
            .returning(|id| Ok(Some(stored_user(id, "john@example.com", STRONG_PASSWORD))));
        mock.expect_email_exists().never();
        mock.expect_update().returning(Ok);

        let service = UserService::new(mock);
        let updated = service
            .update_user(
                1,
                UpdateUser {
                    email: Some("John@Example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, "John@Example.com");
    }

    #[tokio::test]
    async fn test_update_user_rejects_email_held_by_other() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_id()
            .returning(|id| Ok(Some(stored_user(id, "john@example.com", STRONG_PASSWORD))));
        mock.expect_email_exists()
            .withf(|email, exclude| email == "jane@example.com" && *exclude == Some(1))
            .returning(|_, _| Ok(true));
        mock.expect_update().never();

        let service = UserService::new(mock);
        let err = service
            .update_user(
                1,
                UpdateUser {
                    email: Some("jane@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn test_update_user_rehashes_password() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_id()
            .returning(|id| Ok(Some(stored_user(id, "john@example.com", STRONG_PASSWORD))));
        mock.expect_update()
            .withf(|user| verify_password("NewSecret456?", &user.password_hash).unwrap())
            .times(1)
            .returning(Ok);

        let service = UserService::new(mock);
        service
            .update_user(
                1,
                UpdateUser {
                    password: Some("NewSecret456?".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_user_weak_password() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_id()
            .returning(|id| Ok(Some(stored_user(id, "john@example.com", STRONG_PASSWORD))));
        mock.expect_update().never();

        let service = UserService::new(mock);
        let err = service
            .update_user(
                1,
                UpdateUser {
                    password: Some("alllowercase".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::WeakPassword(_)));
    }

    #[tokio::test]
    async fn test_delete_user_not_found_when_nothing_deleted() {
        let mut mock = MockUserRepository::new();
        mock.expect_delete().with(eq(9)).returning(|_| Ok(0));

        let service = UserService::new(mock);
        assert!(matches!(
            service.delete_user(9).await,
            Err(UserError::NotFound(9))
        ));
    }

    #[tokio::test]
    async fn test_deactivate_user_sets_flag_and_touches() {
        let mut mock = MockUserRepository::new();
        let original = stored_user(3, "john@example.com", STRONG_PASSWORD);
        let before = original.updated_at;
        mock.expect_get_by_id()
            .returning(move |_| Ok(Some(original.clone())));
        mock.expect_update()
            .withf(move |user| !user.is_active && user.updated_at >= before)
            .returning(Ok);

        let service = UserService::new(mock);
        let response = service.deactivate_user(3).await.unwrap();
        assert!(!response.is_active);
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_email().returning(|email| {
            Ok((email == "john@example.com")
                .then(|| stored_user(1, "john@example.com", STRONG_PASSWORD)))
        });

        let service = UserService::new(mock);

        let user = service
            .verify_credentials("john@example.com", STRONG_PASSWORD)
            .await
            .unwrap();
        assert_eq!(user.id, 1);

        assert!(matches!(
            service.verify_credentials("john@example.com", "WrongPass1!").await,
            Err(UserError::InvalidCredentials)
        ));
        assert!(matches!(
            service.verify_credentials("nobody@example.com", STRONG_PASSWORD).await,
            Err(UserError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_verify_credentials_inactive_account() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_email().returning(|email| {
            let mut user = stored_user(1, email, STRONG_PASSWORD);
            user.is_active = false;
            Ok(Some(user))
        });

        let service = UserService::new(mock);
        assert!(matches!(
            service.verify_credentials("john@example.com", STRONG_PASSWORD).await,
            Err(UserError::AccountInactive)
        ));
    }
}
