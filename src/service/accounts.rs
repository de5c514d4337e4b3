//! Registration, login and token handling.

use std::sync::Arc;

use chrono::Utc;

use super::{BLANK_MESSAGE, ServiceError};
use crate::domain::{FieldError, NewUser, User, UserId, ValidationError};
use crate::infrastructure::{
    RepositoryError, TokenKind, TokenPair, TokenSigner, UserRepository, hash_password,
    verify_dummy_password, verify_password,
};

const MAX_USERNAME_LENGTH: usize = 150;
const MAX_EMAIL_LENGTH: usize = 254;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

/// Input for [`AccountService::register`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterInput {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    /// Confirmation; checked only when supplied.
    pub password2: Option<String>,
}

/// A newly registered user and its first token pair.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub tokens: TokenPair,
}

fn is_username_char(character: char) -> bool {
    character.is_alphanumeric() || matches!(character, '@' | '.' | '+' | '-' | '_')
}

fn validate_registration(
    input: &RegisterInput,
) -> Result<(String, Option<String>), ValidationError> {
    let mut errors = Vec::new();

    let username = input.username.trim().to_string();
    if username.is_empty() {
        errors.push(FieldError::new("username", BLANK_MESSAGE));
    } else if username.chars().count() > MAX_USERNAME_LENGTH {
        errors.push(FieldError::new(
            "username",
            format!("Ensure this field has no more than {MAX_USERNAME_LENGTH} characters."),
        ));
    } else if !username.chars().all(is_username_char) {
        errors.push(FieldError::new(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }

    let email = input
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string);
    if email
        .as_ref()
        .is_some_and(|email| !email.contains('@') || email.chars().count() > MAX_EMAIL_LENGTH)
    {
        errors.push(FieldError::new("email", "Enter a valid email address."));
    }

    let password_length = input.password.chars().count();
    if password_length < MIN_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            format!("Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."),
        ));
    } else if password_length > MAX_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            format!("Ensure this field has no more than {MAX_PASSWORD_LENGTH} characters."),
        ));
    }
    if input
        .password2
        .as_ref()
        .is_some_and(|confirmation| *confirmation != input.password)
    {
        errors.push(FieldError::new("password2", "Password fields didn't match."));
    }

    ValidationError::new(errors).into_result()?;
    Ok((username, email))
}

/// Service for user accounts and bearer tokens.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository + Send + Sync>,
    signer: TokenSigner,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AccountService")
            .field("users", &"Arc<dyn UserRepository>")
            .field("signer", &self.signer)
            .finish()
    }
}

impl AccountService {
    /// Creates a service over the given user repository and signer.
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository + Send + Sync>, signer: TokenSigner) -> Self {
        Self { users, signer }
    }

    /// Registers a user and issues its first token pair.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for invalid input or a taken username.
    pub async fn register(&self, input: RegisterInput) -> Result<Registration, ServiceError> {
        let (username, email) = validate_registration(&input)?;
        let password_hash = hash_password(input.password).await?;

        let user = self
            .users
            .create(NewUser {
                username,
                email,
                password_hash,
            })
            .await
            .map_err(|error| match error {
                RepositoryError::Conflict(_) => ServiceError::Validation(ValidationError::single(
                    "username",
                    "A user with that username already exists.",
                )),
                other => ServiceError::Repository(other),
            })?;

        let tokens = self.signer.issue_pair(user.user_id, Utc::now())?;
        tracing::info!(user_id = %user.user_id, "User registered");
        Ok(Registration { user, tokens })
    }

    /// Exchanges a username and password for a token pair.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Authentication` with the same message for an
    /// unknown user and a wrong password.
    pub async fn login(
        &self,
        username: &str,
        password: String,
    ) -> Result<TokenPair, ServiceError> {
        let Some(user) = self.users.find_by_username(username).await? else {
            verify_dummy_password(password).await?;
            tracing::debug!("Login rejected: unknown user");
            return Err(ServiceError::Authentication(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(password, user.password_hash).await? {
            tracing::debug!(user_id = %user.user_id, "Login rejected: wrong password");
            return Err(ServiceError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        tracing::info!(user_id = %user.user_id, "User logged in");
        Ok(self.signer.issue_pair(user.user_id, Utc::now())?)
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Authentication` if the token is invalid, is not a
    /// refresh token, or its user no longer exists.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, ServiceError> {
        let claims = self.signer.verify(refresh_token, TokenKind::Refresh)?;
        let user = self.require_user(claims.user_id()).await?;
        Ok(self.signer.issue(user.user_id, TokenKind::Access, Utc::now())?)
    }

    /// Resolves an access token to its user.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Authentication` if the token is invalid, is not an
    /// access token, or its user no longer exists.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, ServiceError> {
        let claims = self.signer.verify(access_token, TokenKind::Access)?;
        self.require_user(claims.user_id()).await
    }

    /// Returns the user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user no longer exists.
    pub async fn profile(&self, user_id: UserId) -> Result<User, ServiceError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {user_id}")))
    }

    /// Deletes the user with all of their tasks and done entries.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user no longer exists.
    pub async fn delete_account(&self, user_id: UserId) -> Result<(), ServiceError> {
        if !self.users.delete(user_id).await? {
            return Err(ServiceError::NotFound(format!("User {user_id}")));
        }
        tracing::info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    async fn require_user(&self, user_id: UserId) -> Result<User, ServiceError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::Authentication("User not found".to_string()))
    }
}
