//! Account lifecycle: signup, activation, sign-in and profile edits.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use inkwell_common::{AppError, AppResult, IdGenerator};
use inkwell_db::{entities::user, repositories::UserRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::services::mailer::{MailerService, OutgoingMail};

/// Input for creating a new account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[validate(length(min = 3, max = 32), custom(function = "validate_username"))]
    pub username: String,

    #[validate(email, length(max = 320))]
    pub email: String,

    #[validate(length(min = 7, max = 20), custom(function = "validate_phone"))]
    pub phone: String,

    #[validate(length(min = 1, max = 64))]
    pub name: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for editing one's own profile. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,

    #[validate(length(max = 2048))]
    pub bio: Option<String>,

    pub is_private: Option<bool>,

    /// Public URL returned by object storage.
    #[validate(length(max = 1024))]
    pub avatar_url: Option<String>,

    /// Opaque deletion handle returned by object storage.
    #[validate(length(max = 256))]
    pub avatar_handle: Option<String>,
}

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    mailer: MailerService,
    id_gen: IdGenerator,
    server_url: String,
    activation_ttl: Duration,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        mailer: MailerService,
        server_url: String,
        activation_ttl_hours: i64,
    ) -> Self {
        Self {
            user_repo,
            mailer,
            id_gen: IdGenerator::new(),
            server_url,
            activation_ttl: Duration::hours(activation_ttl_hours),
        }
    }

    /// Register an inactive account and mail its activation link.
    pub async fn signup(&self, input: SignupInput) -> AppResult<user::Model> {
        input.validate()?;

        let email = input.email.to_lowercase();
        if let Some(existing) = self
            .user_repo
            .find_conflicting(&input.username, &email, &input.phone)
            .await?
        {
            let field = if existing.username_lower == input.username.to_lowercase() {
                "Username"
            } else if existing.email == email {
                "Email"
            } else {
                "Phone number"
            };
            return Err(AppError::Conflict(format!("{field} already registered")));
        }

        let password_hash = hash_password(&input.password)?;
        let activation_token = self.id_gen.generate_token();
        let now = Utc::now();

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            email: Set(email),
            phone: Set(input.phone),
            name: Set(input.name),
            password_hash: Set(password_hash),
            token: Set(None),
            is_active: Set(false),
            is_private: Set(false),
            activation_token: Set(Some(activation_token.clone())),
            activation_expires_at: Set(Some((now + self.activation_ttl).into())),
            bio: Set(None),
            avatar_url: Set(None),
            avatar_handle: Set(None),
            posts_count: Set(0),
            followers_count: Set(0),
            following_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Created account");

        self.send_activation_mail(&user, &activation_token);
        Ok(user)
    }

    /// Activate an account. The token works once.
    pub async fn activate(&self, token: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_activation_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Activation token".to_string()))?;

        let expired = user
            .activation_expires_at
            .is_none_or(|expires_at| expires_at < Utc::now());
        if expired {
            return Err(AppError::BadRequest("Activation link has expired".to_string()));
        }

        let bearer = self.id_gen.generate_token();
        let user = self.user_repo.activate(user, bearer).await?;

        tracing::info!(user_id = %user.id, "Activated account");
        Ok(user)
    }

    /// Sign in with a handle or email address.
    ///
    /// The returned model carries the bearer token.
    pub async fn signin(&self, login: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_login(login)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        if !user.is_active {
            return Err(AppError::Forbidden("Account is not activated".to_string()));
        }

        if user.token.is_some() {
            return Ok(user);
        }

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(self.id_gen.generate_token()));
        self.user_repo.update(active).await
    }

    /// Resolve a bearer token to an active account.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Unauthorized)
    }

    /// Get an account by ID.
    pub async fn get(&self, user_id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(user_id).await
    }

    /// Edit one's own profile.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio).filter(|b| !b.is_empty()));
        }
        if let Some(is_private) = input.is_private {
            // Pending requests stay pending when an account goes public
            active.is_private = Set(is_private);
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(Some(avatar_url).filter(|u| !u.is_empty()));
        }
        if let Some(avatar_handle) = input.avatar_handle {
            active.avatar_handle = Set(Some(avatar_handle).filter(|h| !h.is_empty()));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Hand the activation link to the mailer without waiting on delivery.
    fn send_activation_mail(&self, user: &user::Model, token: &str) {
        let mail = OutgoingMail {
            to: user.email.clone(),
            subject: "Activate your Inkwell account".to_string(),
            body: format!(
                "Hi {},\n\nFollow this link within {} hours to activate your account:\n{}/activate/{}\n",
                user.display_name(),
                self.activation_ttl.num_hours(),
                self.server_url.trim_end_matches('/'),
                token
            ),
        };

        let mailer = self.mailer.clone();
        let user_id = user.id.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send(mail).await {
                tracing::warn!(error = %e, user_id = %user_id, "Failed to send activation email");
            }
        });
    }
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset"))
    }
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("phone_format"))
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
