//! Registration, login and token verification.

use chrono::Duration;
use db::models::user::User;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use utils::jwt::{self, Claims, TokenError};
use uuid::Uuid;

/// Session lifetime for issued tokens.
const SESSION_TTL_DAYS: i64 = 30;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("email already registered")]
    EmailTaken,
    #[error("username already taken")]
    UsernameTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Token(#[from] TokenError),
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    /// Register a new account. The password is bcrypt-hashed off the async
    /// runtime since hashing is deliberately slow.
    pub async fn register(
        &self,
        pool: &SqlitePool,
        request: &RegisterRequest,
    ) -> Result<User, AuthError> {
        if User::find_by_email(pool, &request.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password = request.password.clone();
        let password_hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| AuthError::Hash(e.to_string()))?
                .map_err(|e| AuthError::Hash(e.to_string()))?;

        let user = User::create(
            pool,
            Uuid::new_v4(),
            &request.email,
            request.username.as_deref(),
            &password_hash,
        )
        .await
        .map_err(|err| {
            // Email existence was checked above, so a unique violation here
            // can only be the username (or a concurrent email registration).
            if err
                .as_database_error()
                .is_some_and(|e| e.is_unique_violation())
            {
                AuthError::UsernameTaken
            } else {
                AuthError::Database(err)
            }
        })?;

        info!(user_id = %user.id, "registered new user");
        Ok(user)
    }

    /// Check credentials and issue a session token.
    pub async fn login(
        &self,
        pool: &SqlitePool,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AuthError> {
        let user = User::find_by_email(pool, email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let token = jwt::sign(
            self.jwt_secret.as_bytes(),
            user.id,
            &user.email,
            Duration::days(SESSION_TTL_DAYS),
        )?;
        Ok((user, token))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        jwt::verify(self.jwt_secret.as_bytes(), token)
    }
}

#[cfg(test)]
mod tests {
    use db::DBService;

    use super::*;

    fn service() -> AuthService {
        AuthService::new("test-secret".to_string())
    }

    #[tokio::test]
    async fn register_then_login_issues_verifiable_token() {
        let db = DBService::new_in_memory().await.unwrap();
        let auth = service();

        let user = auth
            .register(
                &db.pool,
                &RegisterRequest {
                    email: "ana@example.com".to_string(),
                    password: "s3creta".to_string(),
                    username: Some("ana".to_string()),
                },
            )
            .await
            .unwrap();
        assert_ne!(user.password_hash, "s3creta");

        let (logged_in, token) = auth
            .login(&db.pool, "ana@example.com", "s3creta")
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);

        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "ana@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let db = DBService::new_in_memory().await.unwrap();
        let auth = service();
        let request = RegisterRequest {
            email: "ana@example.com".to_string(),
            password: "s3creta".to_string(),
            username: None,
        };
        auth.register(&db.pool, &request).await.unwrap();
        assert!(matches!(
            auth.register(&db.pool, &request).await,
            Err(AuthError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let db = DBService::new_in_memory().await.unwrap();
        let auth = service();
        auth.register(
            &db.pool,
            &RegisterRequest {
                email: "ana@example.com".to_string(),
                password: "s3creta".to_string(),
                username: Some("ana".to_string()),
            },
        )
        .await
        .unwrap();
        let result = auth
            .register(
                &db.pool,
                &RegisterRequest {
                    email: "otra@example.com".to_string(),
                    password: "s3creta".to_string(),
                    username: Some("ana".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(AuthError::UsernameTaken)));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_both_invalid() {
        let db = DBService::new_in_memory().await.unwrap();
        let auth = service();
        auth.register(
            &db.pool,
            &RegisterRequest {
                email: "ana@example.com".to_string(),
                password: "s3creta".to_string(),
                username: None,
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            auth.login(&db.pool, "ana@example.com", "mal").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login(&db.pool, "nadie@example.com", "s3creta").await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
