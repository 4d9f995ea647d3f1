use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, AuthError},
    models::{
        session::{Session, SessionRecord},
        user::{looks_like_email, normalize_email, User},
    },
};

/// Shortest password the provider accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Boundary to whatever verifies credentials and issues session tokens.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AppError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError>;
    async fn sign_out(&self, token: &str) -> Result<(), AppError>;
    /// Looks up a live session by token. Expired or unknown tokens give `None`.
    async fn resolve(&self, token: &str) -> Result<Option<Session>, AppError>;
}

#[derive(Clone)]
pub struct SqliteIdentity {
    db: DbPool,
    session_ttl_hours: i64,
}

impl SqliteIdentity {
    pub fn new(db: DbPool, session_ttl_hours: i64) -> Self {
        Self {
            db,
            session_ttl_hours,
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at, last_login_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create_session(&self, user: &User) -> Result<Session, AppError> {
        let now = Utc::now();
        let expires_at = Duration::try_hours(self.session_ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AppError::Other(anyhow::anyhow!(
                    "session ttl of {} hours is out of range",
                    self.session_ttl_hours
                ))
            })?;

        sqlx::query("DELETE FROM sessions WHERE expires_at IS NOT NULL AND expires_at <= ?")
            .bind(now)
            .execute(&self.db)
            .await?;

        let record = SessionRecord {
            id: Uuid::new_v4().simple().to_string(),
            user_id: user.id.clone(),
            created_at: now,
            last_seen_at: now,
            expires_at: Some(expires_at),
        };
        sqlx::query(
            "INSERT INTO sessions (id, user_id, created_at, last_seen_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(record.created_at)
        .bind(record.last_seen_at)
        .bind(record.expires_at)
        .execute(&self.db)
        .await?;

        Ok(Session {
            token: record.id,
            user_id: user.id.clone(),
            email: user.email.clone(),
            expires_at: record.expires_at,
        })
    }
}

#[async_trait]
impl IdentityService for SqliteIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let email = normalize_email(email);
        if !looks_like_email(&email) {
            return Err(AuthError::InvalidEmail.into());
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword.into());
        }
        if self.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::AccountExists.into());
        }

        let password_hash = hash_password(password)?;
        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            created_at: Utc::now(),
            last_login_at: Some(Utc::now()),
        };

        let inserted = sqlx::query(
            "INSERT INTO users (id, email, password_hash, created_at, last_login_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.last_login_at)
        .execute(&self.db)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(AuthError::AccountExists.into());
            }
            Err(err) => return Err(err.into()),
        }

        info!(user_id = %user.id, "account created");
        self.create_session(&user).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let email = normalize_email(email);
        let user = self
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(&user.id)
            .execute(&self.db)
            .await?;

        info!(user_id = %user.id, "signed in");
        self.create_session(&user).await
    }

    async fn sign_out(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn resolve(&self, token: &str) -> Result<Option<Session>, AppError> {
        let row = sqlx::query(
            r#"SELECT s.id, s.user_id, s.created_at, s.last_seen_at, s.expires_at, u.email
               FROM sessions s JOIN users u ON u.id = s.user_id
               WHERE s.id = ?"#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let record = SessionRecord {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            last_seen_at: row.try_get("last_seen_at")?,
            expires_at: row.try_get("expires_at")?,
        };
        let email: String = row.try_get("email")?;

        let now = Utc::now();
        if record.is_expired(now) {
            debug!(user_id = %record.user_id, "session expired");
            self.sign_out(&record.id).await?;
            return Ok(None);
        }

        sqlx::query("UPDATE sessions SET last_seen_at = ? WHERE id = ?")
            .bind(now)
            .bind(&record.id)
            .execute(&self.db)
            .await?;

        Ok(Some(Session {
            token: record.id,
            user_id: record.user_id,
            email,
            expires_at: record.expires_at,
        }))
    }
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AppError::Other(anyhow::anyhow!("hashing password: {err}")))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|err| AppError::Other(anyhow::anyhow!("stored password hash: {err}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
