use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures reported by the identity service. The messages are meant to be
/// shown to the person at the keyboard as-is.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("The email address is badly formatted.")]
    InvalidEmail,
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("Password should be at least 6 characters.")]
    WeakPassword,
    #[error("An account with this email address already exists.")]
    AccountExists,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// Backend trouble the user can do nothing about except try again.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            AppError::Config(_) | AppError::Io(_) | AppError::Database(_) | AppError::Other(_)
        )
    }

    /// Text a screen shows for this error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Auth(err) => err.to_string(),
            AppError::NotFound => "That trip no longer exists.".into(),
            AppError::Unauthorized => "Please log in to continue.".into(),
            _ => "Something went wrong talking to the server. Please try again.".into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Database(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            AppError::Auth(AuthError::AccountExists) => StatusCode::CONFLICT,
            AppError::Auth(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_backend() {
            tracing::error!("request failed: {self:?}");
        }
        (status, self.user_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_get_a_generic_message() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        assert!(err.is_backend());
        assert!(err.user_message().contains("try again"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_errors_keep_the_provider_message() {
        let err = AppError::from(AuthError::AccountExists);
        assert_eq!(
            err.user_message(),
            "An account with this email address already exists."
        );
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
