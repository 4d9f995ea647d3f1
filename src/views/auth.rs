use tracing::debug;

use crate::{error::AppError, session::SessionManager};

use super::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignUp,
    LogIn,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Submitting,
    Failed(String),
}

/// Sign-up and log-in share one form: email, password, a submit button.
#[derive(Debug, Clone)]
pub struct AuthScreen {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub state: FormState,
}

impl AuthScreen {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            email: String::new(),
            password: String::new(),
            state: FormState::Idle,
        }
    }

    pub fn with_input(mode: AuthMode, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::new(mode)
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.state == FormState::Submitting
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            FormState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Runs the sign-up or sign-in. On success the screen is left idle and the
    /// route to navigate to is returned; on failure the error is kept for
    /// display and the password field is cleared.
    pub async fn submit(&mut self, session: &SessionManager) -> Result<Route, AppError> {
        self.state = FormState::Submitting;
        let outcome = match self.mode {
            AuthMode::SignUp => session.sign_up(&self.email, &self.password).await,
            AuthMode::LogIn => session.sign_in(&self.email, &self.password).await,
        };

        match outcome {
            Ok(_) => {
                self.state = FormState::Idle;
                self.password.clear();
                Ok(Route::Dashboard)
            }
            Err(err) => {
                debug!(mode = ?self.mode, "auth form rejected: {err}");
                self.state = FormState::Failed(err.user_message());
                self.password.clear();
                Err(err)
            }
        }
    }
}
