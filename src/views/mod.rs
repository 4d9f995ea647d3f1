//! Screen models. They hold what a screen shows and drive the session and
//! trip clients; the HTTP handlers in `routes` only render them.

pub mod auth;
pub mod dashboard;

pub use auth::{AuthMode, AuthScreen, FormState};
pub use dashboard::{Dashboard, TripDraft};

/// The three places a user can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    SignUp,
    LogIn,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::SignUp => "/signup",
            Route::LogIn => "/login",
        }
    }
}
