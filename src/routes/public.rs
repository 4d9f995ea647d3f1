use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    http::StatusCode,
    response::{Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use tracing::error;

use crate::{
    auth::{self, ClientSession},
    error::AppError,
    state::AppState,
    views::{AuthMode, AuthScreen, Route},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(Route::LogIn.path(), get(login_form).post(login_submit))
        .route(Route::SignUp.path(), get(signup_form).post(signup_submit))
        .route("/logout", post(logout))
}

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    show_error: bool,
    error_message: String,
    email: String,
}

#[derive(Template)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    show_error: bool,
    error_message: String,
    email: String,
    min_password_len: usize,
}

fn render(screen: &AuthScreen) -> Response {
    let error_message = screen.error().unwrap_or_default().to_string();
    let show_error = !error_message.is_empty();
    match screen.mode {
        AuthMode::LogIn => AskamaTemplateResponse::into_response(LoginTemplate {
            show_error,
            error_message,
            email: screen.email.clone(),
        }),
        AuthMode::SignUp => AskamaTemplateResponse::into_response(SignupTemplate {
            show_error,
            error_message,
            email: screen.email.clone(),
            min_password_len: crate::services::identity::MIN_PASSWORD_LEN,
        }),
    }
}

async fn login_form() -> Response {
    render(&AuthScreen::new(AuthMode::LogIn))
}

async fn signup_form() -> Response {
    render(&AuthScreen::new(AuthMode::SignUp))
}

#[derive(Deserialize)]
struct CredentialsForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

async fn login_submit(
    session: ClientSession,
    jar: PrivateCookieJar,
    Form(form): Form<CredentialsForm>,
) -> Response {
    submit(
        AuthScreen::with_input(AuthMode::LogIn, form.email, form.password),
        session,
        jar,
    )
    .await
}

async fn signup_submit(
    session: ClientSession,
    jar: PrivateCookieJar,
    Form(form): Form<CredentialsForm>,
) -> Response {
    submit(
        AuthScreen::with_input(AuthMode::SignUp, form.email, form.password),
        session,
        jar,
    )
    .await
}

async fn submit(
    mut screen: AuthScreen,
    ClientSession(session): ClientSession,
    jar: PrivateCookieJar,
) -> Response {
    match screen.submit(&session).await {
        Ok(route) => match session.current() {
            Some(current) => (
                auth::apply_session_cookie(jar, &current.token),
                Redirect::to(route.path()),
            )
                .into_response(),
            None => render_error(&screen, StatusCode::INTERNAL_SERVER_ERROR),
        },
        Err(err) => {
            if err.is_backend() {
                error!("auth backend failure: {err:?}");
            }
            render_error(&screen, err.status())
        }
    }
}

fn render_error(screen: &AuthScreen, status: StatusCode) -> Response {
    (status, render(screen)).into_response()
}

async fn logout(
    ClientSession(session): ClientSession,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Redirect), AppError> {
    session.sign_out().await;
    Ok((auth::clear_session_cookie(jar), Redirect::to(Route::LogIn.path())))
}
