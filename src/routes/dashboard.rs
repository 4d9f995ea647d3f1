use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, Query, State},
    response::{Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tracing::error;

use crate::{
    auth::ClientSession,
    error::AppError,
    models::trip::{Trip, TripType},
    session::SessionManager,
    state::AppState,
    trips::Confirmation,
    views::{Dashboard, Route},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(Route::Dashboard.path(), get(dashboard))
        .route("/trips", post(add_trip))
        .route("/trips/:id/favorite", post(toggle_favorite))
        .route("/trips/:id/delete", get(confirm_delete).post(delete_trip))
}

#[derive(Clone)]
struct TripCard {
    id: String,
    title: String,
    type_name: String,
    type_label: &'static str,
    type_icon: &'static str,
    type_class: &'static str,
    favorite: bool,
}

impl From<&Trip> for TripCard {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id.clone(),
            title: trip.title.clone(),
            type_name: trip.kind.as_str().to_string(),
            type_label: trip.kind.label(),
            type_icon: trip.kind.icon(),
            type_class: trip.kind.css_class(),
            favorite: trip.favorite,
        }
    }
}

#[derive(Clone)]
struct TypeOption {
    value: String,
    label: &'static str,
    icon: &'static str,
    selected: bool,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    email: String,
    trips: Vec<TripCard>,
    favorites_only: bool,
    draft_title: String,
    type_options: Vec<TypeOption>,
    show_error: bool,
    error_message: String,
}

#[derive(Template)]
#[template(path = "confirm_delete.html")]
struct ConfirmDeleteTemplate {
    id: String,
    title: String,
    favorites_only: bool,
}

#[derive(Deserialize, Default)]
struct DashboardQuery {
    #[serde(default)]
    favorites: bool,
}

#[derive(Deserialize)]
struct AddTripForm {
    #[serde(default)]
    title: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    favorites: bool,
}

#[derive(Deserialize)]
struct FilterForm {
    #[serde(default)]
    favorites: bool,
}

#[derive(Deserialize)]
struct DeleteForm {
    confirm: Option<String>,
    #[serde(default)]
    favorites: bool,
}

fn open_dashboard(state: &AppState, session: &SessionManager, favorites_only: bool) -> Dashboard {
    let mut screen = Dashboard::attach(session, state.trip_store(session));
    screen.set_favorites_only(favorites_only);
    screen
}

fn to_login() -> Response {
    Redirect::to(Route::LogIn.path()).into_response()
}

fn to_dashboard(favorites_only: bool) -> Response {
    if favorites_only {
        Redirect::to("/?favorites=true").into_response()
    } else {
        Redirect::to(Route::Dashboard.path()).into_response()
    }
}

fn render(session: &SessionManager, screen: &Dashboard, failure: Option<&AppError>) -> Response {
    let email = session.current().map(|s| s.email).unwrap_or_default();
    let type_options = TripType::SELECTABLE
        .iter()
        .map(|kind| TypeOption {
            value: kind.as_str().to_string(),
            label: kind.label(),
            icon: kind.icon(),
            selected: *kind == screen.draft.kind,
        })
        .collect();

    let page = AskamaTemplateResponse::into_response(DashboardTemplate {
        email,
        trips: screen.visible().into_iter().map(TripCard::from).collect(),
        favorites_only: screen.favorites_only(),
        draft_title: screen.draft.title.clone(),
        type_options,
        show_error: failure.is_some(),
        error_message: failure.map(AppError::user_message).unwrap_or_default(),
    });

    match failure {
        Some(err) => (err.status(), page).into_response(),
        None => page,
    }
}

/// Shows the dashboard again with `err` on top, after re-reading the list.
async fn render_failure(session: &SessionManager, mut screen: Dashboard, err: AppError) -> Response {
    if matches!(err, AppError::Unauthorized) || screen.requires_login() {
        return to_login();
    }
    if err.is_backend() {
        error!("dashboard action failed: {err:?}");
    }
    if let Err(refresh_err) = screen.refresh().await {
        error!("reloading trips failed: {refresh_err:?}");
    }
    render(session, &screen, Some(&err))
}

async fn dashboard(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let mut screen = open_dashboard(&state, &session, query.favorites);
    if screen.requires_login() {
        return to_login();
    }
    match screen.refresh().await {
        Ok(()) => render(&session, &screen, None),
        Err(err) => {
            error!("loading trips failed: {err:?}");
            render(&session, &screen, Some(&err))
        }
    }
}

async fn add_trip(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
    Form(form): Form<AddTripForm>,
) -> Response {
    let mut screen = open_dashboard(&state, &session, form.favorites);
    if screen.requires_login() {
        return to_login();
    }
    screen.draft.title = form.title;

    let kind = match form.kind.parse::<TripType>() {
        Ok(kind) => kind,
        Err(err) => return render_failure(&session, screen, err).await,
    };
    screen.draft.kind = kind;

    match screen.add_trip().await {
        Ok(()) => to_dashboard(form.favorites),
        Err(err) => render_failure(&session, screen, err).await,
    }
}

async fn toggle_favorite(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
    Path(trip_id): Path<String>,
    Form(form): Form<FilterForm>,
) -> Response {
    let mut screen = open_dashboard(&state, &session, form.favorites);
    if screen.requires_login() {
        return to_login();
    }
    match screen.toggle_favorite(&trip_id).await {
        Ok(()) => to_dashboard(form.favorites),
        Err(err) => render_failure(&session, screen, err).await,
    }
}

async fn confirm_delete(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
    Path(trip_id): Path<String>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let screen = open_dashboard(&state, &session, query.favorites);
    if screen.requires_login() {
        return to_login();
    }
    match state.trip_store(&session).find_trip(&trip_id).await {
        Ok(trip) => AskamaTemplateResponse::into_response(ConfirmDeleteTemplate {
            id: trip.id,
            title: trip.title,
            favorites_only: query.favorites,
        }),
        Err(err) => render_failure(&session, screen, err).await,
    }
}

async fn delete_trip(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
    Path(trip_id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    let mut screen = open_dashboard(&state, &session, form.favorites);
    if screen.requires_login() {
        return to_login();
    }
    let confirmation = Confirmation::from_answer(form.confirm.as_deref());
    match screen.delete_trip(&trip_id, confirmation).await {
        Ok(()) => to_dashboard(form.favorites),
        Err(err) => render_failure(&session, screen, err).await,
    }
}
