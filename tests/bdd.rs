use std::{fmt, fs::File, net::SocketAddr};

use anyhow::Context;
use cucumber::{given, then, when, World as _};
use tempfile::TempDir;
use travel_planner::{
    config::AppConfig,
    db::{init_pool, migrate},
    error::AppError,
    models::trip::TripType,
    session::SessionManager,
    state::AppState,
    trips::Confirmation,
    views::Dashboard,
};

#[derive(Debug, cucumber::World, Default)]
struct AppWorld {
    state: Option<TestState>,
    last_error: Option<AppError>,
    foreign_trip: Option<String>,
}

impl AppWorld {
    fn test_state(&mut self) -> &mut TestState {
        self.state.as_mut().expect("state must be initialised first")
    }

    fn dashboard(&mut self) -> &mut Dashboard {
        self.test_state()
            .dashboard
            .as_mut()
            .expect("sign up before using the dashboard")
    }

    fn record<T>(&mut self, result: Result<T, AppError>) {
        self.last_error = result.err();
    }
}

struct TestState {
    app: AppState,
    session: SessionManager,
    dashboard: Option<Dashboard>,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;
        let db_path = root.path().join("bdd.sqlite");
        File::create(&db_path)?;

        let config = AppConfig {
            database_url: format!("sqlite://{}", db_path.to_string_lossy()),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cookie_secret: "bdd-cookie-secret".into(),
            session_ttl_hours: 1,
        };

        let db = init_pool(&config.database_url).await?;
        migrate(&db).await?;

        let app = AppState::new(config, db);
        let session = app.session_manager();
        Ok(Self {
            app,
            session,
            dashboard: None,
            _root: root,
        })
    }

    async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.app.db)
            .await
            .expect("count rows")
    }
}

fn trip_id(world: &mut AppWorld, title: &str) -> String {
    world
        .dashboard()
        .trips()
        .iter()
        .find(|trip| trip.title == title)
        .map(|trip| trip.id.clone())
        .unwrap_or_else(|| panic!("no trip titled {title}"))
}

#[given("a fresh application state")]
async fn given_fresh_state(world: &mut AppWorld) {
    world.state = Some(TestState::new().await.expect("state"));
    world.last_error = None;
    world.foreign_trip = None;
}

#[given(regex = r#"^a registered user "([^"]+)" with password "([^"]+)"$"#)]
async fn given_registered_user(world: &mut AppWorld, email: String, password: String) {
    let other = world.test_state().app.session_manager();
    other.sign_up(&email, &password).await.expect("register user");
    other.sign_out().await;
}

#[given(regex = r#"^I am signed up as "([^"]+)" with password "([^"]+)"$"#)]
async fn given_signed_up(world: &mut AppWorld, email: String, password: String) {
    let state = world.test_state();
    state
        .session
        .sign_up(&email, &password)
        .await
        .expect("sign up");
    let mut dashboard = Dashboard::attach(&state.session, state.app.trip_store(&state.session));
    dashboard.refresh().await.expect("initial load");
    state.dashboard = Some(dashboard);
}

#[given(regex = r#"^another user "([^"]+)" owns a trip "([^"]+)"$"#)]
async fn given_foreign_trip(world: &mut AppWorld, email: String, title: String) {
    let app = world.test_state().app.clone();
    let other = app.session_manager();
    other.sign_up(&email, "abcdef").await.expect("register other user");
    let id = app
        .trip_store(&other)
        .add_trip(&title, TripType::Work)
        .await
        .expect("add foreign trip");
    world.foreign_trip = Some(id);
}

#[when(regex = r#"^I sign up with email "([^"]*)" and password "([^"]*)"$"#)]
async fn when_sign_up(world: &mut AppWorld, email: String, password: String) {
    let result = world.test_state().session.sign_up(&email, &password).await;
    world.record(result);
}

#[when(regex = r#"^I sign in with email "([^"]*)" and password "([^"]*)"$"#)]
async fn when_sign_in(world: &mut AppWorld, email: String, password: String) {
    let result = world.test_state().session.sign_in(&email, &password).await;
    world.record(result);
}

#[when("I sign out")]
async fn when_sign_out(world: &mut AppWorld) {
    world.test_state().session.sign_out().await;
}

#[when(regex = r#"^I add a trip "([^"]*)" of type "([^"]*)"$"#)]
async fn when_add_trip(world: &mut AppWorld, title: String, kind: String) {
    let kind = match kind.parse::<TripType>() {
        Ok(kind) => kind,
        Err(err) => {
            world.last_error = Some(err);
            return;
        }
    };
    let dashboard = world.dashboard();
    dashboard.draft.title = title;
    dashboard.draft.kind = kind;
    let result = dashboard.add_trip().await;
    world.record(result);
}

#[when(regex = r#"^I toggle the favorite of "([^"]+)"$"#)]
async fn when_toggle(world: &mut AppWorld, title: String) {
    let id = trip_id(world, &title);
    let result = world.dashboard().toggle_favorite(&id).await;
    world.record(result);
}

#[when(regex = r#"^I delete "([^"]+)" answering "([^"]*)"$"#)]
async fn when_delete(world: &mut AppWorld, title: String, answer: String) {
    let id = trip_id(world, &title);
    let confirmation = Confirmation::from_answer(Some(answer.as_str()));
    let result = world.dashboard().delete_trip(&id, confirmation).await;
    world.record(result);
}

#[when("I enable the favorites-only filter")]
async fn when_enable_filter(world: &mut AppWorld) {
    world.dashboard().set_favorites_only(true);
}

#[when("I disable the favorites-only filter")]
async fn when_disable_filter(world: &mut AppWorld) {
    world.dashboard().set_favorites_only(false);
}

#[then("I am signed in")]
async fn then_signed_in(world: &mut AppWorld) {
    assert!(world.last_error.is_none(), "{:?}", world.last_error);
    assert!(world.test_state().session.is_authenticated());
}

#[then("I am signed out")]
async fn then_signed_out(world: &mut AppWorld) {
    assert!(!world.test_state().session.is_authenticated());
}

#[then("the last action failed with a validation error")]
async fn then_validation_error(world: &mut AppWorld) {
    assert!(
        matches!(world.last_error, Some(AppError::Validation(_))),
        "{:?}",
        world.last_error
    );
}

#[then(regex = r#"^the last action failed with "([^"]+)"$"#)]
async fn then_failed_with(world: &mut AppWorld, message: String) {
    let err = world.last_error.as_ref().expect("an error was expected");
    assert_eq!(err.user_message(), message);
}

#[then(regex = r"^there are (\d+) registered accounts$")]
async fn then_accounts(world: &mut AppWorld, expected: i64) {
    assert_eq!(world.test_state().count("users").await, expected);
}

#[then(regex = r"^there (?:is|are) (\d+) active sessions?$")]
async fn then_sessions(world: &mut AppWorld, expected: i64) {
    assert_eq!(world.test_state().count("sessions").await, expected);
}

#[then(regex = r"^I see (\d+) trips?$")]
async fn then_visible(world: &mut AppWorld, expected: usize) {
    assert_eq!(world.dashboard().visible().len(), expected);
}

#[then(regex = r"^the store holds (\d+) trips?$")]
async fn then_stored(world: &mut AppWorld, expected: i64) {
    assert_eq!(world.test_state().count("trips").await, expected);
}

#[then(regex = r#"^the trip "([^"]+)" has type "([^"]+)" and is not a favorite$"#)]
async fn then_trip_shape(world: &mut AppWorld, title: String, kind: String) {
    let dashboard = world.dashboard();
    let trip = dashboard
        .trips()
        .iter()
        .find(|trip| trip.title == title)
        .expect("trip present");
    assert_eq!(trip.kind.as_str(), kind);
    assert!(!trip.favorite);
}

#[then(regex = r#"^the trip "([^"]+)" is a favorite$"#)]
async fn then_favorite(world: &mut AppWorld, title: String) {
    assert!(favorite_of(world, &title));
}

#[then(regex = r#"^the trip "([^"]+)" is not a favorite$"#)]
async fn then_not_favorite(world: &mut AppWorld, title: String) {
    assert!(!favorite_of(world, &title));
}

fn favorite_of(world: &mut AppWorld, title: &str) -> bool {
    world
        .dashboard()
        .trips()
        .iter()
        .find(|trip| trip.title == title)
        .map(|trip| trip.favorite)
        .unwrap_or_else(|| panic!("no trip titled {title}"))
}

#[then("I cannot toggle the favorite of the other user's trip")]
async fn then_cannot_toggle_foreign(world: &mut AppWorld) {
    let id = world.foreign_trip.clone().expect("foreign trip");
    let result = world.dashboard().toggle_favorite(&id).await;
    assert!(matches!(result, Err(AppError::NotFound)), "{result:?}");
}

#[then("I cannot delete the other user's trip")]
async fn then_cannot_delete_foreign(world: &mut AppWorld) {
    let id = world.foreign_trip.clone().expect("foreign trip");
    let result = world
        .dashboard()
        .delete_trip(&id, Confirmation::Confirmed)
        .await;
    assert!(matches!(result, Err(AppError::NotFound)), "{result:?}");
    assert_eq!(world.test_state().count("trips").await, 2);
}

#[then("the dashboard requires login")]
async fn then_requires_login(world: &mut AppWorld) {
    assert!(world.dashboard().requires_login());
}

#[tokio::main]
async fn main() {
    AppWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
