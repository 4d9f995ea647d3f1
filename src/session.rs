//! Client-side session handling.
//!
//! A [`SessionManager`] holds the session of one client (one browser cookie)
//! and lets screens observe it. Every state change is pushed to the
//! registered listeners synchronously, in registration order.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    error::AppError,
    models::session::Session,
    services::identity::{IdentityService, MIN_PASSWORD_LEN},
};

type Listener = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: BTreeMap<u64, Listener>,
}

struct Inner {
    identity: Arc<dyn IdentityService>,
    state: watch::Sender<Option<Session>>,
    listeners: Mutex<Listeners>,
}

impl Inner {
    fn listeners(&self) -> MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(identity: Arc<dyn IdentityService>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                identity,
                state,
                listeners: Mutex::new(Listeners::default()),
            }),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_some()
    }

    pub fn user_id(&self) -> Result<String, AppError> {
        self.inner
            .state
            .borrow()
            .as_ref()
            .map(|session| session.user_id.clone())
            .ok_or(AppError::Unauthorized)
    }

    /// Receiver for async consumers that prefer awaiting changes over callbacks.
    pub fn changes(&self) -> watch::Receiver<Option<Session>> {
        self.inner.state.subscribe()
    }

    /// Registers `listener`, calls it right away with the current state and
    /// then after every change until the returned handle is dropped.
    pub fn observe<F>(&self, listener: F) -> SessionSubscription
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        let id = {
            let mut listeners = self.inner.listeners();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.insert(id, listener.clone());
            id
        };

        let current = self.current();
        listener(current.as_ref());

        SessionSubscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let (email, password) = require_credentials(email, password)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long."
            )));
        }

        let previous = self.current();
        match self.inner.identity.sign_up(email, password).await {
            Ok(session) => {
                self.publish(Some(session.clone()));
                self.end_replaced(previous, &session).await;
                Ok(session)
            }
            Err(err) => {
                warn!("sign-up failed: {err}");
                Err(err)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let (email, password) = require_credentials(email, password)?;

        let previous = self.current();
        match self.inner.identity.sign_in(email, password).await {
            Ok(session) => {
                self.publish(Some(session.clone()));
                self.end_replaced(previous, &session).await;
                Ok(session)
            }
            Err(err) => {
                warn!("sign-in failed: {err}");
                Err(err)
            }
        }
    }

    /// Drops the local session first; the backend call may fail without
    /// affecting the result.
    pub async fn sign_out(&self) {
        let Some(session) = self.inner.state.send_replace(None) else {
            return;
        };
        self.notify(None);

        info!(user_id = %session.user_id, "signed out");
        if let Err(err) = self.inner.identity.sign_out(&session.token).await {
            warn!("sign-out call failed: {err}");
        }
    }

    /// Rehydrates the session behind `token`, if it is still live.
    pub async fn restore(&self, token: &str) -> Result<Option<Session>, AppError> {
        let session = self.inner.identity.resolve(token).await?;
        self.publish(session.clone());
        Ok(session)
    }

    /// Ends the backend session a fresh sign-in replaced. Failures are only logged.
    async fn end_replaced(&self, previous: Option<Session>, current: &Session) {
        let Some(previous) = previous else {
            return;
        };
        if previous.token == current.token {
            return;
        }
        if let Err(err) = self.inner.identity.sign_out(&previous.token).await {
            warn!(user_id = %previous.user_id, "ending replaced session failed: {err}");
        }
    }

    fn publish(&self, session: Option<Session>) {
        let changed = self.inner.state.send_if_modified(|current| {
            if *current == session {
                false
            } else {
                *current = session.clone();
                true
            }
        });
        if changed {
            self.notify(session.as_ref());
        }
    }

    fn notify(&self, session: Option<&Session>) {
        let snapshot: Vec<Listener> = self.inner.listeners().entries.values().cloned().collect();
        for listener in snapshot {
            listener(session);
        }
    }
}

/// Handle returned by [`SessionManager::observe`]. Deregisters on drop.
#[must_use = "dropping the subscription deregisters the listener"]
pub struct SessionSubscription {
    id: u64,
    inner: Weak<Inner>,
}

impl SessionSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners().entries.remove(&self.id);
        }
    }
}

fn require_credentials<'a>(
    email: &'a str,
    password: &'a str,
) -> Result<(&'a str, &'a str), AppError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::validation("Please fill in all fields."));
    }
    Ok((email, password))
}
