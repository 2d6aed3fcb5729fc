use std::fmt;
use std::str::FromStr;

use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::api::AuthEvent;
use crate::session::{SessionState, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
    Search,
    MyMemes,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Search => "/search",
            Route::MyMemes => "/my-memes",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Login => "Login",
            Route::Register => "Sign Up",
            Route::Search => "Search",
            Route::MyMemes => "My Memes",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::MyMemes)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "/" | "" => Ok(Route::Home),
            "/login" => Ok(Route::Login),
            "/register" => Ok(Route::Register),
            "/search" => Ok(Route::Search),
            "/my-memes" => Ok(Route::MyMemes),
            other => Err(format!("no route for '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not restored yet: show nothing, decide later.
    Pending,
    Admit,
    Redirect(Route),
}

pub struct AccessGuard;

impl AccessGuard {
    pub fn check(route: Route, state: &SessionState) -> GuardDecision {
        if !route.requires_auth() {
            return GuardDecision::Admit;
        }
        match state {
            SessionState::Loading => GuardDecision::Pending,
            SessionState::Unauthenticated => GuardDecision::Redirect(Route::Login),
            SessionState::Authenticated(_) => GuardDecision::Admit,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Navbar state: theme and collapsed mobile menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chrome {
    pub theme: Theme,
    pub menu_open: bool,
}

impl Chrome {
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = match self.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        self.theme
    }

    pub fn toggle_menu(&mut self) -> bool {
        self.menu_open = !self.menu_open;
        self.menu_open
    }

    pub fn nav_links(state: &SessionState) -> Vec<Route> {
        let mut links = vec![Route::Home, Route::Search];
        if state.is_authenticated() {
            links.push(Route::MyMemes);
        } else {
            links.extend([Route::Login, Route::Register]);
        }
        links
    }
}

/// Tracks the current view and reacts to forced logouts from the HTTP layer.
pub struct Navigator {
    current: Route,
    events: broadcast::Receiver<AuthEvent>,
    pub chrome: Chrome,
}

impl Navigator {
    pub fn new(events: broadcast::Receiver<AuthEvent>) -> Self {
        Self {
            current: Route::Home,
            events,
            chrome: Chrome::default(),
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// Try to enter `route`; returns what the guard decided. A pending
    /// decision leaves the current view in place.
    pub fn navigate(&mut self, route: Route, session: &SessionStore) -> GuardDecision {
        self.chrome.menu_open = false;
        let decision = AccessGuard::check(route, &session.state());
        match decision {
            GuardDecision::Admit => self.current = route,
            GuardDecision::Redirect(target) => {
                tracing::debug!("{} requires login, redirecting to {}", route, target);
                self.current = target;
            }
            GuardDecision::Pending => {}
        }
        decision
    }

    /// Drain auth events. Returns `true` if a forced logout moved us to the
    /// login view.
    pub fn poll_events(&mut self) -> bool {
        let mut redirected = false;
        loop {
            match self.events.try_recv() {
                Ok(AuthEvent::Unauthorized) => {
                    self.current = Route::Login;
                    redirected = true;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} auth events, assuming logout", skipped);
                    self.current = Route::Login;
                    redirected = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        redirected
    }
}
