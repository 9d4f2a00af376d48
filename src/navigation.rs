//! Route model and the in-memory navigation stack.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::debug;

pub const AUTH_GROUP: &str = "(auth)";
pub const APP_GROUP: &str = "(app)";
pub const NOT_FOUND_SEGMENT: &str = "+not-found";

/// Partition of the route tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    Auth,
    App,
    NotFound,
}

/// Every screen the client can show
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Events,
    EventDetail(String),
    CreateEvent,
    EditEvent(String),
    NotFound,
}

impl Route {
    pub fn group(&self) -> RouteGroup {
        match self {
            Route::Login | Route::Register => RouteGroup::Auth,
            Route::Events
            | Route::EventDetail(_)
            | Route::CreateEvent
            | Route::EditEvent(_) => RouteGroup::App,
            Route::NotFound => RouteGroup::NotFound,
        }
    }

    /// Path segments, group first (`["(app)", "events", "abc"]`)
    pub fn segments(&self) -> Vec<String> {
        let parts: Vec<&str> = match self {
            Route::Login => vec![AUTH_GROUP, "login"],
            Route::Register => vec![AUTH_GROUP, "register"],
            Route::Events => vec![APP_GROUP, "events"],
            Route::EventDetail(id) => vec![APP_GROUP, "events", id.as_str()],
            Route::CreateEvent => vec![APP_GROUP, "events", "create"],
            Route::EditEvent(id) => vec![APP_GROUP, "events", "edit", id.as_str()],
            Route::NotFound => vec![NOT_FOUND_SEGMENT],
        };
        parts.into_iter().map(str::to_string).collect()
    }

    pub fn path(&self) -> String {
        format!("/{}", self.segments().join("/"))
    }

    /// Event id carried by parameterized routes
    pub fn event_id(&self) -> Option<&str> {
        match self {
            Route::EventDetail(id) | Route::EditEvent(id) => Some(id.as_str()),
            _ => None,
        }
    }

    /// Resolve a path. Group segments are optional; anything unknown is `NotFound`.
    pub fn parse(path: &str) -> Route {
        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let group = match segments.first() {
            Some(&AUTH_GROUP) => Some(RouteGroup::Auth),
            Some(&APP_GROUP) => Some(RouteGroup::App),
            _ => None,
        };
        if group.is_some() {
            segments.remove(0);
        }

        let route = match segments.as_slice() {
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["events"] => Route::Events,
            ["events", "create"] => Route::CreateEvent,
            ["events", "edit", id] => Route::EditEvent(id.to_string()),
            ["events", id] => Route::EventDetail(id.to_string()),
            _ => Route::NotFound,
        };

        match group {
            Some(group) if group != route.group() => Route::NotFound,
            _ => route,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// One navigation performed on a [`RouteStack`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationAction {
    Push(Route),
    Replace(Route),
    Back,
}

/// Most recent actions kept in a [`RouteStack`] journal
pub const JOURNAL_LIMIT: usize = 64;

/// Navigation stack with a journal of its most recent actions
#[derive(Debug)]
pub struct RouteStack {
    current: Route,
    history: Vec<Route>,
    journal: VecDeque<NavigationAction>,
    changes: watch::Sender<Route>,
}

impl Default for RouteStack {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteStack {
    /// A fresh stack sits at `/`, which has no screen and resolves to not-found
    pub fn new() -> Self {
        Self::with_initial(Route::parse("/"))
    }

    pub fn with_initial(route: Route) -> Self {
        let (changes, _) = watch::channel(route.clone());
        Self {
            current: route,
            history: Vec::new(),
            journal: VecDeque::new(),
            changes,
        }
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    pub fn segments(&self) -> Vec<String> {
        self.current.segments()
    }

    /// Number of screens on the stack
    pub fn depth(&self) -> usize {
        self.history.len() + 1
    }

    /// Show `route` on top of the active screen. A route already further
    /// down the stack is unwound to instead of stacked again.
    pub fn push(&mut self, route: Route) {
        match self.history.iter().position(|r| *r == route) {
            Some(index) => {
                debug!("push {} unwinds {} screens", route, self.history.len() - index);
                self.history.truncate(index);
            }
            None => {
                debug!("push {}", route);
                self.history.push(self.current.clone());
            }
        }
        self.current = route.clone();
        self.record(NavigationAction::Push(route));
    }

    /// Swap the active screen; the replaced one cannot be reached with `back`
    pub fn replace(&mut self, route: Route) {
        debug!("replace {}", route);
        self.current = route.clone();
        self.record(NavigationAction::Replace(route));
    }

    /// Pop the active screen. Returns false at the root.
    pub fn back(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                debug!("back to {}", previous);
                self.current = previous;
                self.record(NavigationAction::Back);
                true
            }
            None => false,
        }
    }

    fn record(&mut self, action: NavigationAction) {
        if self.journal.len() == JOURNAL_LIMIT {
            self.journal.pop_front();
        }
        self.journal.push_back(action);
        self.changes.send_replace(self.current.clone());
    }

    /// Recent actions, oldest first
    pub fn journal(&self) -> Vec<NavigationAction> {
        self.journal.iter().cloned().collect()
    }

    /// How many times `route` was reached through `replace`
    pub fn replacements_to(&self, route: &Route) -> usize {
        self.journal
            .iter()
            .filter(|action| matches!(action, NavigationAction::Replace(r) if r == route))
            .count()
    }

    /// Receiver that is notified with the active route after every action
    pub fn watch(&self) -> watch::Receiver<Route> {
        self.changes.subscribe()
    }
}

/// Navigator shared between the shell, the screens and the auth gate
pub type SharedNavigator = Arc<RwLock<RouteStack>>;

pub fn shared(stack: RouteStack) -> SharedNavigator {
    Arc::new(RwLock::new(stack))
}
