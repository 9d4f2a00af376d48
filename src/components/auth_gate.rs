//! Redirects the navigation stack whenever the auth state changes.

use crate::context::AppContext;
use crate::error::{component_error, AppResult};
use crate::firebase::auth::listener;
use crate::firebase::{AuthSubscription, User};
use crate::navigation::{Route, RouteGroup, SharedNavigator};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Where to send the user for the given auth state and active route, if anywhere.
///
/// Signed out outside the `(auth)` group goes to login; signed in on the
/// not-found route goes to the event list. Nothing else moves.
pub fn redirect_for(user: Option<&User>, route: &Route) -> Option<Route> {
    match (user, route.group()) {
        (None, group) if group != RouteGroup::Auth => Some(Route::Login),
        (Some(_), RouteGroup::NotFound) => Some(Route::Events),
        _ => None,
    }
}

/// Apply one auth notification to the navigator. Returns the redirect target.
pub async fn apply_auth_state(navigator: &SharedNavigator, user: Option<User>) -> Option<Route> {
    let mut stack = navigator.write().await;
    let target = redirect_for(user.as_ref(), stack.current())?;

    info!(
        "Auth state {} on {}, redirecting to {}",
        if user.is_some() { "signed in" } else { "signed out" },
        stack.current(),
        target
    );
    stack.replace(target.clone());
    Some(target)
}

/// Gate component; holds the auth subscription for its whole lifetime
#[derive(Debug, Default)]
pub struct AuthGate {
    subscription: Mutex<Option<AuthSubscription>>,
}

impl AuthGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_subscribed(&self) -> bool {
        self.subscription
            .lock()
            .await
            .as_ref()
            .is_some_and(AuthSubscription::is_active)
    }
}

#[async_trait]
impl super::Component for AuthGate {
    fn name(&self) -> &'static str {
        "auth_gate"
    }

    async fn init(&self, ctx: &AppContext) -> AppResult<()> {
        let mut current = self.subscription.lock().await;
        if current.as_ref().is_some_and(AuthSubscription::is_active) {
            return Err(component_error("auth gate is already subscribed"));
        }

        let navigator = ctx.navigator.clone();
        let subscription = ctx.auth.on_auth_state_changed(listener(move |user| {
            let navigator = navigator.clone();
            async move {
                apply_auth_state(&navigator, user).await;
            }
        }));

        *current = Some(subscription);
        debug!("Auth gate subscribed");
        Ok(())
    }

    async fn shutdown(&self) -> AppResult<()> {
        if let Some(subscription) = self.subscription.lock().await.take() {
            subscription.unsubscribe();
            info!("Auth gate unsubscribed");
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_out_outside_auth_group_goes_to_login() {
        assert_eq!(redirect_for(None, &Route::Events), Some(Route::Login));
        assert_eq!(redirect_for(None, &Route::EditEvent("a".into())), Some(Route::Login));
        assert_eq!(redirect_for(None, &Route::NotFound), Some(Route::Login));
    }

    #[test]
    fn signed_out_inside_auth_group_stays() {
        assert_eq!(redirect_for(None, &Route::Login), None);
        assert_eq!(redirect_for(None, &Route::Register), None);
    }

    #[test]
    fn signed_in_only_leaves_not_found() {
        let user = User::new("u1");
        assert_eq!(redirect_for(Some(&user), &Route::NotFound), Some(Route::Events));
        assert_eq!(redirect_for(Some(&user), &Route::Login), None);
        assert_eq!(redirect_for(Some(&user), &Route::EventDetail("a".into())), None);
    }
}
