use crate::context::AppContext;
use crate::error::{validation_error, AppResult};
use crate::firebase::User;
use crate::navigation::Route;
use rust_i18n::t;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScreenMode {
    SignIn,
    SignUp,
}

/// The `(auth)/login` and `(auth)/register` screens
#[derive(Debug)]
pub struct AuthScreen {
    mode: AuthScreenMode,
    last_error: Option<String>,
}

impl AuthScreen {
    pub fn new(mode: AuthScreenMode) -> Self {
        Self {
            mode,
            last_error: None,
        }
    }

    pub fn mode(&self) -> AuthScreenMode {
        self.mode
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Sign in or register, then replace this screen with the event list.
    ///
    /// The auth gate sees the new session too but leaves `(app)` routes alone,
    /// so the replace here is the only navigation.
    pub async fn submit(&mut self, ctx: &AppContext, email: &str, password: &str) -> AppResult<User> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            let message = t!("credentials_required").to_string();
            self.last_error = Some(message.clone());
            return Err(validation_error(&message));
        }

        let result = match self.mode {
            AuthScreenMode::SignIn => ctx.auth.sign_in_with_email_and_password(email, password).await,
            AuthScreenMode::SignUp => {
                ctx.auth
                    .create_user_with_email_and_password(email, password)
                    .await
            }
        };

        match result {
            Ok(user) => {
                info!("Signed in as {}", user.uid);
                self.last_error = None;
                ctx.navigator.write().await.replace(Route::Events);
                Ok(user)
            }
            Err(e) => {
                warn!("Authentication failed for {}: {}", email, e);
                self.last_error = Some(t!("auth_failed").to_string());
                Err(e)
            }
        }
    }

    pub fn render(&self) -> String {
        let (title, hint) = match self.mode {
            AuthScreenMode::SignIn => (t!("login_title"), t!("login_hint")),
            AuthScreenMode::SignUp => (t!("register_title"), t!("register_hint")),
        };

        let mut lines = vec![title.to_string(), String::new(), hint.to_string()];
        if let Some(error) = &self.last_error {
            lines.push(String::new());
            lines.push(format!("{}: {}", t!("error_title"), error));
        }
        lines.join("\n")
    }
}
