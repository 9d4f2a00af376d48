//! Interactive terminal front end. Reads commands, forwards them to the
//! mounted screen and re-renders whenever the active route changes.

use super::dialogs::{prompt, read_line, shared_input, SharedInput, TerminalDialogs};
use super::{Command, CommandResult};
use crate::context::AppContext;
use crate::error::AppResult;
use crate::navigation::Route;
use crate::screens::{AuthScreen, AuthScreenMode, DeleteOutcome, Dialogs, MountedScreen};
use rust_i18n::t;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// What the shell should show after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellOutcome {
    /// Re-render the mounted screen
    Render,
    /// Print a one-off message
    Message(String),
    Quit,
}

enum Wake {
    Line(Option<String>),
    RouteChanged,
    Shutdown,
}

pub struct Shell<R> {
    ctx: AppContext,
    input: SharedInput<R>,
    dialogs: Arc<dyn Dialogs>,
    screen: MountedScreen,
    mounted: Option<Route>,
}

impl<R: AsyncRead + Unpin + Send + 'static> Shell<R> {
    /// Shell reading commands and dialog answers from `reader`
    pub fn new(ctx: AppContext, reader: R) -> Self {
        let input = shared_input(reader);
        let dialogs = Arc::new(TerminalDialogs::new(Arc::clone(&input)));
        Self::with_dialogs(ctx, input, dialogs)
    }

    pub fn with_dialogs(ctx: AppContext, input: SharedInput<R>, dialogs: Arc<dyn Dialogs>) -> Self {
        Self {
            ctx,
            input,
            dialogs,
            screen: MountedScreen::NotFound,
            mounted: None,
        }
    }

    pub fn screen(&self) -> &MountedScreen {
        &self.screen
    }

    /// Remount until the mounted screen matches the active route.
    /// Returns whether a new screen was mounted.
    ///
    /// Mounting awaits the store, and the auth gate may move the navigator
    /// meanwhile, so the route is checked again after every mount.
    pub async fn sync(&mut self) -> bool {
        let mut remounted = false;
        loop {
            let route = self.ctx.current_route().await;
            if self.mounted.as_ref() == Some(&route) {
                return remounted;
            }

            debug!("Mounting screen for {}", route);
            self.screen = MountedScreen::mount(&route, &self.ctx).await;
            self.mounted = Some(route);
            remounted = true;
        }
    }

    /// Mount the active route again, reloading its data
    pub async fn reload(&mut self) {
        self.mounted = None;
        self.sync().await;
    }

    pub async fn render(&self) -> String {
        self.screen.render(&self.ctx).await
    }

    /// Run one command against the mounted screen
    pub async fn execute(&mut self, command: Command) -> CommandResult {
        let outcome = match command {
            Command::Help => ShellOutcome::Message(t!("shell_help").to_string()),
            Command::Login { email, password } => {
                self.authenticate(AuthScreenMode::SignIn, &email, &password)
                    .await?
            }
            Command::Register { email, password } => {
                self.authenticate(AuthScreenMode::SignUp, &email, &password)
                    .await?
            }
            Command::Logout => {
                if self.ctx.session_user().is_none() {
                    return Ok(ShellOutcome::Message(t!("not_signed_in").to_string()));
                }
                // The auth gate moves the navigator to the login screen
                self.ctx.auth.sign_out().await?;
                ShellOutcome::Message(t!("signed_out").to_string())
            }
            Command::WhoAmI => match self.ctx.session_user() {
                Some(user) => ShellOutcome::Message(format!(
                    "{} ({})",
                    user.email.as_deref().unwrap_or("-"),
                    user.uid
                )),
                None => ShellOutcome::Message(t!("not_signed_in").to_string()),
            },
            Command::Events => {
                if self.ctx.current_route().await == Route::Events {
                    self.reload().await;
                } else {
                    self.ctx.navigator.write().await.push(Route::Events);
                }
                ShellOutcome::Render
            }
            Command::Open(selector) => match &self.screen {
                MountedScreen::Events(screen) => match screen.open(&self.ctx, &selector).await {
                    Some(_) => ShellOutcome::Render,
                    None => ShellOutcome::Message(t!("event_not_in_list").to_string()),
                },
                _ => ShellOutcome::Message(t!("not_on_events").to_string()),
            },
            Command::New => match &self.screen {
                MountedScreen::Events(screen) => {
                    screen.create(&self.ctx).await;
                    ShellOutcome::Render
                }
                _ => ShellOutcome::Message(t!("not_on_events").to_string()),
            },
            Command::Edit => match &self.screen {
                MountedScreen::Detail(screen) => {
                    if screen.edit(&self.ctx).await {
                        ShellOutcome::Render
                    } else {
                        ShellOutcome::Message(t!("edit_not_permitted").to_string())
                    }
                }
                _ => ShellOutcome::Message(t!("not_on_detail").to_string()),
            },
            Command::Attend => match &self.screen {
                MountedScreen::Detail(screen) => {
                    if screen.attend(&self.ctx).await {
                        ShellOutcome::Render
                    } else {
                        ShellOutcome::Message(t!("event_not_found").to_string())
                    }
                }
                _ => ShellOutcome::Message(t!("not_on_detail").to_string()),
            },
            Command::Delete => match &self.screen {
                MountedScreen::Detail(screen) => {
                    match screen.delete(&self.ctx, self.dialogs.as_ref()).await {
                        DeleteOutcome::Deleted | DeleteOutcome::Failed => ShellOutcome::Render,
                        DeleteOutcome::Cancelled => {
                            ShellOutcome::Message(t!("delete_cancelled").to_string())
                        }
                        DeleteOutcome::NotPermitted => {
                            ShellOutcome::Message(t!("delete_not_permitted").to_string())
                        }
                        DeleteOutcome::Unavailable => {
                            ShellOutcome::Message(t!("event_not_found").to_string())
                        }
                    }
                }
                _ => ShellOutcome::Message(t!("not_on_detail").to_string()),
            },
            Command::Set { field, value } => match &mut self.screen {
                MountedScreen::Form(screen) => {
                    if screen.set_field(field, value) {
                        ShellOutcome::Render
                    } else {
                        ShellOutcome::Message(t!("edit_not_permitted").to_string())
                    }
                }
                _ => ShellOutcome::Message(t!("not_on_form").to_string()),
            },
            Command::Save => match &self.screen {
                MountedScreen::Form(screen) => {
                    screen.save(&self.ctx).await?;
                    ShellOutcome::Render
                }
                _ => ShellOutcome::Message(t!("not_on_form").to_string()),
            },
            Command::Back => {
                if self.ctx.navigator.write().await.back() {
                    ShellOutcome::Render
                } else {
                    ShellOutcome::Message(t!("no_back").to_string())
                }
            }
            Command::Where => ShellOutcome::Message(self.ctx.current_route().await.path()),
            Command::Quit => ShellOutcome::Quit,
        };

        Ok(outcome)
    }

    async fn authenticate(
        &mut self,
        mode: AuthScreenMode,
        email: &str,
        password: &str,
    ) -> CommandResult {
        if self.ctx.session_user().is_some() {
            return Ok(ShellOutcome::Message(t!("already_signed_in").to_string()));
        }

        let target = match mode {
            AuthScreenMode::SignIn => Route::Login,
            AuthScreenMode::SignUp => Route::Register,
        };
        if self.ctx.current_route().await != target {
            self.ctx.navigator.write().await.replace(target);
            self.sync().await;
        }

        if !matches!(&self.screen, MountedScreen::Auth(screen) if screen.mode() == mode) {
            self.screen = MountedScreen::Auth(AuthScreen::new(mode));
        }
        let MountedScreen::Auth(screen) = &mut self.screen else {
            return Ok(ShellOutcome::Render);
        };

        match screen.submit(&self.ctx, email, password).await {
            Ok(_) => Ok(ShellOutcome::Render),
            // The screen keeps the error and shows it when rendered
            Err(e) => {
                debug!("Authentication failed: {}", e);
                Ok(ShellOutcome::Render)
            }
        }
    }

    /// Read and run commands until `quit`, end of input or `shutdown` fires
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> AppResult<()> {
        let mut route_changes = self.ctx.navigator.read().await.watch();

        route_changes.mark_unchanged();
        self.sync().await;
        println!("{}\n", self.render().await);

        loop {
            prompt(&format!("{}> ", self.ctx.current_route().await.path()));

            let wake = tokio::select! {
                line = read_line(&self.input) => Wake::Line(line?),
                changed = route_changes.changed() => match changed {
                    Ok(()) => Wake::RouteChanged,
                    Err(_) => Wake::Shutdown,
                },
                _ = &mut shutdown => Wake::Shutdown,
            };

            let line = match wake {
                Wake::Line(Some(line)) => line,
                Wake::Line(None) => {
                    info!("End of input, leaving shell");
                    return Ok(());
                }
                Wake::RouteChanged => {
                    route_changes.mark_unchanged();
                    if self.sync().await {
                        println!("\n{}\n", self.render().await);
                    }
                    continue;
                }
                Wake::Shutdown => {
                    info!("Shutdown requested, leaving shell");
                    return Ok(());
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            // A redirect may be pending when a line and a route change
            // arrive together; never run a command on a stale screen
            route_changes.mark_unchanged();
            let mut remounted = self.sync().await;

            let outcome = match line.parse::<Command>() {
                Ok(command) => self.execute(command).await,
                Err(e) => Err(e),
            };
            route_changes.mark_unchanged();
            remounted |= self.sync().await;

            match outcome {
                Ok(ShellOutcome::Quit) => return Ok(()),
                Ok(ShellOutcome::Message(message)) => {
                    println!("{}", message);
                    if remounted {
                        println!("\n{}\n", self.render().await);
                    }
                }
                Ok(ShellOutcome::Render) => println!("\n{}\n", self.render().await),
                Err(e) => println!("{}: {}", t!("error_title"), e),
            }
        }
    }
}
